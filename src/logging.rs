use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "food_search=info";

/// Installs a stderr subscriber filtered by `RUST_LOG`. HTTP client internals
/// stay at `warn` unless asked for explicitly.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
        .add_directive(noise("reqwest=warn"))
        .add_directive(noise("hyper=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn noise(directive: &str) -> tracing_subscriber::filter::Directive {
    directive
        .parse()
        .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::WARN.into())
}
