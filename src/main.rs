use anyhow::{Context, Result};
use food_search::aggregator::FoodSearch;
use food_search::cli::{parse_args, Command};
use food_search::config::SearchConfig;
use food_search::logging::init_tracing;
use food_search::models::FoodCandidate;
use food_search::search::{load_food_records, MemoryFoodStore, PrefixIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Loads the dataset and attaches the saved index when it matches. A missing
/// or stale index only costs speed: searches use the pattern path.
fn open_store(dataset: &Path, index_path: &Path) -> Result<MemoryFoodStore> {
    let records = load_food_records(dataset)
        .with_context(|| format!("Failed to load food dataset from '{}'", dataset.display()))?;
    let mut store = MemoryFoodStore::new(records);

    if !index_path.exists() {
        warn!(path = %index_path.display(), "No prefix index found; run `build-index` for faster searches");
        return Ok(store);
    }
    if let Err(e) = PrefixIndex::load(index_path).and_then(|index| store.attach_index(index)) {
        warn!(path = %index_path.display(), error = %e, "Ignoring unusable prefix index");
    }
    Ok(store)
}

fn print_candidates(candidates: &[FoodCandidate], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(candidates)?);
        return Ok(());
    }
    if candidates.is_empty() {
        println!("No foods found.");
    }
    for (i, c) in candidates.iter().enumerate() {
        let brand = c.brand.as_deref().map(|b| format!(" ({b})")).unwrap_or_default();
        println!(
            "{:>2}. {}{} [{}:{}] {} kcal, P {}g, C {}g, F {}g per {}",
            i + 1,
            c.name,
            brand,
            c.source,
            c.source_id,
            c.calories,
            c.protein_g,
            c.carbs_g,
            c.fat_g,
            c.serving_description
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli_args = parse_args();
    let config = SearchConfig::from_env();

    match cli_args.command {
        Command::BuildIndex => {
            let records = load_food_records(&cli_args.dataset).with_context(|| {
                format!("Failed to load food dataset from '{}'", cli_args.dataset.display())
            })?;
            let index = PrefixIndex::build(&records);
            index
                .save(&cli_args.index)
                .with_context(|| format!("Failed to save prefix index to '{}'", cli_args.index.display()))?;
            info!(
                documents = index.len(),
                terms = index.term_count(),
                path = %cli_args.index.display(),
                "Prefix index built"
            );
        }
        Command::Barcode { code } => {
            let store = open_store(&cli_args.dataset, &cli_args.index)?;
            let search = FoodSearch::new(Arc::new(store));
            let found: Vec<FoodCandidate> = search.lookup_barcode(&code)?.into_iter().collect();
            print_candidates(&found, false)?;
        }
        Command::Search {
            query,
            page,
            page_size,
            local_only,
            json,
        } => {
            let store = Arc::new(open_store(&cli_args.dataset, &cli_args.index)?);
            let search = if local_only {
                FoodSearch::new(store)
            } else {
                FoodSearch::from_config(store, &config)
            };
            let page_size = page_size.unwrap_or(config.default_page_size);
            let results = search
                .search_foods(&query, page, page_size)
                .await
                .with_context(|| format!("Search for '{}' failed", query))?;
            print_candidates(&results, json)?;
        }
    }

    Ok(())
}
