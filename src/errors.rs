use thiserror::Error;

/// A fault in the local dataset backend itself. Unlike provider failures these
/// are not recoverable inside a search.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local food store unavailable: {0}")]
    Unavailable(String),
}

/// The only errors `FoodSearch::search_foods` returns.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),
    #[error("page size must be between 1 and {max}, got {got}")]
    InvalidPageSize { got: u32, max: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}
