pub mod aggregator;
pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod query_normalizer;
pub mod search;

pub use aggregator::FoodSearch;
pub use errors::{SearchError, StoreError};
pub use models::{to_food_candidate, FoodCandidate, FoodSource};
pub use query_normalizer::{normalize, NormalizedQuery};
