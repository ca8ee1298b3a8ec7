pub mod data_loader;
pub mod local;
pub mod prefix_index;
pub mod store;

pub use data_loader::load_food_records;
pub use local::search_local;
pub use prefix_index::PrefixIndex;
pub use store::{FoodStore, IndexHit, IndexLookup, MatchExpression, MemoryFoodStore, PatternTerm};
