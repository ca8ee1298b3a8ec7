use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Search foods across the local dataset and nutrition APIs", long_about = None)]
pub struct Cli {
    /// Path to the food dataset CSV
    #[arg(long, env = "FOOD_DATASET_PATH", default_value = "foods.csv")]
    pub dataset: PathBuf,

    /// Path to the saved prefix index
    #[arg(long, env = "FOOD_INDEX_PATH", default_value = "foods.idx")]
    pub index: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for a food by free text ("2 cups of brown rice")
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Defaults to FOOD_SEARCH_PAGE_SIZE, or 20
        #[arg(long)]
        page_size: Option<u32>,
        /// Do not call external nutrition APIs
        #[arg(long)]
        local_only: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the prefix index from the dataset and save it
    BuildIndex,
    /// Look up a packaged food by barcode in the local dataset
    Barcode { code: String },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
