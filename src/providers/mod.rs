//! External nutrition providers. Each adapter reports a typed outcome instead
//! of an error, so a failing provider only ever means fewer results.

pub mod nutritionix;
pub mod open_food_facts;
pub mod usda;

use crate::api_connection::ApiConnectionError;
use crate::models::{FoodCandidate, FoodSource};
use async_trait::async_trait;
use std::time::Duration;

pub use nutritionix::NutritionixProvider;
pub use open_food_facts::OpenFoodFactsProvider;
pub use usda::UsdaProvider;

/// One search request as seen by a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderQuery<'a> {
    /// What the user typed. Every provider runs its own text matching.
    pub raw: &'a str,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug)]
pub enum ProviderOutcome {
    Found(Vec<FoodCandidate>),
    /// Not configured or disabled. Not a failure.
    Skipped(&'static str),
    Failed(ApiConnectionError),
}

impl ProviderOutcome {
    pub fn from_result(result: Result<Vec<FoodCandidate>, ApiConnectionError>) -> Self {
        match result {
            Ok(candidates) => ProviderOutcome::Found(candidates),
            Err(ApiConnectionError::MissingApiKey(key)) => ProviderOutcome::Skipped(key),
            Err(err) => ProviderOutcome::Failed(err),
        }
    }

    pub fn into_candidates(self) -> Vec<FoodCandidate> {
        match self {
            ProviderOutcome::Found(candidates) => candidates,
            ProviderOutcome::Skipped(_) | ProviderOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProviderOutcome::Failed(_))
    }
}

#[async_trait]
pub trait NutritionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn source(&self) -> FoodSource;

    /// Upper bound on one `search` call.
    fn timeout(&self) -> Duration;

    async fn search(&self, query: &ProviderQuery<'_>) -> ProviderOutcome;
}

impl ProviderQuery<'_> {
    /// The user's text with surrounding whitespace removed.
    pub fn text(&self) -> &str {
        self.raw.trim()
    }
}

/// "APPLES, RAW, WITH SKIN" → "Apples, Raw, With Skin".
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c != '\'';
        }
    }
    out
}

/// 1.0 → "1", 0.5 → "0.5", 2.25 → "2.25".
pub(crate) fn format_quantity(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
