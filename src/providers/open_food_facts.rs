use super::{NutritionProvider, ProviderOutcome, ProviderQuery};
use crate::api_connection::connection::{build_client, fetch_json};
use crate::api_connection::endpoints::{OffProduct, OffSearchResponse, OFF_FIELDS, OFF_SEARCH_PATH};
use crate::api_connection::ApiConnectionError;
use crate::config::OpenFoodFactsConfig;
use crate::models::{FoodCandidate, FoodSource, DEFAULT_SERVING_DESCRIPTION, DEFAULT_SERVING_WEIGHT_G};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Keyword search over packaged goods in the Open Food Facts database. No key
/// is needed, but requests must carry an identifying User-Agent.
pub struct OpenFoodFactsProvider {
    client: Client,
    enabled: bool,
    base_url: String,
    timeout: Duration,
}

impl OpenFoodFactsProvider {
    pub fn new(config: &OpenFoodFactsConfig) -> Self {
        Self {
            client: build_client(config.timeout, Some(&config.user_agent)),
            enabled: config.enabled,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    async fn fetch(&self, query: &ProviderQuery<'_>) -> Result<Vec<FoodCandidate>, ApiConnectionError> {
        let url = format!("{}{}", self.base_url, OFF_SEARCH_PATH);
        let page = query.page.to_string();
        let page_size = query.page_size.to_string();
        let request = self.client.get(&url).query(&[
            ("search_terms", query.text()),
            ("search_simple", "1"),
            ("action", "process"),
            ("json", "1"),
            ("page", page.as_str()),
            ("page_size", page_size.as_str()),
            ("fields", OFF_FIELDS),
        ]);

        let response: OffSearchResponse = fetch_json(request).await?;
        debug!(count = response.products.len(), "Open Food Facts search returned");
        Ok(response.products.iter().filter_map(product_to_candidate).collect())
    }
}

#[async_trait]
impl NutritionProvider for OpenFoodFactsProvider {
    fn name(&self) -> &'static str {
        "openfoodfacts"
    }

    fn source(&self) -> FoodSource {
        FoodSource::CrowdDb
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &ProviderQuery<'_>) -> ProviderOutcome {
        if !self.enabled {
            return ProviderOutcome::Skipped("OFF_ENABLED");
        }
        ProviderOutcome::from_result(self.fetch(query).await)
    }
}

/// Per-serving value when the product has one, else per 100g.
fn nutrient(product: &OffProduct, key: &str) -> Option<f64> {
    product
        .nutriment(&format!("{key}_serving"))
        .filter(|v| *v != 0.0)
        .or_else(|| product.nutriment(&format!("{key}_100g")))
}

pub(crate) fn product_to_candidate(product: &OffProduct) -> Option<FoodCandidate> {
    let code = product.code()?;
    let name = product.product_name.as_deref().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return None;
    }
    let brand = product
        .brands
        .as_deref()
        .and_then(|b| b.split(',').next())
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    Some(
        FoodCandidate {
            name: name.to_string(),
            brand,
            source: FoodSource::CrowdDb,
            source_id: code,
            calories: nutrient(product, "energy-kcal").unwrap_or(0.0),
            protein_g: nutrient(product, "proteins").unwrap_or(0.0),
            carbs_g: nutrient(product, "carbohydrates").unwrap_or(0.0),
            fat_g: nutrient(product, "fat").unwrap_or(0.0),
            fiber_g: nutrient(product, "fiber").filter(|f| *f != 0.0),
            serving_description: product
                .serving_size
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVING_DESCRIPTION.to_string()),
            serving_weight_g: product
                .serving_quantity()
                .filter(|q| *q > 0.0)
                .unwrap_or(DEFAULT_SERVING_WEIGHT_G),
        }
        .sanitized(),
    )
}
