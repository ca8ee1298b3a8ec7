use super::{format_quantity, title_case, NutritionProvider, ProviderOutcome, ProviderQuery};
use crate::api_connection::connection::{build_client, fetch_json};
use crate::api_connection::endpoints::{
    NutritionixFood, NutritionixRequest, NutritionixResponse, NUTRITIONIX_NATURAL_PATH,
};
use crate::api_connection::ApiConnectionError;
use crate::config::NutritionixConfig;
use crate::models::{FoodCandidate, FoodSource, DEFAULT_SERVING_WEIGHT_G};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Natural-language lookup: the raw phrase ("2 eggs and toast") is parsed server side.
pub struct NutritionixProvider {
    client: Client,
    app_id: Option<String>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl NutritionixProvider {
    pub fn new(config: &NutritionixConfig) -> Self {
        Self {
            client: build_client(config.timeout, None),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    async fn fetch(&self, query: &ProviderQuery<'_>) -> Result<Vec<FoodCandidate>, ApiConnectionError> {
        let app_id = self
            .app_id
            .as_deref()
            .ok_or(ApiConnectionError::MissingApiKey("NUTRITIONIX_APP_ID"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ApiConnectionError::MissingApiKey("NUTRITIONIX_API_KEY"))?;

        let url = format!("{}{}", self.base_url, NUTRITIONIX_NATURAL_PATH);
        let request = self
            .client
            .post(&url)
            .header("x-app-id", app_id)
            .header("x-app-key", api_key)
            .json(&NutritionixRequest { query: query.text() });

        let response: NutritionixResponse = fetch_json(request).await?;
        debug!(count = response.foods.len(), "Nutritionix lookup returned");
        Ok(response.foods.iter().filter_map(food_to_candidate).collect())
    }
}

#[async_trait]
impl NutritionProvider for NutritionixProvider {
    fn name(&self) -> &'static str {
        "nutritionix"
    }

    fn source(&self) -> FoodSource {
        FoodSource::NlpProvider
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &ProviderQuery<'_>) -> ProviderOutcome {
        ProviderOutcome::from_result(self.fetch(query).await)
    }
}

pub(crate) fn food_to_candidate(food: &NutritionixFood) -> Option<FoodCandidate> {
    let name = title_case(&food.food_name);
    if name.is_empty() {
        return None;
    }
    let source_id = food
        .nix_item_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(food.food_name.trim())
        .to_string();

    let qty = food.serving_qty.filter(|q| q.is_finite() && *q > 0.0).unwrap_or(1.0);
    let unit = food.serving_unit.as_deref().unwrap_or("");
    let serving_description = format!("{} {}", format_quantity(qty), unit).trim().to_string();

    Some(
        FoodCandidate {
            name,
            brand: food.brand_name.clone(),
            source: FoodSource::NlpProvider,
            source_id,
            calories: food.nf_calories.unwrap_or(0.0),
            protein_g: food.nf_protein.unwrap_or(0.0),
            carbs_g: food.nf_total_carbohydrate.unwrap_or(0.0),
            fat_g: food.nf_total_fat.unwrap_or(0.0),
            fiber_g: food.nf_dietary_fiber.filter(|f| *f != 0.0),
            serving_description,
            serving_weight_g: food.serving_weight_grams.unwrap_or(DEFAULT_SERVING_WEIGHT_G),
        }
        .sanitized(),
    )
}
