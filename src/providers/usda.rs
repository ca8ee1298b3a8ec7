use super::{format_quantity, title_case, NutritionProvider, ProviderOutcome, ProviderQuery};
use crate::api_connection::connection::{build_client, fetch_json};
use crate::api_connection::endpoints::{UsdaFood, UsdaNutrient, UsdaSearchResponse, USDA_DATA_TYPES, USDA_SEARCH_PATH};
use crate::api_connection::ApiConnectionError;
use crate::config::UsdaConfig;
use crate::models::{FoodCandidate, FoodSource, DEFAULT_SERVING_DESCRIPTION, DEFAULT_SERVING_WEIGHT_G};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

// Nutrient ids, tried in order; the first nonzero value wins.
const ENERGY_IDS: &[u32] = &[1008, 957, 958];
const PROTEIN_IDS: &[u32] = &[1003];
const FAT_IDS: &[u32] = &[1004];
const CARB_IDS: &[u32] = &[1005];
const FIBER_IDS: &[u32] = &[1079];

/// Keyword search against USDA FoodData Central (Foundation and SR Legacy foods).
pub struct UsdaProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl UsdaProvider {
    pub fn new(config: &UsdaConfig) -> Self {
        Self {
            client: build_client(config.timeout, None),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    async fn fetch(&self, query: &ProviderQuery<'_>) -> Result<Vec<FoodCandidate>, ApiConnectionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ApiConnectionError::MissingApiKey("USDA_API_KEY"))?;

        let url = format!("{}{}", self.base_url, USDA_SEARCH_PATH);
        let page_size = query.page_size.to_string();
        let page = query.page.to_string();
        let request = self.client.get(&url).query(&[
            ("api_key", api_key),
            ("query", query.text()),
            ("pageSize", page_size.as_str()),
            ("pageNumber", page.as_str()),
            ("dataType", USDA_DATA_TYPES),
            ("sortOrder", "asc"),
        ]);

        let response: UsdaSearchResponse = fetch_json(request).await?;
        debug!(count = response.foods.len(), "USDA search returned");
        Ok(response.foods.iter().filter_map(food_to_candidate).collect())
    }
}

#[async_trait]
impl NutritionProvider for UsdaProvider {
    fn name(&self) -> &'static str {
        "usda"
    }

    fn source(&self) -> FoodSource {
        FoodSource::GovernmentDb
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &ProviderQuery<'_>) -> ProviderOutcome {
        ProviderOutcome::from_result(self.fetch(query).await)
    }
}

fn nutrient_value(nutrients: &[UsdaNutrient], ids: &[u32]) -> f64 {
    ids.iter()
        .flat_map(|id| nutrients.iter().filter(move |n| n.nutrient_id == Some(*id)))
        .filter_map(|n| n.value.filter(|v| *v != 0.0).or(n.amount))
        .find(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(0.0)
}

pub(crate) fn food_to_candidate(food: &UsdaFood) -> Option<FoodCandidate> {
    let fdc_id = food.fdc_id?;
    let name = title_case(&food.description);
    if name.is_empty() {
        return None;
    }

    let (serving_description, serving_weight_g) = match food.serving_size.filter(|s| *s > 0.0) {
        Some(size) => {
            let unit = food.serving_size_unit.as_deref().unwrap_or("g");
            (format!("{}{}", format_quantity(size), unit), size)
        }
        None => (DEFAULT_SERVING_DESCRIPTION.to_string(), DEFAULT_SERVING_WEIGHT_G),
    };
    let fiber = nutrient_value(&food.food_nutrients, FIBER_IDS);

    Some(
        FoodCandidate {
            name,
            brand: food.brand_owner.clone().or_else(|| food.brand_name.clone()),
            source: FoodSource::GovernmentDb,
            source_id: fdc_id.to_string(),
            calories: nutrient_value(&food.food_nutrients, ENERGY_IDS),
            protein_g: nutrient_value(&food.food_nutrients, PROTEIN_IDS),
            carbs_g: nutrient_value(&food.food_nutrients, CARB_IDS),
            fat_g: nutrient_value(&food.food_nutrients, FAT_IDS),
            fiber_g: (fiber != 0.0).then_some(fiber),
            serving_description,
            serving_weight_g,
        }
        .sanitized(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn food(value: serde_json::Value) -> UsdaFood {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_energy_falls_back_through_ids() {
        let apple = food(json!({
            "fdcId": 171688,
            "description": "APPLES, RAW, WITH SKIN",
            "foodNutrients": [
                { "nutrientId": 1008, "value": 0.0 },
                { "nutrientId": 957, "amount": 61.8 },
                { "nutrientId": 958, "value": 52.0 },
                { "nutrientId": 1003, "value": 0.26 },
                { "nutrientId": 1005, "value": 13.81 },
                { "nutrientId": 1004, "value": 0.17 },
                { "nutrientId": 1079, "value": 2.4 }
            ]
        }));
        let candidate = food_to_candidate(&apple).unwrap();
        assert_eq!(candidate.name, "Apples, Raw, With Skin");
        assert_eq!(candidate.source_id, "171688");
        assert_eq!(candidate.calories, 61.8);
        assert_eq!(candidate.protein_g, 0.3);
        assert_eq!(candidate.carbs_g, 13.8);
        assert_eq!(candidate.fat_g, 0.2);
        assert_eq!(candidate.fiber_g, Some(2.4));
        assert_eq!(candidate.serving_description, "100g");
        assert_eq!(candidate.serving_weight_g, 100.0);
    }

    #[test]
    fn test_serving_and_brand() {
        let bar = food(json!({
            "fdcId": 1,
            "description": "granola bar",
            "brandName": "Acme",
            "servingSize": 40.0,
            "servingSizeUnit": "g",
            "foodNutrients": [{ "nutrientId": 1008, "value": 190.0 }]
        }));
        let candidate = food_to_candidate(&bar).unwrap();
        assert_eq!(candidate.brand.as_deref(), Some("Acme"));
        assert_eq!(candidate.serving_description, "40g");
        assert_eq!(candidate.serving_weight_g, 40.0);
        assert_eq!(candidate.fiber_g, None);
    }

    #[test]
    fn test_entries_without_id_or_name_are_dropped() {
        assert!(food_to_candidate(&food(json!({ "description": "Orphan" }))).is_none());
        assert!(food_to_candidate(&food(json!({ "fdcId": 3, "description": "  " }))).is_none());
    }
}
