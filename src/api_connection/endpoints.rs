//! Endpoints and response shapes of the external nutrition APIs. Only the
//! fields the adapters read are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const USDA_SEARCH_PATH: &str = "/foods/search";
pub const USDA_DATA_TYPES: &str = "Foundation,SR Legacy";

pub const NUTRITIONIX_BASE_URL: &str = "https://trackapi.nutritionix.com";
pub const NUTRITIONIX_NATURAL_PATH: &str = "/v2/natural/nutrients";

pub const OFF_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const OFF_SEARCH_PATH: &str = "/cgi/search.pl";
pub const OFF_FIELDS: &str = "code,product_name,brands,nutriments,serving_size,serving_quantity";

// --- FoodData Central ---

#[derive(Debug, Deserialize, Clone)]
pub struct UsdaSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaFood>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFood {
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: String,
    pub brand_owner: Option<String>,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<UsdaNutrient>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsdaNutrient {
    pub nutrient_id: Option<u32>,
    pub value: Option<f64>,
    pub amount: Option<f64>,
}

// --- Nutritionix natural language ---

#[derive(Debug, Serialize)]
pub struct NutritionixRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NutritionixResponse {
    #[serde(default)]
    pub foods: Vec<NutritionixFood>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NutritionixFood {
    #[serde(default)]
    pub food_name: String,
    pub brand_name: Option<String>,
    pub nix_item_id: Option<String>,
    pub nf_calories: Option<f64>,
    pub nf_protein: Option<f64>,
    pub nf_total_carbohydrate: Option<f64>,
    pub nf_total_fat: Option<f64>,
    pub nf_dietary_fiber: Option<f64>,
    pub serving_qty: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_weight_grams: Option<f64>,
}

// --- Open Food Facts ---

#[derive(Debug, Deserialize, Clone)]
pub struct OffSearchResponse {
    #[serde(default)]
    pub products: Vec<OffProduct>,
}

/// Open Food Facts is loosely typed: numbers often arrive as strings, so the
/// numeric fields stay as raw JSON and go through [`lenient_number`].
#[derive(Debug, Deserialize, Clone)]
pub struct OffProduct {
    pub code: Option<Value>,
    pub product_name: Option<String>,
    pub brands: Option<String>,
    #[serde(default)]
    pub nutriments: HashMap<String, Value>,
    pub serving_size: Option<String>,
    pub serving_quantity: Option<Value>,
}

impl OffProduct {
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn nutriment(&self, key: &str) -> Option<f64> {
        self.nutriments.get(key).and_then(lenient_number)
    }

    pub fn serving_quantity(&self) -> Option<f64> {
        self.serving_quantity.as_ref().and_then(lenient_number)
    }
}

pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
