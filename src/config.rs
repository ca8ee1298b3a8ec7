//! Runtime configuration, read from the environment (and a `.env` file when present).

use crate::api_connection::endpoints::{NUTRITIONIX_BASE_URL, OFF_BASE_URL, USDA_BASE_URL};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_EXTERNAL_THRESHOLD: usize = 5;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_USDA_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_NUTRITIONIX_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_OFF_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_OFF_USER_AGENT: &str = "food_search/0.1 (nutrition lookup)";

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NutritionixConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    pub enabled: bool,
    pub user_agent: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub usda: UsdaConfig,
    pub nutritionix: NutritionixConfig,
    pub open_food_facts: OpenFoodFactsConfig,
    /// External providers are only consulted below this many local results.
    pub external_threshold: usize,
    pub default_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            usda: UsdaConfig {
                api_key: None,
                base_url: USDA_BASE_URL.to_string(),
                timeout: Duration::from_millis(DEFAULT_USDA_TIMEOUT_MS),
            },
            nutritionix: NutritionixConfig {
                app_id: None,
                api_key: None,
                base_url: NUTRITIONIX_BASE_URL.to_string(),
                timeout: Duration::from_millis(DEFAULT_NUTRITIONIX_TIMEOUT_MS),
            },
            open_food_facts: OpenFoodFactsConfig {
                enabled: true,
                user_agent: DEFAULT_OFF_USER_AGENT.to_string(),
                base_url: OFF_BASE_URL.to_string(),
                timeout: Duration::from_millis(DEFAULT_OFF_TIMEOUT_MS),
            },
            external_threshold: DEFAULT_EXTERNAL_THRESHOLD,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            usda: UsdaConfig {
                api_key: get("USDA_API_KEY"),
                base_url: get("USDA_BASE_URL").unwrap_or(defaults.usda.base_url),
                timeout: Duration::from_millis(parse_or(
                    "USDA_TIMEOUT_MS",
                    get("USDA_TIMEOUT_MS"),
                    DEFAULT_USDA_TIMEOUT_MS,
                )),
            },
            nutritionix: NutritionixConfig {
                app_id: get("NUTRITIONIX_APP_ID"),
                api_key: get("NUTRITIONIX_API_KEY"),
                base_url: get("NUTRITIONIX_BASE_URL").unwrap_or(defaults.nutritionix.base_url),
                timeout: Duration::from_millis(parse_or(
                    "NUTRITIONIX_TIMEOUT_MS",
                    get("NUTRITIONIX_TIMEOUT_MS"),
                    DEFAULT_NUTRITIONIX_TIMEOUT_MS,
                )),
            },
            open_food_facts: OpenFoodFactsConfig {
                enabled: parse_or("OFF_ENABLED", get("OFF_ENABLED"), true),
                user_agent: get("OFF_USER_AGENT").unwrap_or(defaults.open_food_facts.user_agent),
                base_url: get("OFF_BASE_URL").unwrap_or(defaults.open_food_facts.base_url),
                timeout: Duration::from_millis(parse_or(
                    "OFF_TIMEOUT_MS",
                    get("OFF_TIMEOUT_MS"),
                    DEFAULT_OFF_TIMEOUT_MS,
                )),
            },
            external_threshold: parse_or(
                "FOOD_SEARCH_EXTERNAL_THRESHOLD",
                get("FOOD_SEARCH_EXTERNAL_THRESHOLD"),
                DEFAULT_EXTERNAL_THRESHOLD,
            ),
            default_page_size: parse_or("FOOD_SEARCH_PAGE_SIZE", get("FOOD_SEARCH_PAGE_SIZE"), DEFAULT_PAGE_SIZE),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, %value, %default, "Invalid configuration value, using default");
            default
        }),
    }
}
