use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SERVING_WEIGHT_G: f64 = 100.0;
pub const DEFAULT_SERVING_DESCRIPTION: &str = "100g";

/// Where a candidate came from. The serialized names are the stable
/// identifiers stored alongside cached food items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodSource {
    #[serde(rename = "opennutrition")]
    Local,
    #[serde(rename = "usda_fdc")]
    GovernmentDb,
    #[serde(rename = "nutritionix")]
    NlpProvider,
    #[serde(rename = "openfoodfacts")]
    CrowdDb,
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "quick_add")]
    QuickAdd,
}

impl FoodSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodSource::Local => "opennutrition",
            FoodSource::GovernmentDb => "usda_fdc",
            FoodSource::NlpProvider => "nutritionix",
            FoodSource::CrowdDb => "openfoodfacts",
            FoodSource::Custom => "custom",
            FoodSource::QuickAdd => "quick_add",
        }
    }
}

impl fmt::Display for FoodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of food in the local dataset, used as the primary sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Everyday,
    Prepared,
    Restaurant,
    Grocery,
    Unknown,
}

impl FoodCategory {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "everyday" => FoodCategory::Everyday,
            "prepared" => FoodCategory::Prepared,
            "restaurant" => FoodCategory::Restaurant,
            "grocery" => FoodCategory::Grocery,
            _ => FoodCategory::Unknown,
        }
    }

    /// Everyday foods first, then prepared, then restaurant, then the rest.
    pub fn rank(&self) -> u8 {
        match self {
            FoodCategory::Everyday => 0,
            FoodCategory::Prepared => 1,
            FoodCategory::Restaurant => 2,
            FoodCategory::Grocery | FoodCategory::Unknown => 3,
        }
    }
}

/// One row of the bundled reference dataset. Nutrient values are per 100g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFoodRecord {
    pub food_id: String,
    pub name: String,
    pub category: FoodCategory,
    /// Space-joined alternate names, searched alongside `name`.
    pub alternate_names: String,
    pub barcode: Option<String>,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: Option<f64>,
    pub serving_description: Option<String>,
    pub serving_weight_g: Option<f64>,
}

/// The common shape every search source produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub name: String,
    pub brand: Option<String>,
    pub source: FoodSource,
    pub source_id: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: Option<f64>,
    #[serde(rename = "serving_size")]
    pub serving_description: String,
    pub serving_weight_g: f64,
}

impl FoodCandidate {
    /// Clamps negative or non-finite values to zero, rounds to one decimal and
    /// fills in the serving defaults. Every constructor path ends here.
    pub fn sanitized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.brand = self
            .brand
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        self.calories = round1(self.calories);
        self.protein_g = round1(self.protein_g);
        self.carbs_g = round1(self.carbs_g);
        self.fat_g = round1(self.fat_g);
        self.fiber_g = self.fiber_g.map(round1);
        if self.serving_description.trim().is_empty() {
            self.serving_description = DEFAULT_SERVING_DESCRIPTION.to_string();
        }
        if !self.serving_weight_g.is_finite() || self.serving_weight_g <= 0.0 {
            self.serving_weight_g = DEFAULT_SERVING_WEIGHT_G;
        }
        self
    }

    /// Deduplication key: two candidates with the same identity are the same food.
    pub fn identity(&self) -> (FoodSource, &str) {
        (self.source, self.source_id.as_str())
    }

    /// Nutrition for `servings` portions of this candidate.
    pub fn for_servings(&self, servings: f64) -> Self {
        let factor = if servings.is_finite() && servings > 0.0 {
            servings
        } else {
            0.0
        };
        FoodCandidate {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g.map(|f| f * factor),
            serving_weight_g: self.serving_weight_g * factor,
            ..self.clone()
        }
        .sanitized()
    }
}

/// Converts a per-100g dataset row into a candidate scaled to its default serving.
pub fn to_food_candidate(record: &LocalFoodRecord) -> FoodCandidate {
    let serving_g = record
        .serving_weight_g
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_SERVING_WEIGHT_G);
    let scale = serving_g / 100.0;

    FoodCandidate {
        name: record.name.clone(),
        brand: None,
        source: FoodSource::Local,
        source_id: record.food_id.clone(),
        calories: record.calories * scale,
        protein_g: record.protein_g * scale,
        carbs_g: record.carbs_g * scale,
        fat_g: record.fat_g * scale,
        fiber_g: record.fiber_g.filter(|f| *f != 0.0).map(|f| f * scale),
        serving_description: record
            .serving_description
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVING_DESCRIPTION.to_string()),
        serving_weight_g: serving_g,
    }
    .sanitized()
}

pub(crate) fn round1(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
pub(crate) fn sample_record(food_id: &str, name: &str, category: FoodCategory) -> LocalFoodRecord {
    LocalFoodRecord {
        food_id: food_id.to_string(),
        name: name.to_string(),
        category,
        alternate_names: String::new(),
        barcode: None,
        calories: 100.0,
        protein_g: 1.0,
        carbs_g: 20.0,
        fat_g: 0.5,
        fiber_g: None,
        serving_description: None,
        serving_weight_g: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_food_candidate_scales_to_serving() {
        let mut apple = sample_record("fd_apple", "Apple", FoodCategory::Everyday);
        apple.calories = 52.0;
        apple.protein_g = 0.26;
        apple.carbs_g = 13.81;
        apple.fat_g = 0.17;
        apple.fiber_g = Some(2.4);
        apple.serving_description = Some("1 medium (182g)".to_string());
        apple.serving_weight_g = Some(182.0);

        let candidate = to_food_candidate(&apple);
        assert_eq!(candidate.source, FoodSource::Local);
        assert_eq!(candidate.source_id, "fd_apple");
        assert_eq!(candidate.calories, 94.6);
        assert_eq!(candidate.protein_g, 0.5);
        assert_eq!(candidate.carbs_g, 25.1);
        assert_eq!(candidate.fat_g, 0.3);
        assert_eq!(candidate.fiber_g, Some(4.4));
        assert_eq!(candidate.serving_description, "1 medium (182g)");
        assert_eq!(candidate.serving_weight_g, 182.0);
    }

    #[test]
    fn test_to_food_candidate_defaults_to_100g() {
        let mut rice = sample_record("fd_rice", "Rice, brown, cooked", FoodCategory::Everyday);
        rice.fiber_g = Some(0.0);
        let candidate = to_food_candidate(&rice);
        assert_eq!(candidate.serving_weight_g, 100.0);
        assert_eq!(candidate.serving_description, "100g");
        assert_eq!(candidate.calories, 100.0);
        // zero fiber is reported as absent
        assert_eq!(candidate.fiber_g, None);
    }

    #[test]
    fn test_sanitized_clamps_negative_and_nan() {
        let candidate = FoodCandidate {
            name: "  Odd  ".to_string(),
            brand: Some("   ".to_string()),
            source: FoodSource::CrowdDb,
            source_id: "123".to_string(),
            calories: -5.0,
            protein_g: f64::NAN,
            carbs_g: 3.14159,
            fat_g: f64::INFINITY,
            fiber_g: Some(-1.0),
            serving_description: String::new(),
            serving_weight_g: 0.0,
        }
        .sanitized();

        assert_eq!(candidate.name, "Odd");
        assert_eq!(candidate.brand, None);
        assert_eq!(candidate.calories, 0.0);
        assert_eq!(candidate.protein_g, 0.0);
        assert_eq!(candidate.carbs_g, 3.1);
        assert_eq!(candidate.fat_g, 0.0);
        assert_eq!(candidate.fiber_g, Some(0.0));
        assert_eq!(candidate.serving_description, "100g");
        assert_eq!(candidate.serving_weight_g, 100.0);
    }

    #[test]
    fn test_for_servings_scales_and_rounds() {
        let record = sample_record("fd_oats", "Oats", FoodCategory::Everyday);
        let base = to_food_candidate(&record);
        let doubled = base.for_servings(2.5);
        assert_eq!(doubled.calories, 250.0);
        assert_eq!(doubled.carbs_g, 50.0);
        assert_eq!(doubled.fat_g, 1.3);
        assert_eq!(doubled.serving_weight_g, 250.0);
        assert_eq!(doubled.identity(), base.identity());
    }

    #[test]
    fn test_category_rank_order() {
        assert!(FoodCategory::Everyday.rank() < FoodCategory::Prepared.rank());
        assert!(FoodCategory::Prepared.rank() < FoodCategory::Restaurant.rank());
        assert!(FoodCategory::Restaurant.rank() < FoodCategory::Grocery.rank());
        assert_eq!(FoodCategory::from_tag(" Restaurant "), FoodCategory::Restaurant);
        assert_eq!(FoodCategory::from_tag("bakery"), FoodCategory::Unknown);
    }

    #[test]
    fn test_source_wire_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&FoodSource::GovernmentDb)?, "\"usda_fdc\"");
        assert_eq!(serde_json::to_string(&FoodSource::QuickAdd)?, "\"quick_add\"");
        assert_eq!(FoodSource::Local.to_string(), "opennutrition");
        Ok(())
    }
}
