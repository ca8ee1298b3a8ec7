use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, info};

use crate::models::{FoodCategory, LocalFoodRecord};

// Required columns
const ID_COL: &str = "food_id";
const NAME_COL: &str = "name";
const KCAL_COL: &str = "calories";
// Optional columns
const CATEGORY_COL: &str = "category";
const ALT_NAMES_COL: &str = "alternate_names";
const BARCODE_COL: &str = "barcode";
const PROTEIN_COL: &str = "protein_g";
const CARB_COL: &str = "carbs_g";
const FAT_COL: &str = "fat_g";
const FIBER_COL: &str = "fiber_g";
const SERVING_DESC_COL: &str = "serving_description";
const SERVING_WEIGHT_COL: &str = "serving_weight_g";

fn parse_optional_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn optional_text(s: &str) -> Option<String> {
    Some(s.trim().to_string()).filter(|s| !s.is_empty())
}

struct Columns {
    id: usize,
    name: usize,
    kcal: usize,
    category: Option<usize>,
    alt_names: Option<usize>,
    barcode: Option<usize>,
    protein: Option<usize>,
    carbs: Option<usize>,
    fat: Option<usize>,
    fiber: Option<usize>,
    serving_desc: Option<usize>,
    serving_weight: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |col: &str| headers.iter().position(|h| h.trim() == col);
        let require = |col: &str| find(col).ok_or_else(|| anyhow::anyhow!("Column '{}' not found", col));
        Ok(Self {
            id: require(ID_COL)?,
            name: require(NAME_COL)?,
            kcal: require(KCAL_COL)?,
            category: find(CATEGORY_COL),
            alt_names: find(ALT_NAMES_COL),
            barcode: find(BARCODE_COL),
            protein: find(PROTEIN_COL),
            carbs: find(CARB_COL),
            fat: find(FAT_COL),
            fiber: find(FIBER_COL),
            serving_desc: find(SERVING_DESC_COL),
            serving_weight: find(SERVING_WEIGHT_COL),
        })
    }
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Loads the bundled food dataset. Nutrient columns are per 100g; missing or
/// unparseable numbers read as 0 (or as absent for fiber and serving weight).
pub fn load_food_records(csv_path: &Path) -> Result<Vec<LocalFoodRecord>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Food dataset not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open food dataset at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file);

    let headers = rdr.headers()?.clone();
    let cols = Columns::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let food_id = field(&record, Some(cols.id)).trim().to_string();
        let name = field(&record, Some(cols.name)).trim().to_string();
        if food_id.is_empty() || name.is_empty() {
            skipped += 1;
            continue;
        }

        let number = |idx: Option<usize>| parse_optional_f64(field(&record, idx));
        records.push(LocalFoodRecord {
            food_id,
            name,
            category: FoodCategory::from_tag(field(&record, cols.category)),
            alternate_names: field(&record, cols.alt_names).trim().to_string(),
            barcode: optional_text(field(&record, cols.barcode)),
            calories: number(Some(cols.kcal)).unwrap_or(0.0),
            protein_g: number(cols.protein).unwrap_or(0.0),
            carbs_g: number(cols.carbs).unwrap_or(0.0),
            fat_g: number(cols.fat).unwrap_or(0.0),
            fiber_g: number(cols.fiber),
            serving_description: optional_text(field(&record, cols.serving_desc)),
            serving_weight_g: number(cols.serving_weight).filter(|w| *w > 0.0),
        });
    }

    if skipped > 0 {
        debug!(skipped, "Skipped dataset rows without an id or name");
    }
    if records.is_empty() {
        return Err(anyhow::anyhow!("No valid food records loaded from {:?}", csv_path));
    }

    info!(records = records.len(), path = ?csv_path, "Food dataset loaded");
    Ok(records)
}
