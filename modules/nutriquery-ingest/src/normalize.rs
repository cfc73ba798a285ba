//! Raw catalog JSON → cleaned product rows.

use std::path::Path;

use nutriquery_common::{
    write_products_csv, Category, NutriQueryError, Product, Result, NO_ALLERGENS,
    UNKNOWN_INGREDIENTS,
};
use serde_json::Value;
use tracing::{info, warn};

/// Map one raw catalog entry onto a product row. Non-objects yield `None`.
pub fn normalize_product(raw: &Value) -> Option<Product> {
    let obj = raw.as_object()?;
    let nutriments = obj.get("nutriments");
    let nutriment = |key: &str| number(nutriments.and_then(|n| n.get(key)));

    Some(Product {
        name: text(obj.get("product_name")).unwrap_or_else(|| "Unknown".to_string()),
        ingredients: text(obj.get("ingredients_text"))
            .unwrap_or_else(|| UNKNOWN_INGREDIENTS.to_string()),
        energy_kcal: nutriment("energy-kcal_100g"),
        protein_100g: nutriment("proteins_100g"),
        fat_100g: nutriment("fat_100g"),
        carbohydrates_100g: nutriment("carbohydrates_100g"),
        allergens: Some(text(obj.get("allergens")).unwrap_or_else(|| NO_ALLERGENS.to_string())),
        price: number(obj.get("price")),
        rating: number(obj.get("rating")),
    })
}

pub fn normalize_products(raw: &[Value]) -> Vec<Product> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let product = normalize_product(entry);
            if product.is_none() {
                warn!(index = i, "Skipping raw entry that is not an object");
            }
            product
        })
        .collect()
}

/// Read a raw JSON array and write the cleaned CSV. Returns rows written.
pub fn normalize_file(raw_path: &Path, cleaned_path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(raw_path).map_err(|e| {
        NutriQueryError::Ingest(format!("Failed to read {}: {}", raw_path.display(), e))
    })?;
    let raw: Vec<Value> = serde_json::from_str(&content).map_err(|e| {
        NutriQueryError::Ingest(format!("Failed to parse {}: {}", raw_path.display(), e))
    })?;

    let products = normalize_products(&raw);
    let file = std::fs::File::create(cleaned_path)?;
    write_products_csv(file, &products)?;

    info!(
        raw = %raw_path.display(),
        cleaned = %cleaned_path.display(),
        rows = products.len(),
        "Normalized raw data"
    );
    Ok(products.len())
}

/// Normalize every category whose raw file exists in `data_dir`.
pub fn normalize_all(data_dir: &Path, categories: &[Category]) -> Result<Vec<(Category, usize)>> {
    let mut written = Vec::new();
    for &category in categories {
        let raw_path = data_dir.join(category.raw_file_name());
        if !raw_path.exists() {
            warn!(category = %category, path = %raw_path.display(), "Raw data file missing, skipping");
            continue;
        }
        let cleaned_path = data_dir.join(category.cleaned_file_name());
        written.push((category, normalize_file(&raw_path, &cleaned_path)?));
    }
    Ok(written)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numbers arrive as JSON numbers or numeric strings; anything else is null.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}
