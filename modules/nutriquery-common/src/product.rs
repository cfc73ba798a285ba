use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::category::Category;
use crate::error::{NutriQueryError, Result};

/// Sentinel for products with no ingredient list upstream.
pub const UNKNOWN_INGREDIENTS: &str = "unknown";
/// Sentinel for products with no allergen declaration upstream.
pub const NO_ALLERGENS: &str = "none";

fn unknown_name() -> String {
    "Unknown".to_string()
}

fn unknown_ingredients() -> String {
    UNKNOWN_INGREDIENTS.to_string()
}

/// Empty, unparseable and non-finite (`NaN`, `inf`) cells all load as `None`.
fn finite_option<'de, D>(de: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(csv::invalid_option(de)?.filter(|v: &f64| v.is_finite()))
}

/// One cleaned product row.
///
/// Numeric cells that are empty or unparseable load as `None` rather than
/// failing the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_name", alias = "name", default = "unknown_name")]
    pub name: String,
    #[serde(default = "unknown_ingredients")]
    pub ingredients: String,
    #[serde(default, deserialize_with = "finite_option")]
    pub energy_kcal: Option<f64>,
    #[serde(default, deserialize_with = "finite_option")]
    pub protein_100g: Option<f64>,
    #[serde(default, deserialize_with = "finite_option")]
    pub fat_100g: Option<f64>,
    #[serde(default, deserialize_with = "finite_option")]
    pub carbohydrates_100g: Option<f64>,
    #[serde(default)]
    pub allergens: Option<String>,
    #[serde(default, deserialize_with = "finite_option")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "finite_option")]
    pub rating: Option<f64>,
}

impl Product {
    /// A product with only a name; every other field at its absent value.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients: unknown_ingredients(),
            energy_kcal: None,
            protein_100g: None,
            fat_100g: None,
            carbohydrates_100g: None,
            allergens: Some(NO_ALLERGENS.to_string()),
            price: None,
            rating: None,
        }
    }
}

// =============================================================================
// Product Table
// =============================================================================

/// All cleaned products of one category, read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTable {
    category: Category,
    products: Vec<Product>,
}

impl ProductTable {
    pub fn new(category: Category, products: Vec<Product>) -> Self {
        Self { category, products }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn from_csv_reader<R: Read>(category: Category, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let products = csv_reader
            .deserialize::<Product>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self::new(category, products))
    }

    pub fn load_csv(category: Category, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            NutriQueryError::Data(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let table = Self::from_csv_reader(category, file).map_err(|e| {
            NutriQueryError::Data(format!("Failed to read {}: {}", path.display(), e))
        })?;
        info!(category = %category, rows = table.len(), "Loaded product table");
        Ok(table)
    }
}

/// Serialize products as a cleaned CSV with a header row.
pub fn write_products_csv<W: Write>(writer: W, products: &[Product]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for product in products {
        csv_writer.serialize(product)?;
    }
    csv_writer.flush()?;
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

/// Per-session mapping of category to its loaded table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<Category, ProductTable>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: impl IntoIterator<Item = ProductTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.category(), t)).collect(),
        }
    }

    /// Load every category's cleaned CSV from `data_dir`.
    ///
    /// Missing files are skipped with a warning; unreadable ones are errors.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut catalog = Self::new();
        for category in Category::ALL {
            let path = data_dir.join(category.cleaned_file_name());
            if !path.exists() {
                warn!(category = %category, path = %path.display(), "Cleaned data file missing, skipping");
                continue;
            }
            catalog.insert(ProductTable::load_csv(category, &path)?);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, table: ProductTable) {
        self.tables.insert(table.category(), table);
    }

    pub fn get(&self, category: Category) -> Result<&ProductTable> {
        self.tables
            .get(&category)
            .ok_or_else(|| NutriQueryError::CategoryNotFound(category.label().to_string()))
    }

    pub fn categories(&self) -> Vec<Category> {
        self.tables.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
