//! Plain-text dataset overview: nutrient ranges and allergen frequencies.

use std::collections::BTreeMap;

use nutriquery_common::{Product, NO_ALLERGENS};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl Stats {
    /// `None` when no finite values are present.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        (count > 0).then(|| Stats {
            count,
            min,
            mean: sum / count as f64,
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    /// (column, stats) in fixed column order.
    pub columns: Vec<(&'static str, Option<Stats>)>,
    /// Allergen tag → number of products declaring it, most frequent first.
    pub allergens: Vec<(String, usize)>,
}

type Column = (&'static str, fn(&Product) -> Option<f64>);

const COLUMNS: [Column; 5] = [
    ("protein_100g", |p| p.protein_100g),
    ("fat_100g", |p| p.fat_100g),
    ("carbohydrates_100g", |p| p.carbohydrates_100g),
    ("energy_kcal", |p| p.energy_kcal),
    ("price", |p| p.price),
];

pub fn summarize<'a>(products: impl IntoIterator<Item = &'a Product>) -> DatasetSummary {
    let products: Vec<&Product> = products.into_iter().collect();

    let columns = COLUMNS
        .iter()
        .map(|(name, get)| (*name, Stats::from_values(products.iter().filter_map(|p| get(p)))))
        .collect();

    DatasetSummary {
        rows: products.len(),
        columns,
        allergens: allergen_frequency(&products),
    }
}

/// Split comma-separated declarations; the "none" sentinel and blanks are skipped.
fn allergen_frequency(products: &[&Product]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for product in products {
        let Some(allergens) = product.allergens.as_deref() else {
            continue;
        };
        for tag in allergens.split(',').map(str::trim) {
            if tag.is_empty() || tag.eq_ignore_ascii_case(NO_ALLERGENS) {
                continue;
            }
            *counts.entry(tag.to_string()).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Products: {}", self.rows)?;
        for (name, stats) in &self.columns {
            match stats {
                Some(s) => writeln!(
                    f,
                    "  {:<20} n={:<4} min={:<8.2} mean={:<8.2} max={:.2}",
                    name, s.count, s.min, s.mean, s.max
                )?,
                None => writeln!(f, "  {:<20} no data", name)?,
            }
        }
        if self.allergens.is_empty() {
            writeln!(f, "Allergens: none declared")?;
        } else {
            writeln!(f, "Allergens:")?;
            for (tag, count) in &self.allergens {
                writeln!(f, "  {:<20} {}", tag, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(protein: Option<f64>, allergens: Option<&str>) -> Product {
        let mut p = Product::named("p");
        p.protein_100g = protein;
        p.allergens = allergens.map(str::to_string);
        p
    }

    #[test]
    fn test_stats_skip_missing_and_non_finite() {
        let stats = Stats::from_values([1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, 2.0);
        assert!(Stats::from_values([]).is_none());
    }

    #[test]
    fn test_summarize_columns() {
        let products = [product(Some(10.0), None), product(None, None), product(Some(20.0), None)];
        let summary = summarize(&products);
        assert_eq!(summary.rows, 3);
        let (name, protein) = summary.columns[0];
        assert_eq!(name, "protein_100g");
        assert_eq!(protein.unwrap().mean, 15.0);
        assert!(summary.columns[1].1.is_none());
    }

    #[test]
    fn test_allergen_frequency_excludes_none() {
        let products = [
            product(None, Some("en:milk,en:gluten")),
            product(None, Some("en:milk")),
            product(None, Some("none")),
            product(None, Some("None")),
            product(None, Some("")),
            product(None, None),
        ];
        let summary = summarize(&products);
        assert_eq!(
            summary.allergens,
            vec![("en:milk".to_string(), 2), ("en:gluten".to_string(), 1)]
        );
    }

    #[test]
    fn test_display_mentions_columns() {
        let summary = summarize(&[product(Some(12.5), Some("en:soybeans"))]);
        let text = summary.to_string();
        assert!(text.contains("Products: 1"));
        assert!(text.contains("protein_100g"));
        assert!(text.contains("en:soybeans"));
        assert!(text.contains("fat_100g             no data"));
    }
}
