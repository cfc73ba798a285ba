//! Plain-text rendering of result tables for the terminal.

use console::style;
use nutriquery_common::Category;
use nutriquery_engine::{ResultRow, ResultTable};

const NAME_WIDTH: usize = 32;
const ALLERGEN_WIDTH: usize = 24;

pub fn categories_listing() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("{:<16} {}", c.slug(), c.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn result_table(result: &ResultTable) -> String {
    let with_ratio = result.rows().iter().any(|r| r.protein_per_price.is_some());

    let mut header = format!(
        "{:<name$} {:>8} {:>8} {:>8} {:>6} {:<allergens$}",
        "product_name",
        "protein",
        "price",
        "kcal",
        "rating",
        "allergens",
        name = NAME_WIDTH,
        allergens = ALLERGEN_WIDTH,
    );
    if with_ratio {
        header.push_str(&format!(" {:>10}", "prot/price"));
    }

    let mut lines = vec![style(header.trim_end()).bold().to_string()];
    lines.extend(result.rows().iter().map(|row| row_line(row, with_ratio)));
    lines.join("\n")
}

fn row_line(row: &ResultRow, with_ratio: bool) -> String {
    let p = &row.product;
    let mut line = format!(
        "{:<name$} {:>8} {:>8} {:>8} {:>6} {:<allergens$}",
        clip(&p.name, NAME_WIDTH),
        number(p.protein_100g),
        number(p.price),
        number(p.energy_kcal),
        number(p.rating),
        clip(p.allergens.as_deref().unwrap_or("-"), ALLERGEN_WIDTH),
        name = NAME_WIDTH,
        allergens = ALLERGEN_WIDTH,
    );
    if with_ratio {
        line.push_str(&format!(" {:>10}", number(row.protein_per_price)));
    }
    line.trim_end().to_string()
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}
