use serde::{Deserialize, Serialize};

use crate::error::NutriQueryError;

/// Fixed partition of the product catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HealthyBreakfast,
    ProteinBars,
    ProteinCookies,
    ProteinSnacks,
    ProteinShakes,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::HealthyBreakfast,
        Category::ProteinBars,
        Category::ProteinCookies,
        Category::ProteinSnacks,
        Category::ProteinShakes,
    ];

    /// Human-facing label, e.g. "Protein Bars".
    pub fn label(&self) -> &'static str {
        match self {
            Category::HealthyBreakfast => "Healthy Breakfast",
            Category::ProteinBars => "Protein Bars",
            Category::ProteinCookies => "Protein Cookies",
            Category::ProteinSnacks => "Protein Snacks",
            Category::ProteinShakes => "Protein Shakes",
        }
    }

    /// File-name stem, e.g. "protein_bars".
    pub fn slug(&self) -> &'static str {
        match self {
            Category::HealthyBreakfast => "healthy_breakfast",
            Category::ProteinBars => "protein_bars",
            Category::ProteinCookies => "protein_cookies",
            Category::ProteinSnacks => "protein_snacks",
            Category::ProteinShakes => "protein_shakes",
        }
    }

    /// Search term sent to the upstream catalog.
    pub fn search_term(&self) -> &'static str {
        match self {
            Category::HealthyBreakfast => "breakfast-cereals",
            Category::ProteinBars => "protein-bars",
            Category::ProteinCookies => "protein-cookies",
            Category::ProteinSnacks => "protein-snacks",
            Category::ProteinShakes => "protein-shakes",
        }
    }

    pub fn raw_file_name(&self) -> String {
        format!("{}_data.json", self.slug())
    }

    pub fn cleaned_file_name(&self) -> String {
        format!("{}_cleaned.csv", self.slug())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = NutriQueryError;

    /// Accepts the exact label or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s || c.slug() == s)
            .ok_or_else(|| NutriQueryError::UnknownCategory(s.to_string()))
    }
}
