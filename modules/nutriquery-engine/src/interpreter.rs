//! Query interpretation: an ordered list of trigger-phrase rules, first match wins.
//!
//! Matching is a case-sensitive substring test against the raw query. Queries
//! are never normalized, so "Highest Protein" does not select the protein rule.

use std::cmp::Ordering;

use nutriquery_common::{Category, Product, ProductTable};
use serde::Serialize;
use tracing::debug;

// =============================================================================
// Result Table
// =============================================================================

/// A source product plus the derived columns a rule may attach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub product: Product,
    /// `protein_100g / price`. Non-finite when price is zero or an operand is
    /// missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_per_price: Option<f64>,
}

impl ResultRow {
    fn plain(product: &Product) -> Self {
        Self {
            product: product.clone(),
            protein_per_price: None,
        }
    }
}

/// Rows derived from one product table by at most one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    category: Category,
    rule: Option<RuleKind>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn category(&self) -> Category {
        self.category
    }

    /// The rule that produced this table, `None` for pass-through.
    pub fn rule(&self) -> Option<RuleKind> {
        self.rule
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.rows.iter().map(|r| &r.product)
    }

    /// Drop derived columns and rebuild a product table from these rows.
    pub fn to_table(&self) -> ProductTable {
        ProductTable::new(self.category, self.products().cloned().collect())
    }
}

// =============================================================================
// Rules
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    ProteinPerPrice,
    HighestProtein,
    LowCalorie,
    UnderTwoDollars,
    FiveStarRating,
    GlutenFree,
}

impl RuleKind {
    /// Filter rules keep rows in source order; the rest sort.
    pub fn is_filter(&self) -> bool {
        matches!(
            self,
            RuleKind::UnderTwoDollars | RuleKind::FiveStarRating | RuleKind::GlutenFree
        )
    }

    /// Upper bound on rows this rule can return.
    pub fn row_cap(&self) -> Option<usize> {
        match self {
            RuleKind::ProteinPerPrice | RuleKind::HighestProtein => Some(3),
            RuleKind::LowCalorie => Some(5),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::ProteinPerPrice => write!(f, "protein_per_price"),
            RuleKind::HighestProtein => write!(f, "highest_protein"),
            RuleKind::LowCalorie => write!(f, "low_calorie"),
            RuleKind::UnderTwoDollars => write!(f, "under_two_dollars"),
            RuleKind::FiveStarRating => write!(f, "five_star_rating"),
            RuleKind::GlutenFree => write!(f, "gluten_free"),
        }
    }
}

/// A rule fires when every trigger phrase occurs in the query.
pub struct Rule {
    pub kind: RuleKind,
    pub triggers: &'static [&'static str],
    transform: fn(&[Product]) -> Vec<ResultRow>,
}

impl Rule {
    pub fn matches(&self, query: &str) -> bool {
        self.triggers.iter().all(|t| query.contains(t))
    }

    pub fn apply(&self, products: &[Product]) -> Vec<ResultRow> {
        (self.transform)(products)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("triggers", &self.triggers)
            .finish()
    }
}

/// Precedence order. Earlier entries shadow later ones.
pub static RULES: [Rule; 6] = [
    Rule {
        kind: RuleKind::ProteinPerPrice,
        triggers: &["highest protein", "price"],
        transform: best_protein_per_price,
    },
    Rule {
        kind: RuleKind::HighestProtein,
        triggers: &["highest protein"],
        transform: highest_protein,
    },
    Rule {
        kind: RuleKind::LowCalorie,
        triggers: &["low calorie"],
        transform: low_calorie,
    },
    Rule {
        kind: RuleKind::UnderTwoDollars,
        triggers: &["under $2"],
        transform: under_two_dollars,
    },
    Rule {
        kind: RuleKind::FiveStarRating,
        triggers: &["5-star rating"],
        transform: five_star_rating,
    },
    Rule {
        kind: RuleKind::GlutenFree,
        triggers: &["gluten-free"],
        transform: gluten_free,
    },
];

/// First rule whose triggers all occur in `query`.
pub fn select_rule(query: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(query))
}

/// Map a query onto a new result table. The source table is never modified.
pub fn interpret(table: &ProductTable, query: &str) -> ResultTable {
    let rule = select_rule(query);
    let rows = match rule {
        Some(rule) => rule.apply(table.products()),
        None => table.products().iter().map(ResultRow::plain).collect(),
    };

    debug!(
        category = %table.category(),
        rule = ?rule.map(|r| r.kind),
        source_rows = table.len(),
        result_rows = rows.len(),
        "Interpreted query"
    );

    ResultTable {
        category: table.category(),
        rule: rule.map(|r| r.kind),
        rows,
    }
}

// =============================================================================
// Transforms
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Ascending,
    Descending,
}

/// Order two numeric keys with missing and non-finite values last in either
/// direction.
fn compare_missing_last(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(x), Some(y)) => match order {
            SortOrder::Ascending => x.total_cmp(&y),
            SortOrder::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort on `key`, then keep the first `limit` rows.
fn top_by(
    mut rows: Vec<ResultRow>,
    key: impl Fn(&ResultRow) -> Option<f64>,
    order: SortOrder,
    limit: usize,
) -> Vec<ResultRow> {
    rows.sort_by(|a, b| compare_missing_last(key(a), key(b), order));
    rows.truncate(limit);
    rows
}

fn filter_rows(products: &[Product], keep: impl Fn(&Product) -> bool) -> Vec<ResultRow> {
    products
        .iter()
        .filter(|p| keep(p))
        .map(ResultRow::plain)
        .collect()
}

fn protein_per_price(product: &Product) -> f64 {
    match (product.protein_100g, product.price) {
        (Some(protein), Some(price)) => protein / price,
        _ => f64::NAN,
    }
}

fn best_protein_per_price(products: &[Product]) -> Vec<ResultRow> {
    let rows = products
        .iter()
        .map(|p| ResultRow {
            product: p.clone(),
            protein_per_price: Some(protein_per_price(p)),
        })
        .collect();
    top_by(rows, |r| r.protein_per_price, SortOrder::Descending, 3)
}

fn highest_protein(products: &[Product]) -> Vec<ResultRow> {
    let rows = products.iter().map(ResultRow::plain).collect();
    top_by(rows, |r| r.product.protein_100g, SortOrder::Descending, 3)
}

fn low_calorie(products: &[Product]) -> Vec<ResultRow> {
    let rows = products.iter().map(ResultRow::plain).collect();
    top_by(rows, |r| r.product.energy_kcal, SortOrder::Ascending, 5)
}

fn under_two_dollars(products: &[Product]) -> Vec<ResultRow> {
    filter_rows(products, |p| p.price.is_some_and(|price| price < 2.0))
}

fn five_star_rating(products: &[Product]) -> Vec<ResultRow> {
    filter_rows(products, |p| p.rating == Some(5.0))
}

fn gluten_free(products: &[Product]) -> Vec<ResultRow> {
    filter_rows(products, |p| {
        p.allergens
            .as_deref()
            .map_or(true, |a| !a.to_lowercase().contains("gluten"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product::named(name)
    }

    fn with_protein_price(name: &str, protein: Option<f64>, price: Option<f64>) -> Product {
        let mut p = product(name);
        p.protein_100g = protein;
        p.price = price;
        p
    }

    fn names(result: &ResultTable) -> Vec<&str> {
        result.products().map(|p| p.name.as_str()).collect()
    }

    fn table(products: Vec<Product>) -> ProductTable {
        ProductTable::new(Category::ProteinBars, products)
    }

    #[test]
    fn test_precedence_order() {
        let kinds: Vec<RuleKind> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::ProteinPerPrice,
                RuleKind::HighestProtein,
                RuleKind::LowCalorie,
                RuleKind::UnderTwoDollars,
                RuleKind::FiveStarRating,
                RuleKind::GlutenFree,
            ]
        );
    }

    #[test]
    fn test_select_rule_first_match_wins() {
        let pick = |q: &str| select_rule(q).map(|r| r.kind);
        assert_eq!(pick("highest protein by price"), Some(RuleKind::ProteinPerPrice));
        assert_eq!(pick("highest protein bars"), Some(RuleKind::HighestProtein));
        assert_eq!(
            pick("low calorie and gluten-free under $2"),
            Some(RuleKind::LowCalorie)
        );
        assert_eq!(pick("gluten-free with 5-star rating"), Some(RuleKind::FiveStarRating));
        assert_eq!(pick("anything gluten-free?"), Some(RuleKind::GlutenFree));
        assert_eq!(pick("price only"), None);
        assert_eq!(pick(""), None);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(select_rule("Highest Protein").is_none());
        assert!(select_rule("GLUTEN-FREE").is_none());
        assert!(select_rule("5-Star Rating").is_none());
    }

    #[test]
    fn test_protein_per_price_non_finite_last() {
        let t = table(vec![
            with_protein_price("free", Some(10.0), Some(0.0)),
            with_protein_price("cheap", Some(10.0), Some(1.0)),
            with_protein_price("no-price", Some(30.0), None),
            with_protein_price("pricey", Some(20.0), Some(4.0)),
        ]);

        let result = interpret(&t, "highest protein per price");
        assert_eq!(result.rule(), Some(RuleKind::ProteinPerPrice));
        assert_eq!(names(&result), vec!["cheap", "pricey", "free"]);
        assert!(result.rows().iter().all(|r| r.protein_per_price.is_some()));
        assert_eq!(result.rows()[0].protein_per_price, Some(10.0));
        assert!(result.rows()[2].protein_per_price.unwrap().is_infinite());
    }

    #[test]
    fn test_protein_per_price_zero_over_zero_sorts_last() {
        let t = table(vec![
            with_protein_price("nan", Some(0.0), Some(0.0)),
            with_protein_price("ok", Some(1.0), Some(10.0)),
        ]);
        let result = interpret(&t, "highest protein price");
        assert_eq!(names(&result), vec!["ok", "nan"]);
        assert!(result.rows()[1].protein_per_price.unwrap().is_nan());
    }

    #[test]
    fn test_source_table_not_mutated() {
        let t = table(vec![
            with_protein_price("a", Some(5.0), Some(1.0)),
            with_protein_price("b", Some(9.0), Some(1.0)),
        ]);
        let before = t.clone();
        let _ = interpret(&t, "highest protein price");
        let _ = interpret(&t, "highest protein");
        assert_eq!(t, before);
    }

    #[test]
    fn test_highest_protein_stable_ties_and_missing_last() {
        let t = table(vec![
            with_protein_price("missing", None, None),
            with_protein_price("tie-1", Some(20.0), None),
            with_protein_price("low", Some(5.0), None),
            with_protein_price("tie-2", Some(20.0), None),
            with_protein_price("top", Some(25.0), None),
        ]);
        let result = interpret(&t, "highest protein");
        assert_eq!(names(&result), vec!["top", "tie-1", "tie-2"]);
    }

    #[test]
    fn test_highest_protein_small_table() {
        let t = table(vec![
            with_protein_price("A", Some(10.0), Some(2.0)),
            with_protein_price("B", Some(20.0), Some(4.0)),
        ]);
        let result = interpret(&t, "highest protein");
        assert_eq!(names(&result), vec!["B", "A"]);
        assert!(result.rows().iter().all(|r| r.protein_per_price.is_none()));
    }

    #[test]
    fn test_low_calorie_top_five_ascending() {
        let kcal = [300.0, 120.0, 500.0, 90.0, 250.0, 410.0, 80.0];
        let mut products: Vec<Product> = kcal
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let mut p = product(&format!("p{i}"));
                p.energy_kcal = Some(*k);
                p
            })
            .collect();
        products.insert(0, product("unknown-kcal"));

        let result = interpret(&table(products), "low calorie snacks");
        assert_eq!(result.len(), 5);
        assert_eq!(names(&result), vec!["p6", "p3", "p1", "p4", "p0"]);
    }

    #[test]
    fn test_under_two_dollars_strict() {
        let t = table(vec![
            with_protein_price("two", None, Some(2.0)),
            with_protein_price("cheap", None, Some(1.99)),
            with_protein_price("none", None, None),
            with_protein_price("free", None, Some(0.0)),
        ]);
        let result = interpret(&t, "snacks under $2");
        assert_eq!(names(&result), vec!["cheap", "free"]);
    }

    #[test]
    fn test_five_star_exact() {
        let ratings = [Some(5.0), Some(4.9), None, Some(5.0)];
        let products = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut p = product(&format!("r{i}"));
                p.rating = *r;
                p
            })
            .collect();
        let result = interpret(&table(products), "with a 5-star rating");
        assert_eq!(names(&result), vec!["r0", "r3"]);
    }

    #[test]
    fn test_gluten_free_case_insensitive_and_missing_included() {
        let allergens = [
            Some("en:gluten,en:milk"),
            Some("Contains GLUTEN"),
            None,
            Some("en:milk"),
            Some("none"),
        ];
        let products = allergens
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let mut p = product(&format!("g{i}"));
                p.allergens = a.map(str::to_string);
                p
            })
            .collect();
        let result = interpret(&table(products), "gluten-free options");
        assert_eq!(names(&result), vec!["g2", "g3", "g4"]);
    }

    #[test]
    fn test_no_trigger_is_identity() {
        let t = table(vec![product("z"), product("a"), product("z")]);
        let result = interpret(&t, "tell me about these");
        assert_eq!(result.rule(), None);
        assert_eq!(names(&result), vec!["z", "a", "z"]);
        assert_eq!(result.to_table(), t);
    }

    #[test]
    fn test_empty_table() {
        let result = interpret(&table(vec![]), "highest protein");
        assert!(result.is_empty());
        assert_eq!(result.rule(), Some(RuleKind::HighestProtein));
    }

    #[test]
    fn test_row_caps() {
        assert_eq!(RuleKind::ProteinPerPrice.row_cap(), Some(3));
        assert_eq!(RuleKind::LowCalorie.row_cap(), Some(5));
        assert_eq!(RuleKind::GlutenFree.row_cap(), None);
        assert!(RuleKind::UnderTwoDollars.is_filter());
        assert!(!RuleKind::HighestProtein.is_filter());
    }

    #[test]
    fn test_protein_per_price_serializes_as_column() {
        let t = table(vec![with_protein_price("A", Some(10.0), Some(2.0))]);
        let result = interpret(&t, "highest protein for the price");
        let json = serde_json::to_value(&result.rows()[0]).unwrap();
        assert_eq!(json["product_name"], "A");
        assert_eq!(json["protein_per_price"], 5.0);

        let plain = interpret(&t, "highest protein");
        let json = serde_json::to_value(&plain.rows()[0]).unwrap();
        assert!(json.get("protein_per_price").is_none());
    }
}
