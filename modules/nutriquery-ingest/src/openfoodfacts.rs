use std::path::Path;

use nutriquery_common::{Category, NutriQueryError, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

const BASE_URL: &str = "https://world.openfoodfacts.org";
const USER_AGENT: &str = concat!("nutriquery/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Value>,
}

/// Thin client for the Open Food Facts search endpoint.
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NutriQueryError::Ingest(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch one page of raw products for `category`.
    ///
    /// A non-success status is logged and yields an empty page.
    pub async fn fetch_category(
        &self,
        category: Category,
        page_size: u32,
        page: u32,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_size = page_size.to_string();
        let page = page.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", category.search_term()),
                ("page_size", page_size.as_str()),
                ("page", page.as_str()),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(|e| NutriQueryError::Ingest(format!("Request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(
                category = %category,
                status = status.as_u16(),
                "Failed to fetch category data"
            );
            return Ok(Vec::new());
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| NutriQueryError::Ingest(format!("Invalid search response: {}", e)))?;
        Ok(body.products)
    }
}

/// Write raw products as pretty JSON, keeping non-ASCII text as-is.
pub fn save_raw(products: &[Value], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(products)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Fetch the first page of every category into `<slug>_data.json` under `out_dir`.
///
/// Categories with no products write no file.
pub async fn fetch_all(
    client: &OpenFoodFactsClient,
    categories: &[Category],
    out_dir: &Path,
    page_size: u32,
    page: u32,
) -> Result<Vec<(Category, usize)>> {
    std::fs::create_dir_all(out_dir)?;
    let mut fetched = Vec::with_capacity(categories.len());

    for &category in categories {
        info!(category = %category, search = category.search_term(), "Fetching category");
        let products = client.fetch_category(category, page_size, page).await?;
        info!(category = %category, count = products.len(), "Fetched products");

        if products.is_empty() {
            warn!(category = %category, "No products found");
        } else {
            let path = out_dir.join(category.raw_file_name());
            save_raw(&products, &path)?;
            info!(path = %path.display(), "Raw data saved");
        }
        fetched.push((category, products.len()));
    }

    Ok(fetched)
}
