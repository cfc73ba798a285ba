pub mod normalize;
pub mod openfoodfacts;

pub use normalize::{normalize_all, normalize_file, normalize_product, normalize_products};
pub use openfoodfacts::{fetch_all, save_raw, OpenFoodFactsClient, DEFAULT_PAGE_SIZE};
