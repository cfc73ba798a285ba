pub mod category;
pub mod config;
pub mod error;
pub mod file_config;
pub mod product;

pub use category::Category;
pub use config::AppConfig;
pub use error::{NutriQueryError, Result};
pub use file_config::FileConfig;
pub use product::{
    write_products_csv, Catalog, Product, ProductTable, NO_ALLERGENS, UNKNOWN_INGREDIENTS,
};
