use thiserror::Error;

#[derive(Error, Debug)]
pub enum NutriQueryError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A known category with no loaded table in this session.
    #[error("Category '{0}' not found.")]
    CategoryNotFound(String),

    /// Input that names no category at all.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for NutriQueryError {
    fn from(e: csv::Error) -> Self {
        NutriQueryError::Data(e.to_string())
    }
}

impl From<serde_json::Error> for NutriQueryError {
    fn from(e: serde_json::Error) -> Self {
        NutriQueryError::Data(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NutriQueryError>;
