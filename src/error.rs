use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path} has no header row")]
    EmptyInput { path: String },

    #[error("Missing `GovernorateName` and `refArea`: cannot determine geography")]
    MissingGeography,

    #[error("No rows after the chosen filters ({filters})")]
    NoRowsAfterFilters { filters: String },

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),
}
