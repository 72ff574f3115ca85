use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetMonitorError {
    #[error("No column of the dataset could be matched for platform '{platform}' (columns: {columns:?})")]
    SchemaUnresolved {
        platform: String,
        columns: Vec<String>,
    },

    #[error("Column '{column}' is not present in the dataset")]
    ColumnNotFound { column: String },

    #[error("Invalid budget override for {scope}: {value} (must be a finite number >= 0)")]
    InvalidOverride { scope: String, value: f64 },

    #[error("Invalid threshold profile: {0}")]
    InvalidProfile(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BudgetMonitorError>;
