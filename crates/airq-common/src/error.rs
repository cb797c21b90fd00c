use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirqError {
    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("Page already registered: {0}")]
    DuplicatePage(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Insufficient selection: need at least {needed}, got {got}")]
    InsufficientSelection { needed: usize, got: usize },

    #[error("Unknown AQI category code: {0}")]
    UnknownCategory(i64),

    #[error("Model expects feature '{0}' which the input record does not provide")]
    MissingFeature(String),

    #[error("Invalid reading for {field}: {reason}")]
    InvalidReading { field: String, reason: String },

    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Data frame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AirqError {
    /// True for errors that a view renders in place as a warning or fallback.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            AirqError::MissingColumn(_) | AirqError::InsufficientSelection { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AirqError>;
