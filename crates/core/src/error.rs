use thiserror::Error;

pub type AttributionResult<T> = Result<T, AttributionError>;

#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown funnel stage: {0}")]
    UnknownStage(String),

    #[error("Unknown export format: {0}")]
    UnknownExportFormat(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column is not sortable: {0}")]
    NotSortable(String),

    #[error("Row index {index} out of range for dataset of {len} items")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AttributionError {
    fn from(err: config::ConfigError) -> Self {
        AttributionError::Config(err.to_string())
    }
}
