use thiserror::Error;

#[derive(Error, Debug)]
pub enum PennyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No valid data found in the file.")]
    NoValidData,

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Edited view has {edited} rows but the debit view has {expected}")]
    EditShapeMismatch { expected: usize, edited: usize },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PennyError>;
