use thiserror::Error;

/// Workbook bookkeeping failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("sheet not found: index {0}")]
    SheetNotFound(usize),

    #[error("a sheet named {0:?} already exists")]
    SheetNameExists(String),

    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("cannot delete the last sheet")]
    CannotDeleteLastSheet,
}

/// Configuration that could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
