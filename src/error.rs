use thiserror::Error;

/// Errors raised by the library layer
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Record not found: {0}")]
    UnknownRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type BudgetResult<T> = Result<T, BudgetError>;
