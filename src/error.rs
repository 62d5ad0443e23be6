use serde_json::Value;
use thiserror::Error;

use crate::Attributes;

#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Update failed: {message}")]
    Update {
        message: String,
        id: Option<Value>,
        attributes: Attributes,
    },
    #[error("Delete failed: {message}")]
    Delete { message: String, id: Option<Value> },
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, StrataError>;

// Helper conversions
impl From<config::ConfigError> for StrataError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
impl<T> From<std::sync::PoisonError<T>> for StrataError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
