use thiserror::Error;

use crate::calendar::CalendarError;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("{0}")]
    Credential(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Rejections raised while turning form input into ledger entries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter a description.")]
    MissingDescription,
    #[error("Amount must be a positive number, got {0}.")]
    InvalidAmount(f64),
    #[error("Please select at least one service type.")]
    NoServiceType,
    #[error("Please select a tire detail.")]
    MissingTireDetail,
    #[error("Please select at least one tire.")]
    NoTireSelected,
    #[error("Please enter a service description.")]
    MissingServiceDescription,
    #[error("Cost must be zero or more, got {0}.")]
    InvalidCost(f64),
    #[error("Odometer reading must be zero or more, got {0}.")]
    InvalidOdometer(i64),
    #[error("Month must be between 0 and 11, got {0}.")]
    InvalidMonth(u8),
    #[error("Please fill out all fields.")]
    MissingCredentials,
}
