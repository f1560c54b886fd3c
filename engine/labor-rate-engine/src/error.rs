//! Error types for the labor rate engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Errors that can occur while configuring or evaluating a pricing matrix
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Duration {hours} is not a valid non-negative number of hours")]
    DegenerateInput { hours: f64 },

    #[error("Store '{store}' is locked")]
    StoreLocked { store: String },

    #[error("Store '{store}' is not registered")]
    UnknownStore { store: String },

    #[error("Store '{store}' is already registered")]
    DuplicateStore { store: String },

    #[error("Amount {value} cannot be represented as money")]
    MoneyOutOfRange { value: f64 },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A pricing configuration that is missing a field or holds a value out of range
/// for its mode and cap type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("endHours ({end_hours}) must be greater than the peak ({peak_hours} hours)")]
    EndBeforePeak { end_hours: f64, peak_hours: f64 },

    #[error("maxEffectiveRate ({max_rate}) must be greater than baseRate ({base_rate})")]
    CeilingBelowBase { max_rate: f64, base_rate: f64 },
}
