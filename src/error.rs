//! Error types for lazyslot
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in lazyslot
#[derive(Debug, Error)]
pub enum LazySlotError {
    /// Zone thresholds that cannot describe a zone (negative, NaN, infinite)
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Scheduler constructed outside a tokio runtime
    #[error("No tokio runtime: {0}")]
    NoRuntime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for lazyslot operations
pub type Result<T> = std::result::Result<T, LazySlotError>;
