//! Error types for the venuecal crates.

use thiserror::Error;

/// Errors that can occur in venuecal operations.
///
/// None of these are produced inside the deduplication engine itself:
/// an unparseable record is a per-record rejection there, not an error.
#[derive(Error, Debug)]
pub enum VenuecalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DDTHH:MM:SS")]
    Timestamp(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for venuecal operations.
pub type VenuecalResult<T> = Result<T, VenuecalError>;
