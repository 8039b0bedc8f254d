use thiserror::Error;

/// Top-level error type for groupwarden.
///
/// Per-contact bridge failures are not errors: they are recorded as
/// [`crate::outcome::BridgeOutcome`] values and never leave the batch loop.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration error (bad config file, missing input CSV, invalid batch size).
    #[error("config error: {0}")]
    Config(String),

    /// Error talking to the bridge outside of a per-contact removal.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
