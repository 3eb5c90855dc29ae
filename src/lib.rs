// vecto-ingest — lib.rs
// Public API, error types, ingestion options, re-exports.
// Author: d65v <https://github.com/d65v>

pub mod batch;
pub mod client;
pub mod dataset;
pub mod ingest;
pub mod item;
pub mod toolbelt;

use thiserror::Error;

pub use crate::batch::{partition, partition_with_attributes, Batch, BatchEntry, DEFAULT_BATCH_SIZE};
pub use crate::client::{VectoClient, VectoConfig};
pub use crate::ingest::{
    BatchUploadResult, CancelToken, FailurePolicy, IngestOutcome, IngestionReport, Ingestor,
    LogProgress, NoProgress, ProgressObserver, Reset, Termination, Transport,
};
pub use crate::item::{Attribute, Item, Modality, Payload};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure of a single call to the vector-search service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Payload error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum VectoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Length mismatch: {items} items but {attributes} attributes")]
    LengthMismatch { items: usize, attributes: usize },

    #[error("Modality mismatch at item {index}: expected {expected}, got {got}")]
    ModalityMismatch {
        index: usize,
        expected: Modality,
        got: Modality,
    },

    #[error("Reset of existing entries failed: {0}")]
    ResetFailed(#[source] TransportError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, VectoError>;

// ── Config ────────────────────────────────────────────────────────────────────

/// Options for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Items per upload call
    pub batch_size: usize,
    /// Delete every existing entry in the vector space before the first batch
    pub delete_existing: bool,
    /// Turn the whole run into a no-op
    pub skip_ingestion: bool,
    /// Behaviour after a failed batch
    pub failure_policy: FailurePolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delete_existing: true,
            skip_ingestion: false,
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl IngestOptions {
    /// Load options from environment variables, falling back to defaults.
    ///
    /// # Errors
    /// Returns `VectoError::ConfigError` if `VECTO_BATCH_SIZE` is not a
    /// positive integer or a flag is not a recognised boolean.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let batch_size = match std::env::var("VECTO_BATCH_SIZE") {
            Ok(v) => parse_batch_size(&v)?,
            Err(_) => defaults.batch_size,
        };

        let delete_existing = env_flag("VECTO_DELETE_EXISTING")?.unwrap_or(defaults.delete_existing);
        let skip_ingestion = env_flag("VECTO_SKIP_INGESTION")?.unwrap_or(defaults.skip_ingestion);
        let failure_policy = match env_flag("VECTO_FAIL_FAST")? {
            Some(true) => FailurePolicy::FailFast,
            _ => FailurePolicy::Continue,
        };

        let options = Self {
            batch_size,
            delete_existing,
            skip_ingestion,
            failure_policy,
        };
        options.validate()?;
        Ok(options)
    }

    /// # Errors
    /// Returns `VectoError::ConfigError` if `batch_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 1 {
            return Err(VectoError::ConfigError(format!(
                "batch_size must be at least 1, got {}",
                self.batch_size
            )));
        }
        Ok(())
    }
}

/// Parse a batch size, rejecting zero and negative values.
pub fn parse_batch_size(raw: &str) -> Result<usize> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| VectoError::ConfigError(format!("batch_size '{}' is not an integer", raw)))?;
    if n < 1 {
        return Err(VectoError::ConfigError(format!(
            "batch_size must be at least 1, got {}",
            n
        )));
    }
    usize::try_from(n).map_err(|_| VectoError::ConfigError(format!("batch_size {} is too large", n)))
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    match std::env::var(name) {
        Ok(v) => parse_flag(&v)
            .map(Some)
            .ok_or_else(|| VectoError::ConfigError(format!("{}='{}' is not a boolean", name, v))),
        Err(_) => Ok(None),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
