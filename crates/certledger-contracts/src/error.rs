//! Error types for the certledger pipeline.
//!
//! All fallible ledger and certificate operations return `LedgerResult<T>`.
//! Variants carry enough context for the API layer to pick a response.

use thiserror::Error;

use crate::certificate::CertificateId;
use crate::ledger::EntryId;

/// The unified error type for certledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The certificate does not exist, or is not owned by the caller.
    #[error("certificate {certificate_id} not found")]
    NotFound { certificate_id: CertificateId },

    /// The underlying store failed (connection, constraint, disk, lock).
    ///
    /// Always fatal for the enclosing operation and never retried: a retried
    /// append could insert the same record twice.
    #[error("ledger store I/O failed: {reason}")]
    StoreIo { reason: String },

    /// Adjacent entries do not link.
    ///
    /// Only produced by chain audits, never by the append path.
    #[error("chain integrity violation at entry {entry_id}: {reason}")]
    ChainIntegrityViolation { entry_id: EntryId, reason: String },

    /// Caller-supplied data was rejected before touching the store.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl LedgerError {
    /// Shorthand for wrapping any displayable store failure.
    pub fn store_io(reason: impl std::fmt::Display) -> Self {
        Self::StoreIo {
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the certledger crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
