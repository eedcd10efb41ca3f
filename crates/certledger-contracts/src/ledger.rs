//! Ledger entry types.
//!
//! A `LedgerEntry` is one immutable link of the global hash chain.  Its JSON
//! form `{id, certificate_id, record_hash, prev_hash, timestamp}` is the shape
//! the API layer hands to clients.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{certificate::CertificateId, timestamp};

/// Monotonic, store-assigned position of an entry in the global chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in the global SHA-256 hash chain.
///
/// Every entry except the first ever written links to its predecessor in the
/// whole store (not just within the same certificate) through `prev_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,

    /// The certificate this entry commits to.
    pub certificate_id: CertificateId,

    /// Hex SHA-256 of the certificate's canonical fields and `timestamp`.
    pub record_hash: String,

    /// `record_hash` of the immediately preceding entry, `None` for the first.
    pub prev_hash: Option<String>,

    /// Append time.  This is the exact instant hashed into `record_hash`,
    /// and it serializes to the exact hashed text.
    #[serde(with = "timestamp::millis")]
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }
}
