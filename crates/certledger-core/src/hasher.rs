//! Content addressing for certificate records.
//!
//! The record hash is SHA-256 over the compact JSON serialization of a
//! `CanonicalRecord`.  Independent verifiers must reproduce the exact bytes,
//! so the layout is fixed:
//!
//!   `{"holder_name":…,"issuer":…,"cert_date":…,"timestamp":…}`
//!
//! - keys always appear, in exactly this order;
//! - a missing `issuer` or `cert_date` is written as `null`;
//! - `timestamp` is UTC ISO-8601 with millisecond precision and a `Z`
//!   suffix, e.g. `2024-01-01T00:00:00.000Z`;
//! - no whitespace between tokens.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use certledger_contracts::{certificate::CertificateFields, timestamp};

/// Length of a hex-encoded record hash.
pub const RECORD_HASH_LEN: usize = 64;

/// The exact value hashed into a ledger entry's `record_hash`.
///
/// Field declaration order is the serialization order; do not reorder.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRecord<'a> {
    pub holder_name: &'a str,
    pub issuer: Option<&'a str>,
    pub cert_date: Option<&'a str>,
    pub timestamp: String,
}

impl<'a> CanonicalRecord<'a> {
    pub fn new(fields: &'a CertificateFields, timestamp: DateTime<Utc>) -> Self {
        Self {
            holder_name: &fields.holder_name,
            issuer: fields.issuer.as_deref(),
            cert_date: fields.cert_date.as_deref(),
            timestamp: format_timestamp(timestamp),
        }
    }
}

/// Capture the current time at the precision the hash commits to.
///
/// Stores round-trip this value exactly, so a digest recomputed later from
/// the persisted timestamp matches the one computed at append time.
pub fn capture_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render a timestamp in the canonical hashed form.
///
/// Identical to the JSON form of `LedgerEntry::timestamp`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    timestamp::format(at)
}

/// Compute the SHA-256 record hash for `record`.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON, which cannot happen for
/// a struct of strings and optional strings.
pub fn digest(record: &CanonicalRecord<'_>) -> String {
    let bytes =
        serde_json::to_vec(record).expect("CanonicalRecord must always be serializable to JSON");

    hex::encode(Sha256::digest(&bytes))
}

/// Hash `fields` as they stood at `timestamp`.
pub fn digest_fields(fields: &CertificateFields, timestamp: DateTime<Utc>) -> String {
    digest(&CanonicalRecord::new(fields, timestamp))
}

/// True if `value` looks like a record hash: 64 lowercase hex characters.
pub fn is_record_hash(value: &str) -> bool {
    value.len() == RECORD_HASH_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
