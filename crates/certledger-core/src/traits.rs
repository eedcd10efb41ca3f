//! Storage trait definitions for certledger.
//!
//! - `LedgerStore`: durable, append-only global hash chain
//! - `CertificateStore`: certificate records, created atomically with their
//!   first ledger entry
//!
//! The services in this crate are generic over these traits; backends live
//! in `certledger-store`.

use chrono::{DateTime, Utc};

use certledger_contracts::{
    certificate::{Certificate, CertificateFields, CertificateId, UserId},
    error::LedgerResult,
    ledger::LedgerEntry,
};

use crate::hasher::capture_timestamp;

/// Ordered, append-only persistence of ledger entries.
///
/// Implementations must make `append_at` a single atomic
/// read-tail-then-insert: two concurrent appends may never observe the same
/// tail, or the chain forks.  Reads need no such guarantee and may return a
/// stale tail while an append is in flight; never derive a `prev_hash` from
/// them.
pub trait LedgerStore: Send + Sync {
    /// Link a new entry to the current tail and persist it.
    ///
    /// `prev_hash` is the tail's `record_hash`, or `None` on an empty store.
    /// The store assigns the id.  Failures surface as `StoreIo` and leave no
    /// partial row behind.
    fn append_at(
        &self,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<LedgerEntry>;

    /// `append_at` with the current time.
    fn append(&self, certificate_id: CertificateId, record_hash: &str) -> LedgerResult<LedgerEntry> {
        self.append_at(certificate_id, record_hash, capture_timestamp())
    }

    /// All entries of one certificate in ascending id order.
    ///
    /// An unknown certificate yields an empty vector, not an error.
    fn list_by_certificate(&self, certificate_id: CertificateId) -> LedgerResult<Vec<LedgerEntry>>;

    /// The most recently appended entry across the whole store.
    fn tail(&self) -> LedgerResult<Option<LedgerEntry>>;

    /// The whole global chain in ascending id order.
    fn list_all(&self) -> LedgerResult<Vec<LedgerEntry>>;

    /// Number of entries in the store.
    fn count(&self) -> LedgerResult<u64>;
}

/// Certificate persistence that shares an atomic scope with the ledger.
pub trait CertificateStore: LedgerStore {
    /// Insert a certificate and append its ledger entry as one unit.
    ///
    /// Either both the certificate row and its entry exist afterwards, or
    /// neither does.  The certificate's `cert_hash` is `record_hash`.
    fn create_with_entry(
        &self,
        owner: UserId,
        fields: &CertificateFields,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<(Certificate, LedgerEntry)>;

    fn get(&self, certificate_id: CertificateId) -> LedgerResult<Option<Certificate>>;

    /// Certificates owned by `owner`, ascending by id.
    fn list_for_user(&self, owner: UserId) -> LedgerResult<Vec<Certificate>>;

    /// Flip the verified flag.
    ///
    /// Returns `None` for an unknown certificate.  Verifying twice keeps the
    /// first `verified_at`.
    fn mark_verified(
        &self,
        certificate_id: CertificateId,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<Certificate>>;
}
