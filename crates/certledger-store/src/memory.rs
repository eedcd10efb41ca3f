//! In-memory implementation of `LedgerStore` and `CertificateStore`.
//!
//! `InMemoryStore` is the reference backend.  Both tables live in one
//! `InMemoryState` behind a single `Mutex`, so every append, and every
//! certificate-plus-entry creation, is atomic with respect to the others.
//!
//! Nothing survives the process.  Use `SqliteStore` for durability.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use certledger_contracts::{
    certificate::{Certificate, CertificateFields, CertificateId, UserId},
    error::{LedgerError, LedgerResult},
    ledger::{EntryId, LedgerEntry},
};
use certledger_core::traits::{CertificateStore, LedgerStore};

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryState {
    /// Ledger entries in append order; `entries[i].id == i + 1`.
    pub(crate) entries: Vec<LedgerEntry>,

    /// Certificates in creation order; `certificates[i].id == i + 1`.
    pub(crate) certificates: Vec<Certificate>,
}

impl InMemoryState {
    /// The append critical section.  Caller holds the lock.
    fn link(
        &mut self,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerEntry {
        let entry = LedgerEntry {
            id: EntryId(self.entries.len() as i64 + 1),
            certificate_id,
            record_hash: record_hash.to_string(),
            prev_hash: self.entries.last().map(|tail| tail.record_hash.clone()),
            timestamp,
        };
        self.entries.push(entry.clone());
        entry
    }

    fn certificate(&self, id: CertificateId) -> Option<&Certificate> {
        self.certificates.get(certificate_index(id)?)
    }

    fn certificate_mut(&mut self, id: CertificateId) -> Option<&mut Certificate> {
        self.certificates.get_mut(certificate_index(id)?)
    }
}

/// Ids start at 1; zero and negative ids have no slot.
fn certificate_index(id: CertificateId) -> Option<usize> {
    usize::try_from(id.0).ok()?.checked_sub(1)
}

// ── Public store ──────────────────────────────────────────────────────────────

/// A process-local ledger and certificate store.
///
/// # Thread safety
///
/// All operations take the same `Mutex`; share the store with `Arc`.
#[derive(Default)]
pub struct InMemoryStore {
    pub(crate) state: Mutex<InMemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|e| LedgerError::store_io(format!("in-memory store lock poisoned: {}", e)))
    }
}

// ── LedgerStore impl ──────────────────────────────────────────────────────────

impl LedgerStore for InMemoryStore {
    fn append_at(
        &self,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<LedgerEntry> {
        let mut state = self.lock()?;
        let entry = state.link(certificate_id, record_hash, timestamp);

        debug!(entry_id = %entry.id, certificate_id = %certificate_id, "in-memory append");
        Ok(entry)
    }

    fn list_by_certificate(&self, certificate_id: CertificateId) -> LedgerResult<Vec<LedgerEntry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.certificate_id == certificate_id)
            .cloned()
            .collect())
    }

    fn tail(&self) -> LedgerResult<Option<LedgerEntry>> {
        Ok(self.lock()?.entries.last().cloned())
    }

    fn list_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    fn count(&self) -> LedgerResult<u64> {
        Ok(self.lock()?.entries.len() as u64)
    }
}

// ── CertificateStore impl ─────────────────────────────────────────────────────

impl CertificateStore for InMemoryStore {
    fn create_with_entry(
        &self,
        owner: UserId,
        fields: &CertificateFields,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<(Certificate, LedgerEntry)> {
        let mut state = self.lock()?;

        let certificate = Certificate {
            id: CertificateId(state.certificates.len() as i64 + 1),
            user_id: owner,
            holder_name: fields.holder_name.clone(),
            issuer: fields.issuer.clone(),
            cert_date: fields.cert_date.clone(),
            cert_hash: record_hash.to_string(),
            verified: false,
            verified_at: None,
            created_at: timestamp,
        };
        state.certificates.push(certificate.clone());
        let entry = state.link(certificate.id, record_hash, timestamp);

        Ok((certificate, entry))
    }

    fn get(&self, certificate_id: CertificateId) -> LedgerResult<Option<Certificate>> {
        Ok(self.lock()?.certificate(certificate_id).cloned())
    }

    fn list_for_user(&self, owner: UserId) -> LedgerResult<Vec<Certificate>> {
        let state = self.lock()?;
        Ok(state
            .certificates
            .iter()
            .filter(|c| c.is_owned_by(owner))
            .cloned()
            .collect())
    }

    fn mark_verified(
        &self,
        certificate_id: CertificateId,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<Certificate>> {
        let mut state = self.lock()?;
        Ok(state.certificate_mut(certificate_id).map(|cert| {
            if !cert.verified {
                cert.verified = true;
                cert.verified_at = Some(at);
            }
            cert.clone()
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
