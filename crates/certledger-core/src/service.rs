//! The ledger service: the only write path into the global chain.
//!
//!   fields → capture timestamp → digest → store.append_at → entry
//!
//! The service is ownership-agnostic.  Callers (the certificate service, or
//! an API layer) check that the user owns the certificate first.

use std::sync::Arc;

use tracing::{debug, info, warn};

use certledger_contracts::{
    certificate::{CertificateFields, CertificateId},
    error::LedgerResult,
    ledger::LedgerEntry,
};

use crate::{
    chain::{audit_chain, ChainReport},
    hasher::{capture_timestamp, digest_fields},
    traits::LedgerStore,
};

/// Appends and reads ledger entries over any `LedgerStore`.
pub struct LedgerService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore + ?Sized> LedgerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Hash `fields` and append the digest for `certificate_id`.
    ///
    /// The store serializes concurrent calls.  A failure is returned as-is and
    /// never retried, since a retry after an ambiguous failure could append
    /// the same certificate twice.
    pub fn record_certificate(
        &self,
        certificate_id: CertificateId,
        fields: &CertificateFields,
    ) -> LedgerResult<LedgerEntry> {
        let timestamp = capture_timestamp();
        let record_hash = digest_fields(fields, timestamp);

        let entry = self.store.append_at(certificate_id, &record_hash, timestamp)?;

        info!(
            entry_id = %entry.id,
            certificate_id = %certificate_id,
            record_hash = %entry.record_hash,
            genesis = entry.is_genesis(),
            "ledger entry recorded"
        );

        Ok(entry)
    }

    /// Entries of one certificate, ascending by id.  Empty if none.
    pub fn get_chain(&self, certificate_id: CertificateId) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = self.store.list_by_certificate(certificate_id)?;
        debug!(
            certificate_id = %certificate_id,
            entries = entries.len(),
            "certificate chain read"
        );
        Ok(entries)
    }

    /// The full global chain, ascending by id.
    pub fn global_chain(&self) -> LedgerResult<Vec<LedgerEntry>> {
        self.store.list_all()
    }

    pub fn tail(&self) -> LedgerResult<Option<LedgerEntry>> {
        self.store.tail()
    }

    /// Read the global chain and check its linkage.
    ///
    /// A broken chain is reported in the returned `ChainReport`, not as an
    /// error; only store failures are errors here.
    pub fn audit(&self) -> LedgerResult<ChainReport> {
        let entries = self.store.list_all()?;
        let report = audit_chain(&entries);

        match &report.violation {
            None => info!(
                entries = report.entries,
                terminal_hash = report.terminal_hash.as_deref().unwrap_or("-"),
                "ledger chain intact"
            ),
            Some(v) => warn!(
                entry_id = %v.entry_id,
                position = v.position,
                "ledger chain integrity violation"
            ),
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use certledger_contracts::{
        certificate::{CertificateFields, CertificateId},
        error::LedgerError,
    };

    use crate::{chain::verify_chain, test_support::VecStore};

    use super::LedgerService;

    fn fields(name: &str) -> CertificateFields {
        CertificateFields::new(name).with_issuer("Acme")
    }

    #[test]
    fn first_entry_is_genesis_and_later_entries_link() {
        let service = LedgerService::new(Arc::new(VecStore::default()));

        let a = service.record_certificate(CertificateId(1), &fields("Alice")).unwrap();
        let b = service.record_certificate(CertificateId(2), &fields("Bob")).unwrap();
        let c = service.record_certificate(CertificateId(1), &fields("Alice")).unwrap();

        assert_eq!(a.prev_hash, None);
        assert_eq!(b.prev_hash.as_deref(), Some(a.record_hash.as_str()));
        assert_eq!(c.prev_hash.as_deref(), Some(b.record_hash.as_str()));
        assert!(verify_chain(&service.global_chain().unwrap()));
    }

    #[test]
    fn get_chain_filters_by_certificate() {
        let service = LedgerService::new(Arc::new(VecStore::default()));
        service.record_certificate(CertificateId(1), &fields("Alice")).unwrap();
        service.record_certificate(CertificateId(2), &fields("Bob")).unwrap();
        service.record_certificate(CertificateId(1), &fields("Alice")).unwrap();

        let chain = service.get_chain(CertificateId(1)).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.iter().all(|e| e.certificate_id == CertificateId(1)));
        assert!(chain[0].id < chain[1].id);

        assert!(service.get_chain(CertificateId(99)).unwrap().is_empty());
    }

    #[test]
    fn audit_reports_tampering() {
        let store = Arc::new(VecStore::default());
        let service = LedgerService::new(Arc::clone(&store));
        for name in ["a", "b", "c"] {
            service.record_certificate(CertificateId(1), &fields(name)).unwrap();
        }
        assert!(service.audit().unwrap().is_intact());

        store.entries.lock().unwrap()[1].prev_hash = Some("00".repeat(32));

        let report = service.audit().unwrap();
        assert_eq!(report.violation.map(|v| v.position), Some(1));
    }

    #[test]
    fn store_failure_propagates_unchanged() {
        let store = Arc::new(VecStore::default());
        *store.fail_appends.lock().unwrap() = true;
        let service = LedgerService::new(store);

        match service.record_certificate(CertificateId(1), &fields("Alice")) {
            Err(LedgerError::StoreIo { reason }) => assert!(reason.contains("injected")),
            other => panic!("expected StoreIo, got {:?}", other),
        }
        assert!(service.global_chain().unwrap().is_empty());
    }
}
