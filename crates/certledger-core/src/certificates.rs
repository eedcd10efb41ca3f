//! Certificate lifecycle on top of the ledger.
//!
//! `CertificateService` plays the role of the application's certificate API:
//! it validates input, enforces ownership on reads, and creates every
//! certificate together with its ledger entry in one atomic store call, so
//! no certificate ever exists without a link in the chain.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use certledger_contracts::{
    certificate::{Certificate, CertificateFields, CertificateId, UserId},
    error::{LedgerError, LedgerResult},
    ledger::LedgerEntry,
};

use crate::{
    chain::verify_record,
    hasher::{capture_timestamp, digest_fields},
    service::LedgerService,
    traits::CertificateStore,
};

/// A newly created certificate and the ledger entry committing to it.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub entry: LedgerEntry,
}

pub struct CertificateService<S: ?Sized> {
    store: Arc<S>,
    ledger: LedgerService<S>,
}

impl<S: CertificateStore + ?Sized> CertificateService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let ledger = LedgerService::new(Arc::clone(&store));
        Self { store, ledger }
    }

    /// The ledger service sharing this service's store.
    pub fn ledger(&self) -> &LedgerService<S> {
        &self.ledger
    }

    /// Create a certificate for `owner` and record it in the ledger.
    ///
    /// `holder_name` must not be blank.  Certificate insert and ledger append
    /// commit together; on any failure nothing is persisted.
    pub fn issue(&self, owner: UserId, fields: CertificateFields) -> LedgerResult<IssuedCertificate> {
        if fields.holder_name.trim().is_empty() {
            warn!(user_id = %owner, "rejected certificate without holder_name");
            return Err(LedgerError::InvalidInput {
                reason: "holder_name required".to_string(),
            });
        }

        let timestamp = capture_timestamp();
        let record_hash = digest_fields(&fields, timestamp);

        let (certificate, entry) =
            self.store
                .create_with_entry(owner, &fields, &record_hash, timestamp)?;

        info!(
            certificate_id = %certificate.id,
            user_id = %owner,
            entry_id = %entry.id,
            record_hash = %record_hash,
            "certificate issued"
        );

        Ok(IssuedCertificate { certificate, entry })
    }

    /// Fetch a certificate owned by `owner`.
    ///
    /// A certificate owned by someone else is reported as `NotFound`, the
    /// same as a missing one.
    pub fn get(&self, owner: UserId, certificate_id: CertificateId) -> LedgerResult<Certificate> {
        match self.store.get(certificate_id)? {
            Some(cert) if cert.is_owned_by(owner) => Ok(cert),
            _ => Err(LedgerError::NotFound { certificate_id }),
        }
    }

    pub fn list(&self, owner: UserId) -> LedgerResult<Vec<Certificate>> {
        self.store.list_for_user(owner)
    }

    /// The ledger entries of a certificate owned by `owner`.
    pub fn ledger_for(
        &self,
        owner: UserId,
        certificate_id: CertificateId,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        self.get(owner, certificate_id)?;
        self.ledger.get_chain(certificate_id)
    }

    /// Mark a certificate verified.  Ownership is not checked.
    pub fn verify(&self, certificate_id: CertificateId) -> LedgerResult<Certificate> {
        let cert = self
            .store
            .mark_verified(certificate_id, capture_timestamp())?
            .ok_or(LedgerError::NotFound { certificate_id })?;

        info!(certificate_id = %certificate_id, "certificate verified");
        Ok(cert)
    }

    /// Recompute every ledger digest of a certificate from its stored fields.
    ///
    /// Returns `false` if any entry no longer matches, which means either the
    /// certificate row or the entry was rewritten after creation.
    pub fn audit_certificate(
        &self,
        owner: UserId,
        certificate_id: CertificateId,
    ) -> LedgerResult<bool> {
        let cert = self.get(owner, certificate_id)?;
        let fields = cert.fields();
        let entries = self.ledger.get_chain(certificate_id)?;

        let intact = entries.iter().all(|e| verify_record(e, &fields));
        if !intact {
            warn!(certificate_id = %certificate_id, "certificate digest mismatch");
        }
        Ok(intact)
    }
}
