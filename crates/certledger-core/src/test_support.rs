//! Minimal `Vec`-backed store for exercising the services in unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use certledger_contracts::{
    certificate::{Certificate, CertificateFields, CertificateId, UserId},
    error::{LedgerError, LedgerResult},
    ledger::{EntryId, LedgerEntry},
};

use crate::traits::{CertificateStore, LedgerStore};

#[derive(Default)]
pub(crate) struct VecStore {
    pub(crate) entries: Mutex<Vec<LedgerEntry>>,
    pub(crate) certificates: Mutex<Vec<Certificate>>,
    pub(crate) fail_appends: Mutex<bool>,
}

impl VecStore {
    fn push_entry(
        &self,
        entries: &mut Vec<LedgerEntry>,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<LedgerEntry> {
        if *self.fail_appends.lock().unwrap() {
            return Err(LedgerError::store_io("injected append failure"));
        }
        let entry = LedgerEntry {
            id: EntryId(entries.len() as i64 + 1),
            certificate_id,
            record_hash: record_hash.to_string(),
            prev_hash: entries.last().map(|e| e.record_hash.clone()),
            timestamp,
        };
        entries.push(entry.clone());
        Ok(entry)
    }
}

impl LedgerStore for VecStore {
    fn append_at(
        &self,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<LedgerEntry> {
        let mut entries = self.entries.lock().unwrap();
        self.push_entry(&mut entries, certificate_id, record_hash, timestamp)
    }

    fn list_by_certificate(&self, certificate_id: CertificateId) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.certificate_id == certificate_id)
            .cloned()
            .collect())
    }

    fn tail(&self) -> LedgerResult<Option<LedgerEntry>> {
        Ok(self.entries.lock().unwrap().last().cloned())
    }

    fn list_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    fn count(&self) -> LedgerResult<u64> {
        Ok(self.entries.lock().unwrap().len() as u64)
    }
}

impl CertificateStore for VecStore {
    fn create_with_entry(
        &self,
        owner: UserId,
        fields: &CertificateFields,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<(Certificate, LedgerEntry)> {
        let mut certificates = self.certificates.lock().unwrap();
        let mut entries = self.entries.lock().unwrap();

        let certificate = Certificate {
            id: CertificateId(certificates.len() as i64 + 1),
            user_id: owner,
            holder_name: fields.holder_name.clone(),
            issuer: fields.issuer.clone(),
            cert_date: fields.cert_date.clone(),
            cert_hash: record_hash.to_string(),
            verified: false,
            verified_at: None,
            created_at: timestamp,
        };
        let entry = self.push_entry(&mut entries, certificate.id, record_hash, timestamp)?;
        certificates.push(certificate.clone());

        Ok((certificate, entry))
    }

    fn get(&self, certificate_id: CertificateId) -> LedgerResult<Option<Certificate>> {
        let certificates = self.certificates.lock().unwrap();
        Ok(certificates.iter().find(|c| c.id == certificate_id).cloned())
    }

    fn list_for_user(&self, owner: UserId) -> LedgerResult<Vec<Certificate>> {
        let certificates = self.certificates.lock().unwrap();
        Ok(certificates
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
        let mut certificates = self.certificates.lock().unwrap();
        Ok(certificates
            .iter_mut()
            .find(|c| c.id == certificate_id)
            .map(|c| {
                if !c.verified {
                    c.verified = true;
                    c.verified_at = Some(at);
                }
                c.clone()
            }))
    }
}
