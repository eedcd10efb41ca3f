//! # certledger-core
//!
//! Hashing, chain verification, and the services that write and read the
//! certledger hash chain.
//!
//! This crate provides:
//! - `hasher`: the canonical record digest
//! - `chain`: pure linkage verification (`verify_chain`, `audit_chain`)
//! - The storage traits (`LedgerStore`, `CertificateStore`)
//! - `LedgerService` and `CertificateService`, generic over those traits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use certledger_core::{CertificateService, chain::verify_chain};
//!
//! let certs = CertificateService::new(Arc::new(store));
//! let issued = certs.issue(owner, fields)?;
//! assert!(verify_chain(&certs.ledger().global_chain()?));
//! ```

pub mod certificates;
pub mod chain;
pub mod hasher;
pub mod service;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificates::{CertificateService, IssuedCertificate};
pub use chain::{audit_chain, verify_chain, verify_record, ChainReport, ChainViolation};
pub use hasher::{digest, digest_fields, CanonicalRecord};
pub use service::LedgerService;
pub use traits::{CertificateStore, LedgerStore};
