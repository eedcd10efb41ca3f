//! Certificate identity and record types.
//!
//! Certificates are owned by the user who created them and change only once
//! after creation, when they are marked verified.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Store-assigned identifier of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub i64);

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a certificate.
///
/// Issued by the external authentication layer; certledger never creates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canonical, user-supplied fields of a certificate.
///
/// These are the values committed to by the ledger's record hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    pub holder_name: String,
    pub issuer: Option<String>,
    pub cert_date: Option<String>,
}

impl CertificateFields {
    pub fn new(holder_name: impl Into<String>) -> Self {
        Self {
            holder_name: holder_name.into(),
            issuer: None,
            cert_date: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_cert_date(mut self, cert_date: impl Into<String>) -> Self {
        self.cert_date = Some(cert_date.into());
        self
    }
}

/// A persisted certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub user_id: UserId,
    pub holder_name: String,
    pub issuer: Option<String>,
    pub cert_date: Option<String>,

    /// Equal to the `record_hash` of the ledger entry written at creation.
    pub cert_hash: String,

    pub verified: bool,
    #[serde(with = "timestamp::option_millis")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::millis")]
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    /// The canonical fields as they were stored at creation.
    pub fn fields(&self) -> CertificateFields {
        CertificateFields {
            holder_name: self.holder_name.clone(),
            issuer: self.issuer.clone(),
            cert_date: self.cert_date.clone(),
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
