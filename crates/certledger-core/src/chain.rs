//! Chain integrity verification.
//!
//! All functions here are pure: they take entries already read from a store
//! and recompute linkage, so any auditor holding a copy of the global chain
//! can run them without trusting the writer.
//!
//! Linkage rules, checked in id order over the *global* chain:
//!   1. the first entry has no `prev_hash`;
//!   2. every later entry's `prev_hash` equals its predecessor's `record_hash`;
//!   3. ids strictly increase;
//!   4. every `record_hash` is a well-formed 64-char lowercase hex digest.
//!
//! Linkage alone cannot detect a rewrite of the final entry's `record_hash`
//! to another well-formed digest.  `verify_record` closes that gap by
//! recomputing the digest from the certificate's stored fields.

use serde::Serialize;

use certledger_contracts::{
    certificate::CertificateFields,
    error::{LedgerError, LedgerResult},
    ledger::{EntryId, LedgerEntry},
};

use crate::hasher::{digest_fields, is_record_hash};

/// Which linkage rule an entry broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// The first entry carries a `prev_hash`.
    GenesisHasPrev { found: String },
    /// `prev_hash` does not equal the predecessor's `record_hash`.
    PrevHashMismatch {
        expected: String,
        found: Option<String>,
    },
    /// Ids are not strictly ascending.
    OutOfOrder { previous_id: EntryId },
    /// `record_hash` is not a 64-char lowercase hex string.
    MalformedRecordHash { found: String },
}

impl ViolationKind {
    fn describe(&self) -> String {
        match self {
            Self::GenesisHasPrev { found } => {
                format!("first entry links to {found} but should have no predecessor")
            }
            Self::PrevHashMismatch { expected, found } => format!(
                "prev_hash {} does not match predecessor record_hash {expected}",
                found.as_deref().unwrap_or("null")
            ),
            Self::OutOfOrder { previous_id } => {
                format!("id does not follow previous entry {previous_id}")
            }
            Self::MalformedRecordHash { found } => {
                format!("record_hash {found:?} is not a 64-char hex digest")
            }
        }
    }
}

/// The first linkage failure found in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainViolation {
    /// Id of the offending entry.
    pub entry_id: EntryId,
    /// Zero-based index of the offending entry in the audited slice.
    pub position: usize,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

/// Outcome of auditing a whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Number of entries audited.
    pub entries: usize,
    /// `record_hash` of the last entry, `None` for an empty chain.
    ///
    /// A compact commitment to the whole chain that auditors can publish
    /// out of band and compare on the next audit.
    pub terminal_hash: Option<String>,
    /// The first violation, if any.
    pub violation: Option<ChainViolation>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.violation.is_none()
    }

    /// Turn a violation into `LedgerError::ChainIntegrityViolation`.
    pub fn into_result(self) -> LedgerResult<Self> {
        match &self.violation {
            None => Ok(self),
            Some(v) => Err(LedgerError::ChainIntegrityViolation {
                entry_id: v.entry_id,
                reason: v.kind.describe(),
            }),
        }
    }
}

/// Audit `entries`, which must be the full global chain in id order.
///
/// Stops at the first violation.  An empty chain is intact.
pub fn audit_chain(entries: &[LedgerEntry]) -> ChainReport {
    let violation = first_violation(entries);

    ChainReport {
        entries: entries.len(),
        terminal_hash: entries.last().map(|e| e.record_hash.clone()),
        violation,
    }
}

/// Returns `true` when the global chain links correctly.
///
/// `entries` must be the whole store in id order, not one certificate's
/// subset: entries of other certificates sit between a certificate's own
/// entries and carry the links.
pub fn verify_chain(entries: &[LedgerEntry]) -> bool {
    first_violation(entries).is_none()
}

/// Recompute `entry.record_hash` from the certificate's fields.
///
/// Returns `false` when the stored digest does not match the fields and the
/// entry's own timestamp, i.e. either the entry or the certificate record was
/// rewritten after the append.
pub fn verify_record(entry: &LedgerEntry, fields: &CertificateFields) -> bool {
    digest_fields(fields, entry.timestamp) == entry.record_hash
}

fn first_violation(entries: &[LedgerEntry]) -> Option<ChainViolation> {
    let mut previous: Option<&LedgerEntry> = None;

    for (position, entry) in entries.iter().enumerate() {
        let violation = |kind| ChainViolation {
            entry_id: entry.id,
            position,
            kind,
        };

        if !is_record_hash(&entry.record_hash) {
            return Some(violation(ViolationKind::MalformedRecordHash {
                found: entry.record_hash.clone(),
            }));
        }

        match previous {
            None => {
                if let Some(found) = &entry.prev_hash {
                    return Some(violation(ViolationKind::GenesisHasPrev {
                        found: found.clone(),
                    }));
                }
            }
            Some(prev) => {
                if entry.id <= prev.id {
                    return Some(violation(ViolationKind::OutOfOrder {
                        previous_id: prev.id,
                    }));
                }
                if entry.prev_hash.as_deref() != Some(prev.record_hash.as_str()) {
                    return Some(violation(ViolationKind::PrevHashMismatch {
                        expected: prev.record_hash.clone(),
                        found: entry.prev_hash.clone(),
                    }));
                }
            }
        }

        previous = Some(entry);
    }

    None
}
