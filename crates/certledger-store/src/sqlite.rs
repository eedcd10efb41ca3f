//! `SQLite`-backed ledger and certificate store.
//!
//! One `rusqlite::Connection` sits behind a `Mutex`.  Every write runs in a
//! `BEGIN IMMEDIATE` transaction while the mutex is held: the mutex
//! serializes writers inside this process, and the immediate transaction
//! takes SQLite's reserved lock so a second process cannot interleave a
//! read-tail-then-insert with ours.
//!
//! The tail is always read from the `ledger` table inside the write
//! transaction.  No "last hash" is cached in memory, so restarts and other
//! processes writing the same file cannot make it diverge.
//!
//! Timestamps are stored as text in the canonical hashed form
//! (`2024-01-01T00:00:00.000Z`) so that auditors reading the raw table can
//! recompute record hashes.

// SQLite row ids are i64 and always positive; counts never exceed i64::MAX.
#![allow(clippy::cast_sign_loss)]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{
    params, types::Type, Connection, OpenFlags, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use tracing::{debug, info};

use certledger_contracts::{
    certificate::{Certificate, CertificateFields, CertificateId, UserId},
    error::{LedgerError, LedgerResult},
    ledger::{EntryId, LedgerEntry},
    timestamp,
};
use certledger_core::{
    hasher::format_timestamp,
    traits::{CertificateStore, LedgerStore},
};

use crate::config::DatabaseConfig;

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

const ENTRY_COLUMNS: &str = "id, certificate_id, record_hash, prev_hash, timestamp";

const CERTIFICATE_COLUMNS: &str =
    "id, user_id, holder_name, issuer, cert_date, cert_hash, verified, verified_at, created_at";

/// The durable certledger store.
///
/// Cloning is cheap and shares the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens or creates the database described by `config`.
    ///
    /// The schema is applied on every open; it only creates what is missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreIo` if the file cannot be opened or initialized.
    pub fn open(config: &DatabaseConfig) -> LedgerResult<Self> {
        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            LedgerError::store_io(format!(
                "failed to open database '{}': {}",
                config.path.display(),
                e
            ))
        })?;

        conn.busy_timeout(config.busy_timeout()).map_err(LedgerError::store_io)?;
        if config.wal {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(LedgerError::store_io)?;
            debug!(journal_mode = %mode, "journal mode set");
        }
        Self::initialize_connection(&conn)?;

        info!(path = %config.path.display(), "ledger store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens `path` with default settings.
    pub fn open_path(path: impl AsRef<Path>) -> LedgerResult<Self> {
        Self::open(&DatabaseConfig {
            path: path.as_ref().to_path_buf(),
            ..DatabaseConfig::default()
        })
    }

    /// Creates a private in-memory database, for tests and dry runs.
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory().map_err(LedgerError::store_io)?;
        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize_connection(conn: &Connection) -> LedgerResult<()> {
        conn.execute_batch(SCHEMA_SQL).map_err(|e| {
            LedgerError::store_io(format!("failed to apply schema: {}", e))
        })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::store_io(format!("connection lock poisoned: {}", e)))
    }

    /// Run `f` inside one immediate transaction, committing only if it
    /// succeeds.  Dropping an uncommitted `Transaction` rolls it back.
    fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    ) -> LedgerResult<T> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(LedgerError::store_io)?;

        let value = f(&tx).map_err(LedgerError::store_io)?;
        tx.commit().map_err(LedgerError::store_io)?;
        Ok(value)
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(LedgerError::store_io)?;
        let entries = stmt
            .query_map(params, entry_from_row)
            .map_err(LedgerError::store_io)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::store_io)?;
        Ok(entries)
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    timestamp::parse(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let timestamp: String = row.get(4)?;
    Ok(LedgerEntry {
        id: EntryId(row.get(0)?),
        certificate_id: CertificateId(row.get(1)?),
        record_hash: row.get(2)?,
        prev_hash: row.get(3)?,
        timestamp: parse_timestamp(4, &timestamp)?,
    })
}

fn certificate_from_row(row: &Row<'_>) -> rusqlite::Result<Certificate> {
    let verified_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    Ok(Certificate {
        id: CertificateId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        holder_name: row.get(2)?,
        issuer: row.get(3)?,
        cert_date: row.get(4)?,
        cert_hash: row.get(5)?,
        verified: row.get(6)?,
        verified_at: verified_at
            .map(|t| parse_timestamp(7, &t))
            .transpose()?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

// ── Write critical sections ───────────────────────────────────────────────────

/// Read the tail and insert the linked entry.  Caller owns the transaction.
fn link(
    tx: &Transaction<'_>,
    certificate_id: CertificateId,
    record_hash: &str,
    timestamp: DateTime<Utc>,
) -> rusqlite::Result<LedgerEntry> {
    let prev_hash: Option<String> = tx
        .query_row(
            "SELECT record_hash FROM ledger ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    tx.execute(
        "INSERT INTO ledger (certificate_id, record_hash, prev_hash, timestamp)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            certificate_id.0,
            record_hash,
            prev_hash,
            format_timestamp(timestamp)
        ],
    )?;

    Ok(LedgerEntry {
        id: EntryId(tx.last_insert_rowid()),
        certificate_id,
        record_hash: record_hash.to_string(),
        prev_hash,
        timestamp,
    })
}

fn select_certificate(
    conn: &Connection,
    certificate_id: CertificateId,
) -> rusqlite::Result<Option<Certificate>> {
    conn.query_row(
        &format!("SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = ?1"),
        params![certificate_id.0],
        certificate_from_row,
    )
    .optional()
}

// ── LedgerStore impl ──────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
    fn append_at(
        &self,
        certificate_id: CertificateId,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<LedgerEntry> {
        let entry = self.write(|tx| link(tx, certificate_id, record_hash, timestamp))?;

        debug!(entry_id = %entry.id, certificate_id = %certificate_id, "sqlite append committed");
        Ok(entry)
    }

    fn list_by_certificate(&self, certificate_id: CertificateId) -> LedgerResult<Vec<LedgerEntry>> {
        self.query_entries(
            &format!("SELECT {ENTRY_COLUMNS} FROM ledger WHERE certificate_id = ?1 ORDER BY id ASC"),
            params![certificate_id.0],
        )
    }

    fn tail(&self) -> LedgerResult<Option<LedgerEntry>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM ledger ORDER BY id DESC LIMIT 1"),
            [],
            entry_from_row,
        )
        .optional()
        .map_err(LedgerError::store_io)
    }

    fn list_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        self.query_entries(&format!("SELECT {ENTRY_COLUMNS} FROM ledger ORDER BY id ASC"), [])
    }

    fn count(&self) -> LedgerResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ledger", [], |row| row.get(0))
            .map_err(LedgerError::store_io)?;
        Ok(count as u64)
    }
}

// ── CertificateStore impl ─────────────────────────────────────────────────────

impl CertificateStore for SqliteStore {
    fn create_with_entry(
        &self,
        owner: UserId,
        fields: &CertificateFields,
        record_hash: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<(Certificate, LedgerEntry)> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO certificates (user_id, holder_name, issuer, cert_date, cert_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    owner.0,
                    fields.holder_name,
                    fields.issuer,
                    fields.cert_date,
                    record_hash,
                    format_timestamp(timestamp),
                ],
            )?;

            let certificate = Certificate {
                id: CertificateId(tx.last_insert_rowid()),
                user_id: owner,
                holder_name: fields.holder_name.clone(),
                issuer: fields.issuer.clone(),
                cert_date: fields.cert_date.clone(),
                cert_hash: record_hash.to_string(),
                verified: false,
                verified_at: None,
                created_at: timestamp,
            };
            let entry = link(tx, certificate.id, record_hash, timestamp)?;

            Ok((certificate, entry))
        })
    }

    fn get(&self, certificate_id: CertificateId) -> LedgerResult<Option<Certificate>> {
        let conn = self.lock()?;
        select_certificate(&conn, certificate_id).map_err(LedgerError::store_io)
    }

    fn list_for_user(&self, owner: UserId) -> LedgerResult<Vec<Certificate>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE user_id = ?1 ORDER BY id ASC"
            ))
            .map_err(LedgerError::store_io)?;
        let certificates = stmt
            .query_map(params![owner.0], certificate_from_row)
            .map_err(LedgerError::store_io)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::store_io)?;
        Ok(certificates)
    }

    fn mark_verified(
        &self,
        certificate_id: CertificateId,
        at: DateTime<Utc>,
    ) -> LedgerResult<Option<Certificate>> {
        self.write(|tx| {
            tx.execute(
                "UPDATE certificates SET verified = 1, verified_at = ?2
                 WHERE id = ?1 AND verified = 0",
                params![certificate_id.0, format_timestamp(at)],
            )?;
            select_certificate(tx, certificate_id)
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
