//! # certledger-store
//!
//! Storage backends for the certledger hash chain.
//!
//! - [`InMemoryStore`]: the reference backend, one `Mutex` over both tables.
//! - [`SqliteStore`]: the durable backend (`rusqlite`), with appends run as
//!   `BEGIN IMMEDIATE` transactions.
//!
//! Both implement [`LedgerStore`](certledger_core::LedgerStore) and
//! [`CertificateStore`](certledger_core::CertificateStore).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use certledger_core::CertificateService;
//! use certledger_store::{SqliteStore, StoreConfig};
//!
//! let config = StoreConfig::from_file(Path::new("certledger.toml"))?;
//! let store = Arc::new(SqliteStore::open(&config.database)?);
//! let certs = CertificateService::new(store);
//! ```

pub mod config;
pub mod memory;
pub mod sqlite;

pub use config::{DatabaseConfig, StoreConfig};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
