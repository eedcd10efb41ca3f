//! Store configuration loaded from TOML.
//!
//! Example:
//! ```toml
//! [database]
//! path = "certificates.db"
//! busy_timeout_ms = 10000
//! wal = true
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use certledger_contracts::error::{LedgerError, LedgerResult};

/// SQLite connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file.  Created on first open.
    pub path: PathBuf,

    /// How long a writer waits on a lock held by another connection before
    /// failing with `SQLITE_BUSY`.
    pub busy_timeout_ms: u64,

    /// Use write-ahead logging so readers do not block the writer.
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("certificates.db"),
            busy_timeout_ms: 10_000,
            wal: true,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
}

impl StoreConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `LedgerError::ConfigError` if the TOML is malformed or has
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: StoreConfig = toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse store config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> LedgerResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(LedgerError::ConfigError {
                reason: "database.path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(10));
        assert!(config.database.wal);
    }

    #[test]
    fn example_config_matches_defaults() {
        let example = include_str!("../../../certledger.example.toml");
        assert_eq!(StoreConfig::from_toml_str(example).unwrap(), StoreConfig::default());
    }

    #[test]
    fn partial_database_table_keeps_other_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            [database]
            path = "/var/lib/certledger/ledger.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/var/lib/certledger/ledger.db"));
        assert_eq!(config.database.busy_timeout_ms, 10_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = StoreConfig::from_toml_str(
            r#"
            [database]
            pth = "typo.db"
            "#,
        )
        .unwrap_err();

        match err {
            LedgerError::ConfigError { reason } => assert!(reason.contains("pth"), "got: {reason}"),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = StoreConfig::from_toml_str("[database]\npath = \"\"\n").unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError { .. }));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nbusy_timeout_ms = 250\nwal = false").unwrap();

        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert!(!config.database.wal);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = StoreConfig::from_file(Path::new("/nonexistent/certledger.toml")).unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError { .. }));
    }
}
