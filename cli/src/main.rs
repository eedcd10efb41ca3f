//! certledger: command-line front end for the certificate ledger.
//!
//! Every command prints one JSON document to stdout in the API response
//! shape (`{"success": true, ...}` or `{"success": false, "error": ...}`).
//!
//! Exit codes:
//!   0  success
//!   1  store, configuration, or input error
//!   2  `verify` found a chain integrity violation
//!   3  certificate not found (or not owned by `--user`)
//!
//! Usage:
//!   certledger issue --user 1 --holder "Alice" --issuer Acme --date 2024-01-01
//!   certledger chain --user 1 3
//!   certledger verify

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use certledger_contracts::{
    certificate::{CertificateFields, CertificateId, UserId},
    error::{LedgerError, LedgerResult},
};
use certledger_core::CertificateService;
use certledger_store::{SqliteStore, StoreConfig};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tamper-evident certificate ledger.
#[derive(Parser)]
#[command(
    name = "certledger",
    about = "Tamper-evident, hash-chained certificate ledger",
    long_about = "Issues certificate records into a single global SHA-256 hash chain,\n\
                  reads per-certificate history, and audits the chain for tampering."
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "CERTLEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Database file; overrides `database.path` from the configuration.
    #[arg(long, global = true, env = "CERTLEDGER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a certificate and append its ledger entry.
    Issue {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        holder: String,
        #[arg(long)]
        issuer: Option<String>,
        /// Certificate date as printed on the document.
        #[arg(long)]
        date: Option<String>,
    },
    /// Show one certificate.
    Show {
        #[arg(long)]
        user: i64,
        certificate: i64,
    },
    /// List a user's certificates.
    List {
        #[arg(long)]
        user: i64,
    },
    /// Print the ledger entries of one certificate.
    Chain {
        #[arg(long)]
        user: i64,
        certificate: i64,
    },
    /// Mark a certificate verified.
    MarkVerified { certificate: i64 },
    /// Print the most recent ledger entry.
    Tail,
    /// Audit the whole global chain.
    Verify,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => {
            print_json(&outcome.body);
            ExitCode::from(outcome.code)
        }
        Err(e) => {
            print_json(&json!({ "success": false, "error": e.to_string() }));
            ExitCode::from(exit_code(&e))
        }
    }
}

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_BROKEN_CHAIN: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;

fn exit_code(err: &LedgerError) -> u8 {
    match err {
        LedgerError::NotFound { .. } => EXIT_NOT_FOUND,
        LedgerError::ChainIntegrityViolation { .. } => EXIT_BROKEN_CHAIN,
        _ => EXIT_ERROR,
    }
}

/// A response body plus the exit code to leave with.
#[derive(Debug)]
struct Outcome {
    body: serde_json::Value,
    code: u8,
}

impl Outcome {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            body,
            code: EXIT_OK,
        }
    }
}

fn open_store(cli: &Cli) -> LedgerResult<SqliteStore> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    debug!(path = %config.database.path.display(), "opening store");
    SqliteStore::open(&config.database)
}

fn run(cli: Cli) -> LedgerResult<Outcome> {
    let certs = CertificateService::new(Arc::new(open_store(&cli)?));

    let body = match cli.command {
        Command::Issue {
            user,
            holder,
            issuer,
            date,
        } => {
            let fields = CertificateFields {
                holder_name: holder,
                issuer,
                cert_date: date,
            };
            let issued = certs.issue(UserId(user), fields)?;
            json!({
                "success": true,
                "certificate": issued.certificate,
                "entry": issued.entry,
            })
        }

        Command::Show { user, certificate } => {
            let cert = certs.get(UserId(user), CertificateId(certificate))?;
            json!({ "success": true, "certificate": cert })
        }

        Command::List { user } => {
            json!({ "success": true, "certificates": certs.list(UserId(user))? })
        }

        Command::Chain { user, certificate } => {
            let ledger = certs.ledger_for(UserId(user), CertificateId(certificate))?;
            json!({ "success": true, "ledger": ledger })
        }

        Command::MarkVerified { certificate } => {
            let cert = certs.verify(CertificateId(certificate))?;
            json!({ "success": true, "certificate": cert })
        }

        Command::Tail => {
            json!({ "success": true, "entry": certs.ledger().tail()? })
        }

        Command::Verify => {
            let report = certs.ledger().audit()?;
            let code = if report.is_intact() {
                EXIT_OK
            } else {
                EXIT_BROKEN_CHAIN
            };
            return Ok(Outcome {
                body: json!({ "success": report.is_intact(), "report": report }),
                code,
            });
        }
    };

    Ok(Outcome::ok(body))
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}
