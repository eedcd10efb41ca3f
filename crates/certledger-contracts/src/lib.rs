//! # certledger-contracts
//!
//! Shared types and error contracts for the certledger hash-chained ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate; only data definitions and error types.

pub mod certificate;
pub mod error;
pub mod ledger;
pub mod timestamp;
