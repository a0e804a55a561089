//! Lojavoz ledger client
//!
//! Appends (timestamp, store, transcript) rows to a shared Google spreadsheet

pub mod auth;
pub mod client;
pub mod ledger_trait;
pub mod types;

// Re-export main types
pub use client::{current_timestamp, SheetsClient};
pub use ledger_trait::Ledger;
pub use types::ServiceAccountKey;
