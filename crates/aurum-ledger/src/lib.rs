//! Aurum Ledger - Remote ledger access
//!
//! This crate wraps the authoritative ledger's HTTP API:
//! - Bearer-authenticated push/wipe writes
//! - Whole-map pulls scoped to the current session
//! - Best-effort profile-name resolution
//!
//! Calls are blocking: a handler suspends on the request and resumes
//! with the result, matching the tracker's single-threaded model.

pub mod client;
pub mod records;
pub mod names;

pub use client::*;
pub use records::*;
pub use names::*;
