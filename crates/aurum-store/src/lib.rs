//! Aurum Store - Persisted configuration
//!
//! Two JSON sections on disk, each read and written whole:
//! - `config.json`: generic, cross-session tunables
//! - `worlds.json`: world-scoped state keyed by scope id (declared
//!   storages, private reserve quantity)
//!
//! A missing or unreadable section is materialized from defaults once
//! and re-read, never retried in a loop.

pub mod config;
pub mod store;

pub use config::*;
pub use store::*;
