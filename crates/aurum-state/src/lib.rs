//! Aurum State - The local reconciliation engine
//!
//! This crate implements the tracker's hard core:
//! - Snapshot capture at interaction start
//! - Delta resolution from carried-quantity diffs
//! - The durable registry of declared shared storages
//! - Reconciliation planning against the remote ledger's
//!   shared-storage subset

pub mod snapshot;
pub mod resolve;
pub mod registry;
pub mod reconcile;

pub use snapshot::*;
pub use resolve::*;
pub use registry::*;
pub use reconcile::*;
