//! Aurum Runtime - The event-driven tracker node
//!
//! This crate wires the reconciliation engine to a game client:
//! - The [`Host`] trait, the narrow contract to the client
//! - Session preconditions checked at attach
//! - The [`Node`], owning all tracker state and handling world events
//!   one at a time in delivery order
//! - The leaderboard projection of pulled records

pub mod host;
pub mod session;
pub mod board;
pub mod node;

pub use host::*;
pub use session::*;
pub use board::*;
pub use node::*;
