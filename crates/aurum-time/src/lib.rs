//! Aurum Time - Temporal control
//!
//! This crate implements the tracker's two pieces of temporal control:
//! - The push gate: a cooldown that suppresses non-forced personal
//!   pushes
//! - The pull timer: a deterministic scheduler driven by the world
//!   tick counter, not wall-clock time

pub mod gate;
pub mod interval;

pub use gate::*;
pub use interval::*;
