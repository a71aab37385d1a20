//! Session preconditions
//!
//! Checked once at attach and re-checked on world join. A failure at
//! attach is fatal: the tracker refuses to run half-configured.

use aurum_core::{AurumError, AurumResult, ScopeId};

use crate::Host;

/// Validate the session and derive its ledger scope
pub fn ensure_session<H: Host>(host: &H) -> AurumResult<ScopeId> {
    let mode = host.game_mode();
    if !mode.allows_tracking() {
        return Err(AurumError::DisallowedGameMode(mode.to_string()));
    }
    match host.scope_id() {
        Some(id) if !id.is_empty() => Ok(ScopeId::new(id)),
        _ => Err(AurumError::UnidentifiedScope),
    }
}
