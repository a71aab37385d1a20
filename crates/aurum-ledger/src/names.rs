//! Profile-name resolution
//!
//! Maps raw profile ids to display names, best effort. Failures fall
//! back to the raw id at the call site; resolution never blocks or
//! fails the surrounding operation.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

/// Display-name lookup for player identities
pub trait NameResolver {
    /// Resolve one profile id; None when resolution fails
    fn resolve(&self, id: &str) -> Option<String>;
}

/// HTTP resolver against a session profile service
pub struct ProfileNameResolver {
    agent: ureq::Agent,
    base_url: String,
}

impl ProfileNameResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        ProfileNameResolver {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(5))
                .build(),
            base_url: base_url.into(),
        }
    }
}

impl NameResolver for ProfileNameResolver {
    fn resolve(&self, id: &str) -> Option<String> {
        let url = format!("{}/{id}", self.base_url.trim_end_matches('/'));
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| debug!(id, error = %e, "profile lookup failed"))
            .ok()?;
        let body: Value = response.into_json().ok()?;
        body.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
