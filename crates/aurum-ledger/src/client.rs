//! Ledger HTTP client
//!
//! Stateless request/response wrapper over the remote ledger API. A
//! failed write mutates nothing locally; the next trigger re-derives
//! the quantity and retries naturally.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use aurum_core::{AccountId, AurumError, AurumResult, ScopeId};

use crate::LedgerSnapshot;

/// Ledger write/read operations, kept behind a trait so the runtime
/// can run against an in-memory ledger in tests
pub trait Ledger {
    /// Upsert one identity's quantity within the scope
    fn push(&self, scope: &ScopeId, account: &AccountId, quantity: f64) -> AurumResult<()>;
    /// Delete one, many, or all identities within the scope
    fn wipe(&self, scope: &ScopeId, request: &WipeRequest) -> AurumResult<()>;
    /// The scope's full authoritative map; empty if the scope is unknown
    fn pull(&self, scope: &ScopeId) -> AurumResult<LedgerSnapshot>;
}

/// Which identities a wipe removes
#[derive(Clone, Debug, PartialEq)]
pub enum WipeRequest {
    All,
    Single(AccountId),
    Multiple(Vec<AccountId>),
}

/// Connection parameters for the remote ledger
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub base_url: String,
    pub update_token: String,
    pub wipe_token: String,
    pub timeout: Duration,
}

impl LedgerConfig {
    pub fn new(
        base_url: impl Into<String>,
        update_token: impl Into<String>,
        wipe_token: impl Into<String>,
    ) -> Self {
        LedgerConfig {
            base_url: base_url.into(),
            update_token: update_token.into(),
            wipe_token: wipe_token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Blocking HTTP client for the ledger API
pub struct LedgerClient {
    agent: ureq::Agent,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(config: LedgerConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        LedgerClient { agent, config }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.config.base_url.trim_end_matches('/'))
    }

    fn post(&self, endpoint: &str, token: &str, body: &Value) -> AurumResult<()> {
        let url = self.endpoint(endpoint);
        debug!(endpoint, "ledger write");
        self.agent
            .post(&url)
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(body.clone())
            .map_err(|e| request_error(endpoint, e))?;
        Ok(())
    }
}

impl Ledger for LedgerClient {
    fn push(&self, scope: &ScopeId, account: &AccountId, quantity: f64) -> AurumResult<()> {
        self.post(
            "update",
            &self.config.update_token,
            &update_body(scope, account, quantity),
        )
    }

    fn wipe(&self, scope: &ScopeId, request: &WipeRequest) -> AurumResult<()> {
        self.post("wipe", &self.config.wipe_token, &wipe_body(scope, request))
    }

    fn pull(&self, scope: &ScopeId) -> AurumResult<LedgerSnapshot> {
        let url = self.endpoint("records");
        debug!("ledger pull");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| request_error("records", e))?;
        let all: BTreeMap<String, BTreeMap<String, f64>> = response
            .into_json()
            .map_err(|e| AurumError::LedgerTransport(e.to_string()))?;
        let scoped = all.get(scope.as_str()).cloned().unwrap_or_default();
        Ok(LedgerSnapshot::from_raw(scoped))
    }
}

fn request_error(endpoint: &str, error: ureq::Error) -> AurumError {
    match error {
        ureq::Error::Status(status, _) => AurumError::LedgerRejected {
            endpoint: endpoint.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => AurumError::LedgerTransport(transport.to_string()),
    }
}

fn update_body(scope: &ScopeId, account: &AccountId, quantity: f64) -> Value {
    json!({
        "scopeIdentifier": scope.as_str(),
        "data": { "id": account.to_string(), "quantity": quantity },
    })
}

fn wipe_body(scope: &ScopeId, request: &WipeRequest) -> Value {
    match request {
        WipeRequest::All => json!({ "type": "all" }),
        WipeRequest::Single(account) => json!({
            "type": "single",
            "scopeIdentifier": scope.as_str(),
            "keys": [account.to_string()],
        }),
        WipeRequest::Multiple(accounts) => json!({
            "type": "multiple",
            "scopeIdentifier": scope.as_str(),
            "keys": accounts.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurum_core::BlockPos;

    fn scope() -> ScopeId {
        ScopeId::new("mc.example.org")
    }

    #[test]
    fn test_update_body_shape() {
        let body = update_body(&scope(), &AccountId::player("abc"), 70.0);
        assert_eq!(body["scopeIdentifier"], "mc.example.org");
        assert_eq!(body["data"]["id"], "abc");
        assert_eq!(body["data"]["quantity"], 70.0);

        let body = update_body(&scope(), &AccountId::storage(BlockPos::new(1, 64, 1)), 40.0);
        assert_eq!(body["data"]["id"], "[C@1,64,1]");
    }

    #[test]
    fn test_wipe_body_shapes() {
        let body = wipe_body(&scope(), &WipeRequest::All);
        assert_eq!(body["type"], "all");
        assert!(body.get("keys").is_none());

        let single = WipeRequest::Single(AccountId::storage(BlockPos::new(0, 60, 0)));
        let body = wipe_body(&scope(), &single);
        assert_eq!(body["type"], "single");
        assert_eq!(body["keys"][0], "[C@0,60,0]");

        let multiple = WipeRequest::Multiple(vec![
            AccountId::storage(BlockPos::new(0, 60, 0)),
            AccountId::storage(BlockPos::new(1, 60, 0)),
        ]);
        let body = wipe_body(&scope(), &multiple);
        assert_eq!(body["type"], "multiple");
        assert_eq!(body["scopeIdentifier"], "mc.example.org");
        assert_eq!(body["keys"].as_array().unwrap().len(), 2);
    }
}
