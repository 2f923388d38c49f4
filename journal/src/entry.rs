use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter keys that must never reach the journal. Compared
/// case-insensitively against incoming parameter names.
const SENSITIVE_KEYS: &[&str] = &[
    "token",
    "secret",
    "password",
    "api_key",
    "apikey",
    "authorization",
    "credential",
];

/// One persisted query outcome. Immutable once encoded; owned by the sink
/// that persists it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub timestamp: String,
    pub route: String,
    pub parameters: IndexMap<String, String>,
    pub result: Value,
}

impl JournalEntry {
    /// Build the journal record for a resolved query. The timestamp marks
    /// the moment the upstream result became available, not request
    /// receipt. Credential-bearing parameters are stripped; callers
    /// guarantee `result` itself carries no secrets.
    pub fn encode(route: &str, parameters: IndexMap<String, String>, result: Value) -> Self {
        let parameters = parameters
            .into_iter()
            .filter(|(key, _)| !is_sensitive(key))
            .collect();

        JournalEntry {
            timestamp: Utc::now().to_rfc3339(),
            route: route.to_string(),
            parameters,
            result,
        }
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}
