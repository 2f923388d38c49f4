use async_trait::async_trait;
use serde_json::Value;

/// Opaque identifier of a document's version as reported by the backing
/// store. A conditional write succeeds only while the document is still at
/// the version the token was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of fetching a document. A document that does not exist yet is a
/// normal outcome, not an error: callers create it with `expected = None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Document { content: Value, version: VersionToken },
    Missing,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("version conflict writing {id}")]
    Conflict { id: String },

    #[error("request to content store failed: {0}")]
    Transport(String),

    #[error("content store returned status {status} for {id}")]
    Status { id: String, status: u16 },

    #[error("undecodable document body for {id}: {reason}")]
    Decode { id: String, reason: String },
}

/// A remote document store addressed by id, with conditional writes.
///
/// The only concurrency primitive offered is the version token: `put` with
/// `expected = None` creates the document and fails with `Conflict` if it
/// already exists; `put` with a token overwrites only while the stored
/// version still matches.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Fetched, StoreError>;

    async fn put(
        &self,
        id: &str,
        content: &Value,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError>;
}
