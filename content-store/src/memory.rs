//! In-memory store used in tests and for running the journal without a
//! remote backend. Implements the same conditional-write semantics as the
//! GitHub backend: create fails if the id exists, replace fails if the
//! version moved.

use crate::store::{ContentStore, Fetched, StoreError, VersionToken};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredDocument {
    content: Value,
    version: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content of a document, bypassing the store protocol.
    pub fn contents(&self, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .get(id)
            .map(|doc| doc.content.clone())
    }

    /// Seed a document directly, bypassing version checks.
    pub fn insert(&self, id: &str, content: Value) {
        let mut documents = self.documents.lock();
        let version = documents.get(id).map(|d| d.version + 1).unwrap_or(1);
        documents.insert(id.to_string(), StoredDocument { content, version });
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch(&self, id: &str) -> Result<Fetched, StoreError> {
        match self.documents.lock().get(id) {
            Some(doc) => Ok(Fetched::Document {
                content: doc.content.clone(),
                version: VersionToken::new(doc.version.to_string()),
            }),
            None => Ok(Fetched::Missing),
        }
    }

    async fn put(
        &self,
        id: &str,
        content: &Value,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        let mut documents = self.documents.lock();

        let next_version = match (documents.get(id), expected) {
            (None, None) => 1,
            (Some(doc), Some(token)) if doc.version.to_string() == token.as_str() => {
                doc.version + 1
            }
            _ => return Err(StoreError::Conflict { id: id.to_string() }),
        };

        documents.insert(
            id.to_string(),
            StoredDocument {
                content: content.clone(),
                version: next_version,
            },
        );

        Ok(VersionToken::new(next_version.to_string()))
    }
}
