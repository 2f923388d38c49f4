//! Version-checked blob appender.
//!
//! The remote collection is shared by concurrent writers and the store
//! offers no transaction, only "read current version, write conditional on
//! that version". The appender is therefore a read-modify-write with
//! optimistic concurrency control: racing writers are expected, exactly
//! one wins per version generation, and losers surface as
//! [`SinkError::Conflict`] rather than being silently dropped.

use crate::entry::JournalEntry;
use crate::errors::{SinkError, SinkResult};
use content_store::{ContentStore, Fetched};
use serde_json::Value;
use std::sync::Arc;

pub struct BlobAppender {
    store: Arc<dyn ContentStore>,
}

impl BlobAppender {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        BlobAppender { store }
    }

    /// Append one entry to the dataset's collection.
    ///
    /// A missing collection is created; a collection whose stored value is
    /// not a JSON array is reset to empty before appending (logged as
    /// corruption recovery). Any other fetch failure aborts WITHOUT
    /// writing: a blind write could overwrite a collection whose true
    /// content we never saw. A version mismatch on the write is returned
    /// as `Conflict`; there is no retry.
    pub async fn append(&self, dataset_id: &str, entry: &JournalEntry) -> SinkResult {
        let (mut collection, version) = match self.store.fetch(dataset_id).await? {
            Fetched::Document { content, version } => match content {
                Value::Array(entries) => (entries, Some(version)),
                _ => {
                    tracing::warn!(
                        dataset = dataset_id,
                        "stored collection is not a JSON array, resetting to empty"
                    );
                    (Vec::new(), Some(version))
                }
            },
            Fetched::Missing => (Vec::new(), None),
        };

        let encoded =
            serde_json::to_value(entry).map_err(|e| SinkError::Transport(e.to_string()))?;
        collection.push(encoded);

        self.store
            .put(dataset_id, &Value::Array(collection), version.as_ref())
            .await?;

        Ok(())
    }
}
