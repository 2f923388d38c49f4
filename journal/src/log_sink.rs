//! Fire-and-forget log sink.
//!
//! Posts each entry to the log-ingestion endpoint as an observability
//! stream, not a source of truth: no read before write, no retry, no
//! ordering guarantee across entries.

use crate::entry::JournalEntry;
use crate::errors::{SinkError, SinkResult};
use url::Url;

pub struct LogSink {
    client: reqwest::Client,
    url: Url,
}

impl LogSink {
    pub fn new(url: Url) -> Self {
        LogSink {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub async fn send(&self, entry: &JournalEntry) -> SinkResult {
        let response = self
            .client
            .post(self.url.clone())
            .json(entry)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Transport(format!(
                "log endpoint returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
