use content_store::GithubStoreConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("sink timeout cannot be 0")]
    ZeroTimeout,

    #[error("blob store repo must be in owner/name form: {0:?}")]
    InvalidRepo(String),

    #[error("blob store token is empty")]
    EmptyToken,

    #[error("dataset override for {0} has an empty file")]
    EmptyDatasetFile(String),

    #[error("dataset override for {0} has an empty kind")]
    EmptyDatasetKind(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// Which journal strategy a deployment runs. Exactly one is active per
/// process; this is deployment configuration, never request-time logic.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JournalProfile {
    /// Version-checked append to the per-dataset blob collection.
    BlobAppend,
    /// Fire-and-forget POST of each entry to the log endpoint.
    LogPost,
    /// Log POST plus the encoded-GET key-value sink, independently.
    LogAndKeyValue,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LogEndpointConfig {
    /// Log-ingestion URL entries are POSTed to.
    ///
    /// Note: uses `url::Url` so invalid URLs are rejected during config
    /// deserialization.
    pub url: Url,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KeyValueEndpointConfig {
    /// Base URL; the dataset kind is appended as a path segment.
    pub base_url: Url,
}

/// Override or extend the built-in route-to-dataset table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// Blob filename for the route's collection.
    pub file: String,
    /// Dataset type tag for the key-value sink.
    pub kind: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JournalConfig {
    pub profile: JournalProfile,
    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,
    pub blob_store: Option<GithubStoreConfig>,
    pub log_endpoint: Option<LogEndpointConfig>,
    pub key_value_endpoint: Option<KeyValueEndpointConfig>,
    #[serde(default)]
    pub datasets: HashMap<String, DatasetConfig>,
}

fn default_sink_timeout_secs() -> u64 {
    10
}

impl JournalConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: JournalConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the journal configuration.
    ///
    /// A backend section missing for the active profile is NOT a
    /// validation error: the coordinator degrades that sink to a logged
    /// no-op instead of refusing to start.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sink_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }

        if let Some(blob_store) = &self.blob_store {
            if blob_store.token.is_empty() {
                return Err(ValidationError::EmptyToken);
            }
            match blob_store.repo.split_once('/') {
                Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
                _ => return Err(ValidationError::InvalidRepo(blob_store.repo.clone())),
            }
        }

        for (route, dataset) in &self.datasets {
            if dataset.file.is_empty() {
                return Err(ValidationError::EmptyDatasetFile(route.clone()));
            }
            if dataset.kind.is_empty() {
                return Err(ValidationError::EmptyDatasetKind(route.clone()));
            }
        }

        Ok(())
    }
}
