//! GitHub contents-API backend.
//!
//! Documents are files in a repository directory; the blob `sha` GitHub
//! reports for a file is the version token. The contents endpoint only
//! offers whole-file conditional replacement (`PUT` with the previous
//! `sha`), which is exactly the primitive [`ContentStore`] models.

use crate::metrics_defs::{STORE_FETCH, STORE_PUT, STORE_PUT_CONFLICT};
use crate::store::{ContentStore, Fetched, StoreError, VersionToken};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::counter;

/// GitHub rejects requests without a User-Agent header.
const USER_AGENT: &str = "result-journal";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GithubStoreConfig {
    /// Repository in "owner/name" form.
    pub repo: String,
    /// Token with contents write permission on the repository.
    pub token: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory inside the repository that holds the documents.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_branch() -> String {
    "main".into()
}

fn default_base_dir() -> String {
    "public".into()
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

pub struct GithubStore {
    client: reqwest::Client,
    config: GithubStoreConfig,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    content: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    // Present only when replacing an existing file
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Deserialize)]
struct PutResponseContent {
    sha: String,
}

impl GithubStore {
    pub fn new(config: GithubStoreConfig) -> Self {
        GithubStore {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn contents_url(&self, id: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}/{}",
            self.config.api_url, self.config.repo, self.config.base_dir, id
        )
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.config.token)
    }
}

#[async_trait]
impl ContentStore for GithubStore {
    async fn fetch(&self, id: &str) -> Result<Fetched, StoreError> {
        counter!(STORE_FETCH).increment(1);

        let url = self.contents_url(id);
        let response = self
            .client
            .get(&url)
            .query(&[("ref", self.config.branch.as_str())])
            .header("Authorization", self.auth_header())
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: ContentsResponse =
                    response.json().await.map_err(|e| StoreError::Decode {
                        id: id.to_string(),
                        reason: e.to_string(),
                    })?;

                // The contents API base64-encodes file bodies with embedded
                // newlines every 60 characters.
                let stripped = body.content.replace('\n', "");
                let raw = STANDARD.decode(stripped).map_err(|e| StoreError::Decode {
                    id: id.to_string(),
                    reason: e.to_string(),
                })?;
                let content: Value =
                    serde_json::from_slice(&raw).map_err(|e| StoreError::Decode {
                        id: id.to_string(),
                        reason: e.to_string(),
                    })?;

                Ok(Fetched::Document {
                    content,
                    version: VersionToken::new(body.sha),
                })
            }
            StatusCode::NOT_FOUND => {
                tracing::debug!(id, "document not found in repository");
                Ok(Fetched::Missing)
            }
            status => Err(StoreError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn put(
        &self,
        id: &str,
        content: &Value,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        counter!(STORE_PUT).increment(1);

        let serialized =
            serde_json::to_string_pretty(content).map_err(|e| StoreError::Decode {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let body = PutRequest {
            message: format!("Append query result to {id}"),
            content: STANDARD.encode(serialized.as_bytes()),
            branch: &self.config.branch,
            sha: expected.map(VersionToken::as_str),
        };

        let url = self.contents_url(id);
        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let parsed: PutResponse =
                    response.json().await.map_err(|e| StoreError::Decode {
                        id: id.to_string(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(id, sha = %parsed.content.sha, "document committed");
                Ok(VersionToken::new(parsed.content.sha))
            }
            // 409: sha no longer matches. 422: create raced with another
            // writer that created the file first.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                counter!(STORE_PUT_CONFLICT).increment(1);
                Err(StoreError::Conflict { id: id.to_string() })
            }
            status => Err(StoreError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
