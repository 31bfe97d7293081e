pub mod bitbucket;
pub mod github;
pub mod gitlab;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpTransport;

/// One changed file in a pull/merge request, normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub filename: String,
    pub status: Option<String>,
    pub diff: Option<String>,
}

impl FileChange {
    /// True when there is diff text worth sending to the model.
    pub fn has_diff(&self) -> bool {
        self.diff.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitHub,
    GitLab,
    Bitbucket,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::GitHub,
        ProviderKind::GitLab,
        ProviderKind::Bitbucket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
            ProviderKind::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            "bitbucket" => Ok(ProviderKind::Bitbucket),
            other => Err(Error::ConfigValidation(format!(
                "unknown provider: {other} (expected: github, gitlab, bitbucket)"
            ))),
        }
    }
}

/// Static credentials injected into a provider client at construction.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderCredentials {
    Token(String),
    AppPassword { username: String, password: String },
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCredentials::Token(_) => f.write_str("Token(<redacted>)"),
            ProviderCredentials::AppPassword { username, .. } => f
                .debug_struct("AppPassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

pub trait ProviderClient {
    fn kind(&self) -> ProviderKind;

    /// Fetch the changed files of PR/MR `pr_number` in `repo`.
    fn fetch_changed_files(&self, repo: &str, pr_number: u64) -> Result<Vec<FileChange>>;
}

pub enum AnyProvider {
    GitHub(github::GitHubClient),
    GitLab(gitlab::GitLabClient),
    Bitbucket(bitbucket::BitbucketClient),
}

impl AnyProvider {
    /// Build the client for `kind` with its default base URL.
    pub fn build(
        kind: ProviderKind,
        credentials: ProviderCredentials,
        base_url: Option<String>,
        transport: Box<dyn HttpTransport>,
    ) -> Result<Self> {
        let provider = match (kind, credentials) {
            (ProviderKind::GitHub, ProviderCredentials::Token(token)) => {
                let mut client = github::GitHubClient::with_transport(token, transport);
                if let Some(url) = base_url {
                    client = client.with_base_url(url);
                }
                AnyProvider::GitHub(client)
            }
            (ProviderKind::GitLab, ProviderCredentials::Token(token)) => {
                let mut client = gitlab::GitLabClient::with_transport(token, transport);
                if let Some(url) = base_url {
                    client = client.with_base_url(url);
                }
                AnyProvider::GitLab(client)
            }
            (ProviderKind::Bitbucket, ProviderCredentials::AppPassword { username, password }) => {
                let mut client =
                    bitbucket::BitbucketClient::with_transport(username, password, transport);
                if let Some(url) = base_url {
                    client = client.with_base_url(url);
                }
                AnyProvider::Bitbucket(client)
            }
            (kind, credentials) => {
                return Err(Error::Configuration(format!(
                    "{kind} does not accept credentials of kind {credentials:?}"
                )));
            }
        };
        Ok(provider)
    }
}

impl ProviderClient for AnyProvider {
    fn kind(&self) -> ProviderKind {
        match self {
            AnyProvider::GitHub(p) => p.kind(),
            AnyProvider::GitLab(p) => p.kind(),
            AnyProvider::Bitbucket(p) => p.kind(),
        }
    }

    fn fetch_changed_files(&self, repo: &str, pr_number: u64) -> Result<Vec<FileChange>> {
        match self {
            AnyProvider::GitHub(p) => p.fetch_changed_files(repo, pr_number),
            AnyProvider::GitLab(p) => p.fetch_changed_files(repo, pr_number),
            AnyProvider::Bitbucket(p) => p.fetch_changed_files(repo, pr_number),
        }
    }
}

/// GET `url` and return the body of a 2xx response.
fn fetch_body(
    kind: ProviderKind,
    transport: &dyn HttpTransport,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String> {
    let response = transport
        .get(url, headers)
        .map_err(|e| Error::ProviderTransport {
            provider: kind.to_string(),
            message: e.to_string(),
        })?;

    if !response.is_success() {
        return Err(Error::ProviderRequest {
            provider: kind.to_string(),
            status: response.status,
            body: response.body,
        });
    }

    debug!(provider = %kind, bytes = response.body.len(), "provider response received");
    Ok(response.body)
}

fn decode<T: serde::de::DeserializeOwned>(kind: ProviderKind, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::ProviderResponse {
        provider: kind.to_string(),
        message: e.to_string(),
    })
}
