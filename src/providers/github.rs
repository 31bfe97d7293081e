use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::http::HttpTransport;

use super::{FileChange, ProviderClient, ProviderKind, decode, fetch_body};

pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GhFile {
    filename: String,
    status: Option<String>,
    patch: Option<String>,
}

pub struct GitHubClient {
    base_url: String,
    auth_header: String,
    transport: Box<dyn HttpTransport>,
}

impl GitHubClient {
    pub fn with_transport(token: String, transport: Box<dyn HttpTransport>) -> Self {
        Self {
            base_url: GITHUB_API_URL.to_string(),
            auth_header: format!("token {token}"),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn files_url(&self, repo: &str, pr_number: u64) -> String {
        format!("{}/repos/{repo}/pulls/{pr_number}/files", self.base_url)
    }
}

impl ProviderClient for GitHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn fetch_changed_files(&self, repo: &str, pr_number: u64) -> Result<Vec<FileChange>> {
        let url = self.files_url(repo, pr_number);
        let body = fetch_body(
            self.kind(),
            self.transport.as_ref(),
            &url,
            &[
                ("Authorization", &self.auth_header),
                ("Accept", "application/vnd.github.v3+json"),
                ("User-Agent", "pr-reviewer"),
            ],
        )?;

        // The response body is the file list itself, no envelope.
        let files: Vec<GhFile> = decode(self.kind(), &body)?;
        debug!(repo, pr_number, count = files.len(), "fetched GitHub PR files");

        Ok(files
            .into_iter()
            .map(|f| FileChange {
                filename: f.filename,
                status: f.status,
                diff: f.patch,
            })
            .collect())
    }
}
