use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::http::HttpTransport;

use super::{FileChange, ProviderClient, ProviderKind, decode, fetch_body};

pub const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

#[derive(Debug, Deserialize)]
struct MrChanges {
    #[serde(default)]
    changes: Vec<MrChange>,
}

/// Entry of the MR `changes` list. GitLab's own `diff` field is not read;
/// diff text is only taken from a `patch` field when one is present.
#[derive(Debug, Deserialize)]
struct MrChange {
    new_path: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    deleted_file: bool,
    #[serde(default)]
    renamed_file: bool,
    patch: Option<String>,
}

impl MrChange {
    fn status(&self) -> &'static str {
        if self.new_file {
            "added"
        } else if self.deleted_file {
            "removed"
        } else if self.renamed_file {
            "renamed"
        } else {
            "modified"
        }
    }
}

pub struct GitLabClient {
    base_url: String,
    token: String,
    transport: Box<dyn HttpTransport>,
}

impl GitLabClient {
    pub fn with_transport(token: String, transport: Box<dyn HttpTransport>) -> Self {
        Self {
            base_url: GITLAB_API_URL.to_string(),
            token,
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Numeric project ids pass through; `group/project` paths are encoded.
    fn changes_url(&self, repo: &str, mr_iid: u64) -> String {
        format!(
            "{}/projects/{}/merge_requests/{mr_iid}/changes",
            self.base_url,
            urlencoding::encode(repo)
        )
    }
}

impl ProviderClient for GitLabClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn fetch_changed_files(&self, repo: &str, pr_number: u64) -> Result<Vec<FileChange>> {
        let url = self.changes_url(repo, pr_number);
        let body = fetch_body(
            self.kind(),
            self.transport.as_ref(),
            &url,
            &[("PRIVATE-TOKEN", &self.token)],
        )?;

        let mr: MrChanges = decode(self.kind(), &body)?;
        debug!(repo, mr_iid = pr_number, count = mr.changes.len(), "fetched GitLab MR changes");

        Ok(mr
            .changes
            .into_iter()
            .map(|c| FileChange {
                status: Some(c.status().to_string()),
                filename: c.new_path,
                diff: c.patch,
            })
            .collect())
    }
}
