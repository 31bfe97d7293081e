use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpTransport;

use super::{FileChange, ProviderClient, ProviderKind, decode, fetch_body};

pub const BITBUCKET_API_URL: &str = "https://api.bitbucket.org/2.0";

#[derive(Debug, Deserialize)]
struct DiffStat {
    #[serde(default)]
    values: Vec<DiffStatEntry>,
}

#[derive(Debug, Deserialize)]
struct DiffStatEntry {
    path: Option<String>,
    status: Option<String>,
    new: Option<CommitFile>,
    old: Option<CommitFile>,
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    path: String,
}

impl DiffStatEntry {
    /// `path`, else the new side's path, else the old side's (deletions).
    fn into_file_change(self) -> Option<FileChange> {
        let filename = self
            .path
            .or(self.new.map(|f| f.path))
            .or(self.old.map(|f| f.path))?;
        Some(FileChange {
            filename,
            status: self.status,
            diff: self.patch,
        })
    }
}

pub struct BitbucketClient {
    base_url: String,
    auth_header: String,
    transport: Box<dyn HttpTransport>,
}

impl BitbucketClient {
    pub fn with_transport(
        username: String,
        app_password: String,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{app_password}"));
        Self {
            base_url: BITBUCKET_API_URL.to_string(),
            auth_header: format!("Basic {encoded}"),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn diffstat_url(&self, repo: &str, pr_number: u64) -> String {
        format!(
            "{}/repositories/{repo}/pullrequests/{pr_number}/diffstat",
            self.base_url
        )
    }
}

impl ProviderClient for BitbucketClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bitbucket
    }

    fn fetch_changed_files(&self, repo: &str, pr_number: u64) -> Result<Vec<FileChange>> {
        let url = self.diffstat_url(repo, pr_number);
        let body = fetch_body(
            self.kind(),
            self.transport.as_ref(),
            &url,
            &[("Authorization", &self.auth_header)],
        )?;

        let stat: DiffStat = decode(self.kind(), &body)?;
        debug!(repo, pr_number, count = stat.values.len(), "fetched Bitbucket diffstat");

        stat.values
            .into_iter()
            .map(|entry| {
                entry.into_file_change().ok_or_else(|| Error::ProviderResponse {
                    provider: self.kind().to_string(),
                    message: "diffstat entry has no file path".to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockTransport;

    fn client(transport: &MockTransport) -> BitbucketClient {
        BitbucketClient::with_transport(
            "alice".to_string(),
            "app-pass".to_string(),
            Box::new(transport.clone()),
        )
    }

    #[test]
    fn test_fetch_maps_values() {
        let transport = MockTransport::new(vec![MockTransport::ok(
            r#"{
                "pagelen": 500,
                "values": [
                    {"type": "diffstat", "status": "modified", "path": "README.md"},
                    {"type": "diffstat", "status": "added", "old": null, "new": {"path": "src/new.rs"}},
                    {"type": "diffstat", "status": "removed", "old": {"path": "gone.rs"}, "new": null}
                ]
            }"#,
        )]);
        let files = client(&transport).fetch_changed_files("team/repo", 3).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].filename, "README.md");
        assert_eq!(files[0].status.as_deref(), Some("modified"));
        assert!(files[0].diff.is_none());
        assert_eq!(files[1].filename, "src/new.rs");
        assert_eq!(files[2].filename, "gone.rs");
        assert_eq!(files[2].status.as_deref(), Some("removed"));
    }

    #[test]
    fn test_request_uses_basic_auth() {
        let transport = MockTransport::new(vec![MockTransport::ok(r#"{"values": []}"#)]);
        client(&transport).fetch_changed_files("team/repo", 3).unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://api.bitbucket.org/2.0/repositories/team/repo/pullrequests/3/diffstat"
        );
        // base64("alice:app-pass")
        assert_eq!(
            requests[0].header("Authorization"),
            Some("Basic YWxpY2U6YXBwLXBhc3M=")
        );
    }

    #[test]
    fn test_missing_values_key_is_empty() {
        let transport = MockTransport::new(vec![MockTransport::ok("{}")]);
        let files = client(&transport).fetch_changed_files("team/repo", 3).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_entry_without_any_path_is_rejected() {
        let transport = MockTransport::new(vec![MockTransport::ok(
            r#"{"values": [{"status": "modified"}]}"#,
        )]);
        let err = client(&transport)
            .fetch_changed_files("team/repo", 3)
            .unwrap_err();
        assert!(err.to_string().contains("no file path"));
    }

    #[test]
    fn test_server_error_not_retried() {
        let transport = MockTransport::new(vec![
            MockTransport::status(503, "unavailable"),
            MockTransport::ok(r#"{"values": []}"#),
        ]);
        let err = client(&transport)
            .fetch_changed_files("team/repo", 3)
            .unwrap_err();
        assert!(matches!(err, Error::ProviderRequest { status: 503, .. }));
        assert_eq!(transport.requests().len(), 1);
    }
}
