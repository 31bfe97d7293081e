use std::fmt;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::Result;
use crate::providers::{FileChange, ProviderClient};
use crate::review::{ReviewEngine, Score};

/// Minimum score for a file to count as approved.
pub const APPROVAL_THRESHOLD: f64 = 7.0;
pub const NO_DIFF_COMMENT: &str = "No diff available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Approved,
    ChangesRequested,
    NoChanges,
}

impl ReviewStatus {
    /// `Approved` only for a numeric score at or above the threshold.
    pub fn classify(score: Score) -> Self {
        match score.value() {
            Some(v) if v >= APPROVAL_THRESHOLD => ReviewStatus::Approved,
            _ => ReviewStatus::ChangesRequested,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Approved",
            ReviewStatus::ChangesRequested => "Changes Requested",
            ReviewStatus::NoChanges => "No changes",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReviewStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewResult {
    pub filename: String,
    pub comments: String,
    pub score: Score,
    pub status: ReviewStatus,
}

pub struct ReviewOrchestrator {
    engine: ReviewEngine,
    max_diff_chars: Option<usize>,
}

impl ReviewOrchestrator {
    pub fn new(engine: ReviewEngine) -> Self {
        Self {
            engine,
            max_diff_chars: None,
        }
    }

    /// Truncate each diff to at most `limit` characters before review.
    pub fn with_max_diff_chars(mut self, limit: Option<usize>) -> Self {
        self.max_diff_chars = limit;
        self
    }

    /// Review every file in order. Files without a diff are reported as
    /// `NoChanges` without calling the model.
    pub fn run(&self, changed_files: &[FileChange]) -> Vec<ReviewResult> {
        changed_files.iter().map(|f| self.review_file(f)).collect()
    }

    /// Fetch the PR's changed files, then review them. A provider error is
    /// returned before any file is reviewed.
    pub fn review_pull_request<P: ProviderClient + ?Sized>(
        &self,
        provider: &P,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<ReviewResult>> {
        let (_, results) = self.fetch_and_review(provider, repo, pr_number)?;
        Ok(results)
    }

    /// Like [`review_pull_request`](Self::review_pull_request), but also hands
    /// back the fetched files, parallel to the results.
    pub fn fetch_and_review<P: ProviderClient + ?Sized>(
        &self,
        provider: &P,
        repo: &str,
        pr_number: u64,
    ) -> Result<(Vec<FileChange>, Vec<ReviewResult>)> {
        let files = provider.fetch_changed_files(repo, pr_number)?;
        info!(
            provider = %provider.kind(),
            repo,
            pr_number,
            files = files.len(),
            "reviewing pull request"
        );
        let results = self.run(&files);
        Ok((files, results))
    }

    fn review_file(&self, change: &FileChange) -> ReviewResult {
        let diff = match change.diff.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => {
                return ReviewResult {
                    filename: change.filename.clone(),
                    comments: NO_DIFF_COMMENT.to_string(),
                    score: Score::NotAvailable,
                    status: ReviewStatus::NoChanges,
                };
            }
        };

        let diff = truncate_chars(diff, self.max_diff_chars);
        let feedback = self.engine.review_diff(&change.filename, diff);
        let status = ReviewStatus::classify(feedback.score);
        info!(filename = %change.filename, score = %feedback.score, %status, "file reviewed");

        ReviewResult {
            filename: change.filename.clone(),
            comments: feedback.comments,
            score: feedback.score,
            status,
        }
    }
}

fn truncate_chars(text: &str, limit: Option<usize>) -> &str {
    match limit.and_then(|n| text.char_indices().nth(n)) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
