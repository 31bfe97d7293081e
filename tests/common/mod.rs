#![allow(dead_code)]

use pr_reviewer::orchestrator::ReviewOrchestrator;
use pr_reviewer::prompts::PromptEngine;
use pr_reviewer::providers::github::GitHubClient;
use pr_reviewer::review::ReviewEngine;
use pr_reviewer::test_helpers::{MockModel, MockTransport};

/// Orchestrator over the default prompt and the given mock model.
pub fn orchestrator(model: &MockModel) -> ReviewOrchestrator {
    ReviewOrchestrator::new(ReviewEngine::new(
        Box::new(model.clone()),
        PromptEngine::new(None).unwrap(),
    ))
}

pub fn github(transport: &MockTransport) -> GitHubClient {
    GitHubClient::with_transport("ghp_test".to_string(), Box::new(transport.clone()))
}

/// GitHub `pulls/{n}/files` body with one modified Python file.
pub const GITHUB_ONE_FILE: &str =
    r#"[{"filename":"a.py","status":"modified","patch":"diff --git a/a.py b/a.py\n+print('hi')"}]"#;

pub const APPROVING_REPLY: &str =
    "### Review Comments\n- looks fine\n### Code Quality Score\n8";
