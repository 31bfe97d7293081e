mod common;

use pr_reviewer::error::Error;
use pr_reviewer::model::ModelError;
use pr_reviewer::orchestrator::{ReviewResult, ReviewStatus};
use pr_reviewer::providers::bitbucket::BitbucketClient;
use pr_reviewer::providers::gitlab::GitLabClient;
use pr_reviewer::review::Score;
use pr_reviewer::test_helpers::{MockModel, MockTransport};

use common::{APPROVING_REPLY, GITHUB_ONE_FILE, github, orchestrator};

#[test]
fn github_pull_request_end_to_end() {
    let transport = MockTransport::new(vec![MockTransport::ok(GITHUB_ONE_FILE)]);
    let model = MockModel::always(APPROVING_REPLY);

    let results = orchestrator(&model)
        .review_pull_request(&github(&transport), "octo/repo", 5)
        .unwrap();

    assert_eq!(
        results,
        vec![ReviewResult {
            filename: "a.py".to_string(),
            comments: "- looks fine".to_string(),
            score: Score::Value(8.0),
            status: ReviewStatus::Approved,
        }]
    );
    assert_eq!(model.call_count(), 1);
    assert!(model.prompts()[0].contains("+print('hi')"));
    assert_eq!(
        transport.requests()[0].url,
        "https://api.github.com/repos/octo/repo/pulls/5/files"
    );
}

#[test]
fn provider_not_found_aborts_before_review() {
    let transport = MockTransport::new(vec![MockTransport::status(
        404,
        r#"{"message":"Not Found"}"#,
    )]);
    let model = MockModel::always(APPROVING_REPLY);

    let err = orchestrator(&model)
        .review_pull_request(&github(&transport), "octo/missing", 5)
        .unwrap_err();

    assert!(matches!(err, Error::ProviderRequest { status: 404, .. }));
    assert!(err.to_string().contains("404"));
    assert_eq!(model.call_count(), 0);
}

#[test]
fn provider_network_failure_aborts_before_review() {
    let transport = MockTransport::new(vec![Err("dns error".to_string())]);
    let model = MockModel::always(APPROVING_REPLY);

    let err = orchestrator(&model)
        .review_pull_request(&github(&transport), "octo/repo", 5)
        .unwrap_err();

    assert!(matches!(err, Error::ProviderTransport { .. }));
    assert_eq!(model.call_count(), 0);
}

#[test]
fn model_failure_degrades_single_file() {
    let transport = MockTransport::new(vec![MockTransport::ok(
        r#"[
            {"filename":"a.py","status":"modified","patch":"+a"},
            {"filename":"b.py","status":"modified","patch":"+b"}
        ]"#,
    )]);
    let model = MockModel::new(vec![
        Err(ModelError::Status {
            status: 500,
            body: "internal".to_string(),
        }),
        Ok("### Review Comments\n- fine\n### Code Quality Score\n7".to_string()),
    ]);

    let results = orchestrator(&model)
        .review_pull_request(&github(&transport), "octo/repo", 5)
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, ReviewStatus::ChangesRequested);
    assert_eq!(results[0].score, Score::NotAvailable);
    assert!(results[0].comments.starts_with("AI review failed:"));
    assert_eq!(results[1].status, ReviewStatus::Approved);
    assert_eq!(results[1].score, Score::Value(7.0));
}

#[test]
fn gitlab_changes_without_patch_are_not_reviewed() {
    let transport = MockTransport::new(vec![MockTransport::ok(
        r#"{"changes": [{"new_path": "src/main.rs", "diff": "@@ -1 +1 @@"}]}"#,
    )]);
    let client = GitLabClient::with_transport("glpat".to_string(), Box::new(transport.clone()));
    let model = MockModel::always(APPROVING_REPLY);

    let results = orchestrator(&model)
        .review_pull_request(&client, "group/project", 2)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "src/main.rs");
    assert_eq!(results[0].status, ReviewStatus::NoChanges);
    assert_eq!(results[0].comments, "No diff available");
    assert_eq!(model.call_count(), 0);
}

#[test]
fn bitbucket_diffstat_without_patch_is_not_reviewed() {
    let transport = MockTransport::new(vec![MockTransport::ok(
        r#"{"values": [{"status": "added", "new": {"path": "lib.rs"}}]}"#,
    )]);
    let client = BitbucketClient::with_transport(
        "alice".to_string(),
        "pw".to_string(),
        Box::new(transport.clone()),
    );
    let model = MockModel::always(APPROVING_REPLY);

    let results = orchestrator(&model)
        .review_pull_request(&client, "team/repo", 4)
        .unwrap();

    assert_eq!(results[0].filename, "lib.rs");
    assert_eq!(results[0].status, ReviewStatus::NoChanges);
    assert_eq!(model.call_count(), 0);
}

#[test]
fn score_below_threshold_requests_changes() {
    let transport = MockTransport::new(vec![MockTransport::ok(GITHUB_ONE_FILE)]);
    let model = MockModel::always("### Review Comments\n- close\n### Code Quality Score\n6.99");

    let results = orchestrator(&model)
        .review_pull_request(&github(&transport), "octo/repo", 5)
        .unwrap();

    assert_eq!(results[0].score, Score::Value(6.99));
    assert_eq!(results[0].status, ReviewStatus::ChangesRequested);
}
