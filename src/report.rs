use crate::orchestrator::ReviewResult;
use crate::providers::FileChange;
use crate::review::Score;

const SEPARATOR: &str = "============================";

/// Colour bucket used by the web results table.
pub fn score_color(score: Score) -> &'static str {
    match score.value() {
        None => "gray",
        Some(v) if v >= 8.0 => "green",
        Some(v) if v >= 6.0 => "yellow",
        Some(_) => "red",
    }
}

/// Plain-text report for the CLI. `files` and `results` are parallel.
pub fn render_text(pr_number: u64, files: &[FileChange], results: &[ReviewResult]) -> String {
    let mut out = format!(
        "Found {} changed file(s) in PR #{pr_number}\n\n",
        files.len()
    );

    for (file, result) in files.iter().zip(results) {
        out.push_str(&result.filename);
        if let Some(status) = file.status.as_deref() {
            out.push_str(&format!(" ({status})"));
        }
        out.push('\n');
        out.push_str(&format!("Status: {}\n", result.status));
        out.push_str("---- AI Review ----\n");
        out.push_str(&result.comments);
        out.push_str(&format!("\n\nCode Quality Score: {}\n", result.score));
        out.push_str(&format!("\n{SEPARATOR}\n\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ReviewStatus;

    #[test]
    fn test_score_color_buckets() {
        assert_eq!(score_color(Score::Value(10.0)), "green");
        assert_eq!(score_color(Score::Value(8.0)), "green");
        assert_eq!(score_color(Score::Value(7.9)), "yellow");
        assert_eq!(score_color(Score::Value(6.0)), "yellow");
        assert_eq!(score_color(Score::Value(5.99)), "red");
        assert_eq!(score_color(Score::Value(0.0)), "red");
        assert_eq!(score_color(Score::NotAvailable), "gray");
    }

    #[test]
    fn test_render_text() {
        let files = vec![
            FileChange {
                filename: "a.py".to_string(),
                status: Some("modified".to_string()),
                diff: Some("+x".to_string()),
            },
            FileChange {
                filename: "b.bin".to_string(),
                status: None,
                diff: None,
            },
        ];
        let results = vec![
            ReviewResult {
                filename: "a.py".to_string(),
                comments: "- looks fine".to_string(),
                score: Score::Value(8.0),
                status: ReviewStatus::Approved,
            },
            ReviewResult {
                filename: "b.bin".to_string(),
                comments: "No diff available".to_string(),
                score: Score::NotAvailable,
                status: ReviewStatus::NoChanges,
            },
        ];

        let text = render_text(12, &files, &results);
        assert!(text.starts_with("Found 2 changed file(s) in PR #12\n"));
        assert!(text.contains("a.py (modified)\nStatus: Approved\n"));
        assert!(text.contains("- looks fine\n\nCode Quality Score: 8\n"));
        assert!(text.contains("b.bin\nStatus: No changes\n"));
        assert!(text.contains("Code Quality Score: N/A"));
        assert_eq!(text.matches(SEPARATOR).count(), 2);
    }

    #[test]
    fn test_render_text_exact_layout() {
        let files = vec![FileChange {
            filename: "lib.rs".to_string(),
            status: Some("added".to_string()),
            diff: Some("+fn f() {}".to_string()),
        }];
        let results = vec![ReviewResult {
            filename: "lib.rs".to_string(),
            comments: "- fine".to_string(),
            score: Score::Value(6.5),
            status: ReviewStatus::ChangesRequested,
        }];

        assert_eq!(
            render_text(3, &files, &results),
            format!(
                "Found 1 changed file(s) in PR #3\n\n\
                 lib.rs (added)\n\
                 Status: Changes Requested\n\
                 ---- AI Review ----\n\
                 - fine\n\n\
                 Code Quality Score: 6.5\n\n\
                 {SEPARATOR}\n\n"
            )
        );
    }

    #[test]
    fn test_render_text_no_files() {
        assert_eq!(render_text(9, &[], &[]), "Found 0 changed file(s) in PR #9\n\n");
    }
}
