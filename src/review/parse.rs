use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

pub const COMMENTS_MARKER: &str = "### Review Comments";
pub const SCORE_MARKER: &str = "### Code Quality Score";
pub const NO_COMMENTS: &str = "No comments";

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Code quality score, or `NotAvailable` when none could be determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Value(f64),
    NotAvailable,
}

impl Score {
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::NotAvailable => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Value(v) => write!(f, "{v}"),
            Score::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Numbers serialize as numbers, the sentinel as `"N/A"`.
impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Value(v) => serializer.serialize_f64(*v),
            Score::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewFeedback {
    pub comments: String,
    pub score: Score,
}

/// Split a raw model response into review comments and a score.
///
/// Only the first score marker splits; everything before it (minus any
/// comments markers) is the comments, and the first number after it is
/// the score.
pub fn parse_review_response(raw: &str) -> ReviewFeedback {
    let (head, tail) = match raw.trim().split_once(SCORE_MARKER) {
        Some((head, tail)) => (head, Some(tail)),
        None => (raw.trim(), None),
    };

    let comments = head.replace(COMMENTS_MARKER, "").trim().to_string();
    let comments = if comments.is_empty() {
        NO_COMMENTS.to_string()
    } else {
        comments
    };

    let score = tail
        .and_then(|t| SCORE_RE.find(t))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(Score::NotAvailable, Score::Value);

    ReviewFeedback { comments, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_markers() {
        let fb = parse_review_response(
            "### Review Comments\n- looks fine\n- rename `x`\n### Code Quality Score\n8",
        );
        assert_eq!(fb.comments, "- looks fine\n- rename `x`");
        assert_eq!(fb.score, Score::Value(8.0));
    }

    #[test]
    fn test_decimal_score_and_surrounding_text() {
        let fb = parse_review_response(
            "### Review Comments\nok\n### Code Quality Score\n- Score: 7.5 / 10 (good)",
        );
        assert_eq!(fb.score, Score::Value(7.5));
    }

    #[test]
    fn test_first_number_wins() {
        let fb = parse_review_response("c\n### Code Quality Score\n6 out of 10, maybe 9");
        assert_eq!(fb.score, Score::Value(6.0));
    }

    #[test]
    fn test_no_score_marker() {
        let fb = parse_review_response("### Review Comments\n- nice work, 10 stars");
        assert_eq!(fb.comments, "- nice work, 10 stars");
        assert_eq!(fb.score, Score::NotAvailable);
    }

    #[test]
    fn test_non_numeric_score() {
        let fb = parse_review_response("### Review Comments\n- meh\n### Code Quality Score\nexcellent");
        assert_eq!(fb.comments, "- meh");
        assert_eq!(fb.score, Score::NotAvailable);
    }

    #[test]
    fn test_repeated_markers_split_on_first() {
        let fb = parse_review_response(
            "### Review Comments\na\n### Code Quality Score\n5\n### Code Quality Score\n9",
        );
        assert_eq!(fb.comments, "a");
        assert_eq!(fb.score, Score::Value(5.0));
    }

    #[test]
    fn test_repeated_comments_marker_stripped() {
        let fb = parse_review_response("### Review Comments\n### Review Comments\nx");
        assert_eq!(fb.comments, "x");
    }

    #[test]
    fn test_empty_response() {
        let fb = parse_review_response("");
        assert_eq!(fb.comments, NO_COMMENTS);
        assert_eq!(fb.score, Score::NotAvailable);

        let fb = parse_review_response("   \n ");
        assert_eq!(fb.comments, NO_COMMENTS);
    }

    #[test]
    fn test_only_score_section() {
        let fb = parse_review_response("### Code Quality Score\n9");
        assert_eq!(fb.comments, NO_COMMENTS);
        assert_eq!(fb.score, Score::Value(9.0));
    }

    #[test]
    fn test_idempotent() {
        let raw = "### Review Comments\n- a\n### Code Quality Score\n3.25";
        assert_eq!(parse_review_response(raw), parse_review_response(raw));
    }

    #[test]
    fn test_score_display_and_json() {
        assert_eq!(Score::Value(8.0).to_string(), "8");
        assert_eq!(Score::Value(6.5).to_string(), "6.5");
        assert_eq!(Score::NotAvailable.to_string(), "N/A");
        assert_eq!(serde_json::to_value(Score::Value(8.0)).unwrap(), 8.0);
        assert_eq!(serde_json::to_value(Score::NotAvailable).unwrap(), "N/A");
    }
}
