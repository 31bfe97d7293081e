pub mod parse;

use tracing::{debug, warn};

use crate::error::Error;
use crate::model::{LanguageModel, ModelError};
use crate::prompts::PromptEngine;

pub use parse::{ReviewFeedback, Score, parse_review_response};

#[derive(Debug, thiserror::Error)]
enum ReviewFailure {
    #[error(transparent)]
    Prompt(#[from] Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Sends one file's diff to the language model and parses the verdict.
pub struct ReviewEngine {
    model: Box<dyn LanguageModel>,
    prompts: PromptEngine,
}

impl ReviewEngine {
    pub fn new(model: Box<dyn LanguageModel>, prompts: PromptEngine) -> Self {
        Self { model, prompts }
    }

    /// Review a single diff. Never fails: a prompt or model error becomes
    /// a feedback whose comments describe the failure and whose score is
    /// `NotAvailable`.
    pub fn review_diff(&self, filename: &str, diff: &str) -> ReviewFeedback {
        match self.try_review(filename, diff) {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(filename, error = %e, "AI review failed");
                ReviewFeedback {
                    comments: format!("AI review failed: {e}"),
                    score: Score::NotAvailable,
                }
            }
        }
    }

    fn try_review(&self, filename: &str, diff: &str) -> Result<ReviewFeedback, ReviewFailure> {
        let prompt = self.prompts.render_review(filename, diff)?;
        let raw = self.model.complete(&prompt)?;
        let feedback = parse_review_response(&raw);
        debug!(filename, score = %feedback.score, "review parsed");
        Ok(feedback)
    }
}
