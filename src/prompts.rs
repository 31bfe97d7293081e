use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

const DEFAULT_REVIEW: &str = include_str!("default_prompts/review-diff.md");
const TEMPLATE_NAME: &str = "review-diff";

#[derive(Serialize)]
struct ReviewVars<'a> {
    filename: &'a str,
    diff: &'a str,
}

/// Review prompt template: the embedded default or a user override file.
pub struct PromptEngine {
    engine: upon::Engine<'static>,
}

impl PromptEngine {
    /// Compile the review template. An override file, if given, must exist.
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let source = match override_path {
            Some(path) => load_override(path)?,
            None => DEFAULT_REVIEW.to_string(),
        };

        let mut engine = upon::Engine::new();
        engine
            .add_template(TEMPLATE_NAME, source)
            .map_err(|e| Error::Prompt(format!("invalid review template: {e}")))?;
        Ok(Self { engine })
    }

    /// Render the prompt for one file.
    pub fn render_review(&self, filename: &str, diff: &str) -> Result<String> {
        self.engine
            .template(TEMPLATE_NAME)
            .render(&ReviewVars { filename, diff })
            .to_string()
            .map_err(|e| Error::Prompt(format!("failed to render review prompt: {e}")))
    }
}

fn load_override(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Prompt(format!(
            "failed to read override template {}: {e}",
            path.display()
        ))
    })
}
