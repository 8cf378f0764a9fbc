//! Comment moderation
//!
//! Rejects comment text that contains any forbidden word as a substring.

use crate::config::ModerationConfig;

use super::FieldError;

/// Forbidden-word filter applied to comments on create and edit
#[derive(Debug, Clone)]
pub struct ModerationFilter {
    bad_words: Vec<String>,
    warning: String,
    ignore_case: bool,
}

impl Default for ModerationFilter {
    fn default() -> Self {
        Self::from_config(&ModerationConfig::default())
    }
}

impl ModerationFilter {
    /// Blank entries in `bad_words` are dropped; they would match any text.
    pub fn new(bad_words: Vec<String>, warning: impl Into<String>, ignore_case: bool) -> Self {
        let bad_words = bad_words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .map(|w| if ignore_case { w.to_lowercase() } else { w })
            .collect();

        Self {
            bad_words,
            warning: warning.into(),
            ignore_case,
        }
    }

    pub fn from_config(config: &ModerationConfig) -> Self {
        Self::new(
            config.bad_words.clone(),
            config.warning.clone(),
            config.ignore_case,
        )
    }

    /// The message shown for rejected comments
    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// First forbidden word found in `text`
    pub fn find_bad_word(&self, text: &str) -> Option<&str> {
        let haystack = if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        self.bad_words
            .iter()
            .find(|word| haystack.contains(word.as_str()))
            .map(String::as_str)
    }

    /// Check comment text: it must not be blank and must not contain a
    /// forbidden word. Errors are attached to the `text` field.
    pub fn validate(&self, text: &str) -> Result<(), FieldError> {
        if text.trim().is_empty() {
            return Err(FieldError::required("text"));
        }
        if let Some(word) = self.find_bad_word(text) {
            tracing::debug!(word, "Comment rejected by moderation");
            return Err(FieldError::new("text", self.warning.clone()));
        }
        Ok(())
    }
}
