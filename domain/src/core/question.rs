//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A user query posed to the council (Value Object)
///
/// The same text is sent to every reviewer in round 1 and is quoted back in
/// the peer-review and synthesis payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a new question, rejecting empty or whitespace-only input
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self { content })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::str::FromStr for Question {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Question::new(s)
    }
}
