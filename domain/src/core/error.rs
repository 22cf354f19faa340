//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::InvalidQuestion("Question cannot be empty".to_string());
        assert_eq!(error.to_string(), "Invalid question: Question cannot be empty");

        let error = DomainError::InvalidLabel("Response 7".to_string());
        assert_eq!(error.to_string(), "Invalid label: Response 7");
    }
}
