//! Error types for template rendering, helpers and compilation

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur while compiling, loading or rendering templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Invalid template syntax
    #[error("Invalid template syntax at line {line}: {message}")]
    InvalidSyntax {
        /// Line number where the syntax error occurred
        line: usize,
        /// Error message describing the syntax issue
        message: String,
    },

    /// Missing required placeholder
    #[error("Missing required placeholder: {0}")]
    MissingPlaceholder(String),

    /// Template rendering error
    #[error("Render error: {0}")]
    RenderError(String),

    /// Validation failed; carries every accumulated message
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// Underlying compiler rejected the template
    #[error("Compilation failed ({compiler}): {reason}")]
    CompileFailed {
        /// Name of the compiler that failed
        compiler: String,
        /// Underlying reason
        reason: String,
    },

    /// File extension not recognised as a supported document format
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<config::ConfigError> for TemplateError {
    fn from(err: config::ConfigError) -> Self {
        TemplateError::Config(err.to_string())
    }
}

/// Errors raised by helper functions
///
/// These never escape a render call: the pipe form falls back to the raw
/// value and the named-call form renders as empty text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    /// No helper registered under this name
    #[error("Unknown helper: {0}")]
    UnknownHelper(String),

    /// Wrong number of arguments
    #[error("Helper {helper} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Helper name
        helper: String,
        /// Human readable expectation, e.g. "1" or "1-2"
        expected: String,
        /// Number of arguments passed
        actual: usize,
    },

    /// Argument had an unusable type or value
    #[error("Invalid argument for helper {helper}: {message}")]
    InvalidArgument {
        /// Helper name
        helper: String,
        /// What was wrong
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_syntax_display() {
        let err = TemplateError::InvalidSyntax {
            line: 3,
            message: "Unclosed {{#if}}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid template syntax at line 3: Unclosed {{#if}}"
        );
    }

    #[test]
    fn test_validation_failed_joins_messages() {
        let err = TemplateError::ValidationFailed(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
    }

    #[test]
    fn test_helper_argument_count_display() {
        let err = HelperError::ArgumentCount {
            helper: "eq".to_string(),
            expected: "2".to_string(),
            actual: 1,
        };
        assert_eq!(err.to_string(), "Helper eq expects 2 argument(s), got 1");
    }
}
