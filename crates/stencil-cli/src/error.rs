// CLI error types

use stencil_templates::TemplateError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<String>),
}

impl CliError {
    /// Get a user-friendly error message
    ///
    /// Validation failures list every accumulated message, one per line.
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'stencil --help' for usage information.", message)
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Template(TemplateError::ValidationFailed(messages))
            | CliError::ValidationFailed(messages) => {
                let mut out = format!("Validation failed with {} error(s):", messages.len());
                for message in messages {
                    out.push_str("\n  - ");
                    out.push_str(message);
                }
                out
            }
            CliError::Template(e) => e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
