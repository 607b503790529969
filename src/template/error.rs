//! Error types for template rendering.

use thiserror::Error;

/// A template source could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template parse error{}: {message}", at_byte(*.offset))]
pub struct SyntaxError {
    /// Byte offset into the template source, when known
    pub offset: Option<usize>,
    /// What went wrong
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn at(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub(crate) fn other(message: impl Into<String>) -> Self {
        Self {
            offset: None,
            message: message.into(),
        }
    }
}

fn at_byte(offset: Option<usize>) -> String {
    offset.map(|offset| format!(" at byte {offset}")).unwrap_or_default()
}

/// Error type for rendering a template against an execution snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template source is malformed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The template parsed but failed while executing: an unknown field, a
    /// helper given the wrong argument type, and so on.
    #[error("template execution error: {reason}")]
    Execution {
        /// Description of the failure
        reason: String,
    },

    /// A structured body no longer parses as JSON after rendering.
    #[error("template resulted in invalid JSON: {reason}")]
    ResultInvalid {
        /// JSON parser message
        reason: String,
    },
}
