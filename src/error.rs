//! Structured error types for the Plume layout engine.
//!
//! Every failure in the core is local and synchronous. The variants follow
//! the kind of mistake that produced them: misuse of an API in the wrong
//! state, bad caller input, a misconfigured document, or a failure in one of
//! the collaborators (fonts, images, JSON input).

use thiserror::Error;

/// The unified error type returned by all public Plume API functions.
#[derive(Debug, Error)]
pub enum PlumeError {
    /// An operation was attempted in a state that forbids it
    /// (e.g. appending to a closed boundary).
    #[error("invalid state: {0}")]
    State(String),

    /// An API was called in a way it does not support
    /// (e.g. closing a boundary with fewer than three points).
    #[error("invalid usage: {0}")]
    Usage(String),

    /// Caller supplied a value that failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} out of bounds, valid range is 0..{len}")]
    OutOfBounds { index: usize, len: usize },

    /// An element of the wrong kind was passed where a specific kind is required.
    #[error("type error: {0}")]
    Type(String),

    #[error("document has already been drawn")]
    AlreadyDrawn,

    /// The document is missing a collaborator or a formatter cannot be built.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("enhancement definition \"{0}\" not found")]
    DefinitionNotFound(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("image error: {0}")]
    Image(String),

    /// JSON input failed to parse as a valid Plume document.
    #[error("failed to parse document: {source}{}", format_hint(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlumeError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PlumeError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Plume document schema. Check node types and attribute names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PlumeError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: PlumeError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let message = err.to_string();
        assert!(message.starts_with("failed to parse document"));
        assert!(message.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn out_of_bounds_message() {
        let err = PlumeError::OutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of bounds, valid range is 0..2");
    }
}
