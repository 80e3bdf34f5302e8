//! Error types for parsing and printing operations

use thiserror::Error;

/// Result type alias for parse/print operations.
pub type Result<T> = std::result::Result<T, GenError>;

/// Errors that can occur while parsing or printing source code
#[derive(Debug, Error)]
pub enum GenError {
    /// Parsing the source with OXC failed.
    #[error("failed to parse source: {message}")]
    Parse {
        /// Aggregated parser error message.
        message: String,
    },
}

impl GenError {
    /// Create a parse error from multiple diagnostic strings.
    pub fn parse_error(diagnostics: &[String]) -> Self {
        Self::Parse {
            message: diagnostics.join("; "),
        }
    }
}
