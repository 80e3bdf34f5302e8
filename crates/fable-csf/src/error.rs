use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for CSF analysis operations.
pub type Result<T> = std::result::Result<T, CsfError>;

/// A `(line, col)` source position derived from an AST node.
///
/// Lines are 1-based, columns are 0-based character counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line {}, col {})", self.line, self.col)
    }
}

/// Error variants for CSF module analysis.
///
/// The enum is closed on purpose: callers batch-processing thousands of
/// story files pattern-match on the failure kind to decide what to log
/// and what to surface.
#[derive(Debug, Error)]
pub enum CsfError {
    /// No meta was found, or the default export is not object-shaped.
    #[error("CSF: missing default export{}", location_suffix(location))]
    NoMeta { location: Option<Location> },

    /// More than one meta-defining construct in one module.
    #[error("CSF: multiple meta objects{}", location_suffix(location))]
    MultipleMeta { location: Option<Location> },

    /// Factory-style and plain-style story exports mixed in one module.
    #[error("CSF: {message}{}", location_suffix(location))]
    MixedFactory {
        message: String,
        location: Option<Location>,
    },

    /// A `meta()` factory call whose configuration object does not come
    /// from a recognized preview-configuration import.
    #[error("CSF: {message}{}", location_suffix(location))]
    BadMeta {
        message: String,
        location: Option<Location>,
    },

    /// Malformed module content that fits none of the dedicated kinds.
    #[error("CSF: {message}{}", location_suffix(location))]
    Invalid {
        message: String,
        location: Option<Location>,
    },

    /// Parsing the source with OXC failed.
    #[error("failed to parse{}: {message}", file_name.as_deref().map(|f| format!(" '{f}'")).unwrap_or_default())]
    Parse {
        file_name: Option<String>,
        message: String,
    },

    /// Failed to read a source file from disk.
    #[error("failed to read source '{}': {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl CsfError {
    pub fn no_meta(location: Option<Location>) -> Self {
        Self::NoMeta { location }
    }

    pub fn multiple_meta(location: Option<Location>) -> Self {
        Self::MultipleMeta { location }
    }

    pub fn mixed_factory(message: impl Into<String>, location: Option<Location>) -> Self {
        Self::MixedFactory {
            message: message.into(),
            location,
        }
    }

    pub fn bad_meta(message: impl Into<String>, location: Option<Location>) -> Self {
        Self::BadMeta {
            message: message.into(),
            location,
        }
    }

    pub fn invalid(message: impl Into<String>, location: Option<Location>) -> Self {
        Self::Invalid {
            message: message.into(),
            location,
        }
    }
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" {loc}"),
        None => String::new(),
    }
}

/// Precomputed line starts for deriving a [`Location`] from a byte offset.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    pub fn location(&self, source: &str, offset: u32) -> Location {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => Location {
                line: line + 1,
                col: 0,
            },
            Err(0) => Location {
                line: 1,
                col: offset as usize,
            },
            Err(next) => {
                let line_start = self.line_starts[next - 1] as usize;
                let col = source
                    .get(line_start..offset as usize)
                    .map(|slice| slice.chars().count())
                    .unwrap_or(offset as usize - line_start);
                Location { line: next, col }
            }
        }
    }
}
