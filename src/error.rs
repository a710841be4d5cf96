//! Error and diagnostic types for the verifier.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that occur before rule checking starts.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Contract file could not be read.
    #[error("Could not read contract file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The front-end produced no tree for the file.
    #[error("Abstract syntax tree could not be parsed from file {}", path.display())]
    Parse { path: PathBuf },
}

/// A single rule violation: the first forbidden construct found along the
/// pre-order traversal.
///
/// `Display` renders the full diagnostic line as it appears on standard
/// output. The text of each violation is stable and matched verbatim by the
/// test suite; no color, no trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    message: String,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Violation {
            message: message.into(),
        }
    }

    /// The diagnostic text without the `[ ERROR ] ` prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[ ERROR ] {}", self.message)
    }
}
