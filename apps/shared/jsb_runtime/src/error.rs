use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Outcome delivered for every evaluation request
///
/// `Ok(None)` means the script completed without producing a value.
pub type EvalOutcome = Result<Option<String>>;

/// Structured description of a script exception
///
/// Each field is empty when the engine did not provide it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, line: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: line.into(),
            message: message.into(),
        }
    }
}

// Log scrapers depend on this exact shape.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid javascript context '{0}'")]
    InvalidContext(String),

    #[error("{0}")]
    Evaluation(Diagnostic),

    #[error("Failed to load script '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not enough arguments (expected {expected}, was {actual})")]
    NotEnoughArguments { expected: usize, actual: usize },

    #[error("No page engine attached")]
    NoPage,

    #[error("Page evaluation failed: {0}")]
    Page(String),

    #[error("JavaScript engine error: {0}")]
    Engine(String),

    #[error("Request was dropped before it completed")]
    Abandoned,
}

impl BridgeError {
    /// The diagnostic carried by an evaluation failure
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            BridgeError::Evaluation(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

#[cfg(feature = "js")]
impl From<rquickjs::Error> for BridgeError {
    fn from(error: rquickjs::Error) -> Self {
        BridgeError::Engine(error.to_string())
    }
}

/// Check that a command received at least `expected` arguments
///
/// Used by command layers in front of the bridge so malformed requests are
/// reported through the same completion channel as evaluation failures.
pub fn require_args<T>(args: &[T], expected: usize) -> Result<()> {
    if args.len() < expected {
        return Err(BridgeError::NotEnoughArguments {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}
