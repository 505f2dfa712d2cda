use thiserror::Error;

/// Main error type for cuttle operations
#[derive(Error, Debug)]
pub enum CuttleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {path}:{line}: {reason}")]
    Parse {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("term not found: {0}")]
    TermNotFound(String),
}

/// Result type alias for cuttle operations
pub type Result<T> = std::result::Result<T, CuttleError>;

impl CuttleError {
    /// Build a `Parse` error carrying file and line context.
    pub fn parse(path: impl std::fmt::Display, line: u64, reason: impl Into<String>) -> Self {
        CuttleError::Parse {
            path: path.to_string(),
            line,
            reason: reason.into(),
        }
    }

    /// True for the normal query-path miss (unknown term), which callers
    /// may want to report and continue past rather than abort on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CuttleError::TermNotFound(_))
    }
}
