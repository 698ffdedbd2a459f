//! Error types for sinklab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

use crate::experiment::Conflict;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which document collection an identifier was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Experiment collection
    Experiment,
    /// Participant collection
    Participant,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Experiment => f.write_str("Experiment"),
            Self::Participant => f.write_str("Participant"),
        }
    }
}

/// sinklab error types
#[derive(Error, Debug)]
pub enum Error {
    /// No document exists for the identifier
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Collection that was searched
        kind: DocumentKind,
        /// Identifier that was looked up
        id: String,
    },

    /// The participant is in the wrong lifecycle state for the request
    #[error("{0}")]
    Conflict(Conflict),

    /// A conditional write matched no document.
    ///
    /// Either another request changed the participant between the state
    /// check and the write, or the participant was deleted in between.
    #[error("Conditional write on participant {id} matched no document\nThe participant changed concurrently; re-read it before retrying")]
    WriteConflict {
        /// Participant the write targeted
        id: String,
    },

    /// The store failed while persisting a transition or an append
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The store failed for a reason unrelated to any precondition
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// The experiment's declared url cannot be turned into an origin
    #[error("Malformed origin {url:?}: {reason}")]
    MalformedOrigin {
        /// Declared url as stored on the experiment
        url: String,
        /// What was wrong with it
        reason: String,
    },

    /// Malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a missing experiment.
    #[must_use]
    pub fn experiment_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: DocumentKind::Experiment,
            id: id.into(),
        }
    }

    /// Shorthand for a missing participant.
    #[must_use]
    pub fn participant_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: DocumentKind::Participant,
            id: id.into(),
        }
    }
}

impl From<Conflict> for Error {
    fn from(conflict: Conflict) -> Self {
        Self::Conflict(conflict)
    }
}
