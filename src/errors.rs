use std::time::Duration;

use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum GiftError {
    /// Represents a value outside one of the closed choice lists.
    #[error("Unknown {kind}: {value:?}")]
    UnknownChoice { kind: &'static str, value: String },

    /// Represents a catalog that breaks one of its invariants.
    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    /// Represents a catalog file that could not be read.
    #[error("Could not read catalog file")]
    CatalogIo { source: std::io::Error },

    /// Represents a catalog file that could not be parsed.
    #[error("Could not parse catalog file")]
    CatalogParse { source: serde_json::Error },

    /// Represents a results view opened without a submitted profile.
    #[error("No preferences were submitted")]
    MissingProfile,

    /// Represents a session ID that could not be parsed.
    #[error("Invalid session ID: {id:?}")]
    InvalidSessionId { id: String },

    /// Represents a session that does not exist (any more).
    #[error("No such session")]
    SessionNotFound,

    /// Represents a gift that is not part of the current results.
    #[error("No gift {id} in these results")]
    GiftNotFound { id: u32 },

    /// Represents an operation that took longer than allowed.
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    /// Represents a recommendation backend that refused a request.
    #[error("Recommendation backend error: {0}")]
    Backend(String),
}

/// Why a submitted draft did not turn into recommendations. The draft
/// survives every one of these and the submission can be retried.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SubmissionFailure {
    #[error("The request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("The request was cancelled")]
    Cancelled,

    #[error("The request was rejected: {0}")]
    Rejected(String),
}

/// Required fields that are still missing from a draft.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("Missing required fields: {}", .missing.join(", "))]
pub struct Incomplete {
    pub missing: Vec<&'static str>,
}
