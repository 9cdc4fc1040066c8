//! Error abstractions.

use thiserror::Error;
use tonic::{Code, Status};

/// Application error variants.
///
/// These mirror the error kinds surfaced by the external services this
/// controller talks to (topology, the replicated KV map & P4Runtime), and are
/// the kinds the reconcilers branch on.
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The object being created already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The given input was invalid.
    #[error("invalid: {0}")]
    Invalid(String),
    /// A concurrent writer advanced the object past the revision we hold.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The remote service could not be reached or is not ready.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The operation was canceled or timed out.
    #[error("canceled: {0}")]
    Canceled(String),
    /// A stream terminated with EOF.
    ///
    /// gRPC streams in Rust surface end-of-stream as a normal `None` item, so
    /// this kind only appears where a transport hands back a raw EOF.
    #[allow(dead_code)]
    #[error("unexpected EOF on stream")]
    Eof,
    /// Unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a gRPC status into the local error taxonomy.
    pub fn from_status(status: Status) -> Self {
        let msg = status.message().to_string();
        match status.code() {
            Code::NotFound => Self::NotFound(msg),
            Code::AlreadyExists => Self::AlreadyExists(msg),
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => Self::Invalid(msg),
            Code::Aborted => Self::Conflict(msg),
            Code::Unavailable => Self::Unavailable(msg),
            Code::Cancelled | Code::DeadlineExceeded => Self::Canceled(msg),
            _ => Self::Internal(msg),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    #[allow(dead_code)]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

impl From<Status> for AppError {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

/// A result type used throughout the reconciliation layers.
pub type AppResult<T> = ::std::result::Result<T, AppError>;
