// crates/cfdot-core/src/bbs/error.rs - Record store failures

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::error::CfdotError;

/// Numeric error type carried by record store responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ErrorType(pub i32);

impl ErrorType {
    pub const UNKNOWN_ERROR: ErrorType = ErrorType(0);
    pub const INVALID_RESPONSE: ErrorType = ErrorType(5);
    pub const INVALID_JSON: ErrorType = ErrorType(7);
    pub const RESOURCE_NOT_FOUND: ErrorType = ErrorType(15);
    pub const DESERIALIZE: ErrorType = ErrorType(27);

    /// Symbolic name; codes the table does not know render as UnknownError
    pub fn name(self) -> &'static str {
        match self.0 {
            3 => "InvalidRecord",
            4 => "InvalidRequest",
            5 => "InvalidResponse",
            6 => "InvalidProtobufMessage",
            7 => "InvalidJSON",
            8 => "FailedToOpenEnvelope",
            9 => "InvalidStateTransition",
            11 => "Unauthorized",
            13 => "ResourceConflict",
            14 => "ResourceExists",
            15 => "ResourceNotFound",
            16 => "RouterError",
            17 => "ActualLRPCannotBeClaimed",
            18 => "ActualLRPCannotBeStarted",
            19 => "ActualLRPCannotBeCrashed",
            20 => "ActualLRPCannotBeFailed",
            21 => "ActualLRPCannotBeRemoved",
            22 => "ActualLRPCannotBeUnclaimed",
            24 => "RunningOnDifferentCell",
            26 => "GUIDGeneration",
            27 => "Deserialize",
            28 => "Deadlock",
            29 => "Unrecoverable",
            30 => "LockCollision",
            31 => "Timeout",
            _ => "UnknownError",
        }
    }
}

impl Default for ErrorType {
    fn default() -> Self {
        Self::UNKNOWN_ERROR
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0, self.name())
    }
}

/// Errors from talking to the record store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BbsError {
    /// The server answered with a typed error
    #[error("BBS error\nType {error_type}\nMessage: {message}")]
    Api { error_type: ErrorType, message: String },

    /// The request never produced a usable response
    #[error("BBS error: {0}")]
    Transport(String),
}

/// Result type for record store calls
pub type BbsResult<T> = Result<T, BbsError>;

impl BbsError {
    pub fn api(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::Api {
            error_type,
            message: message.into(),
        }
    }

    pub fn invalid_status(status: u16) -> Self {
        Self::api(
            ErrorType::INVALID_RESPONSE,
            format!("Invalid Response with status code: {status}"),
        )
    }

    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            Self::Api { error_type, .. } => Some(*error_type),
            Self::Transport(_) => None,
        }
    }
}

impl From<BbsError> for CfdotError {
    fn from(err: BbsError) -> Self {
        CfdotError::remote(err.to_string())
    }
}
