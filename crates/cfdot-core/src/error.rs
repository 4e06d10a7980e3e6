// crates/cfdot-core/src/error.rs - User-visible failures and their exit codes
//
// Every command returns exactly one of these (or succeeds). The kind decides
// the exit code and whether the usage banner is shown:
//
//   Validation  → 3, usage shown
//   Remote      → 4, usage hidden   (record store, transport, deadline)
//   LockService → 4, usage hidden
//   Component   → 4, usage hidden   (cell workers)
//   NotFound    → 5, usage hidden
//
// Anything that is not a CfdotError is an internal failure and exits with -1.

use thiserror::Error;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_VALIDATION: i32 = 3;
pub const EXIT_REMOTE: i32 = 4;
pub const EXIT_NOT_FOUND: i32 = 5;
pub const EXIT_INTERNAL: i32 = -1;

/// Which boundary produced the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Remote,
    LockService,
    Component,
    NotFound,
}

/// A failure with a message meant for the operator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CfdotError {
    kind: ErrorKind,
    message: String,
}

/// Result type for anything that can fail in front of the operator
pub type CfdotResult<T> = Result<T, CfdotError>;

impl CfdotError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Bad arguments, flags, environment, files, URLs or JSON
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Record store rejected the call or could not be reached
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Remote, message)
    }

    pub fn lock_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LockService, message)
    }

    /// One or more cell workers failed
    pub fn component(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Component, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::Validation => EXIT_VALIDATION,
            ErrorKind::Remote | ErrorKind::LockService | ErrorKind::Component => EXIT_REMOTE,
            ErrorKind::NotFound => EXIT_NOT_FOUND,
        }
    }

    /// Usage text is only useful when the operator typed something wrong
    pub fn silence_usage(&self) -> bool {
        self.kind != ErrorKind::Validation
    }
}

/// Map the outcome of a command to the process exit code
pub fn exit_code(result: &anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => err
            .downcast_ref::<CfdotError>()
            .map(CfdotError::exit_code)
            .unwrap_or(EXIT_INTERNAL),
    }
}
