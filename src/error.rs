//! Error taxonomy for a fitting run.
//!
//! Every failure surfaced to the caller carries exactly one [`ErrorKind`],
//! so the host shell can map it onto its own error signaling without parsing
//! messages. There is no retry or recovery anywhere: the first error aborts
//! the run and nothing is partially committed to the result.

use crate::engine::EngineError;

/// Failure category for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input shape/type/cardinality violations detected before the engine runs:
    /// wrong rank, wrong element type, mask/size mismatch, malformed record field.
    Validation,
    /// A record field could not be classified: neither textual nor numeric,
    /// an integer scalar, or a matrix option with an unsupported element type.
    Classification,
    /// Temporary file or directory creation failed.
    Resource,
    /// Any failure raised by the engine itself, including numerical failures
    /// inside its fitting routine and unknown model names.
    Engine,
    /// Anything unanticipated.
    Unknown,
}

impl ErrorKind {
    /// Stable category string for host-side dispatch.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Classification => "classification",
            ErrorKind::Resource => "resource",
            ErrorKind::Engine => "engine",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Process exit code used by the CLI front-end.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::Classification => 3,
            ErrorKind::Resource => 4,
            ErrorKind::Engine => 5,
            ErrorKind::Unknown => 6,
        }
    }
}

#[derive(Clone)]
pub struct RunError {
    kind: ErrorKind,
    message: String,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn classification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Classification, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

/// The single translation point for engine-raised failures.
///
/// Engine internals report through [`EngineError`]; everything that crosses
/// into this layer becomes `ErrorKind::Engine` with the message preserved,
/// keeping the taxonomy exhaustive.
impl From<EngineError> for RunError {
    fn from(e: EngineError) -> Self {
        RunError::new(ErrorKind::Engine, e.to_string())
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::fmt::Debug for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for RunError {}
