use std::fmt;

use moi_polo::PoloError;
use thiserror::Error;

/// Taxonomy kind carried by every manifest and logic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnsupportedType,
    UnsupportedOperation,
    InvalidArgument,
    NotFound,
    PropertyNotDefined,
    NotInitialized,
    MissingArgument,
    Codec,
    Storage,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::UnsupportedType => "UNSUPPORTED_TYPE",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PropertyNotDefined => "PROPERTY_NOT_DEFINED",
            ErrorCode::NotInitialized => "NOT_INITIALIZED",
            ErrorCode::MissingArgument => "MISSING_ARGUMENT",
            ErrorCode::Codec => "CODEC_ERROR",
            ErrorCode::Storage => "STORAGE_ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unsupported type '{0}'")]
    UnsupportedType(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("missing argument: expected {expected} argument(s), got {got}")]
    MissingArgument { expected: usize, got: usize },
    #[error("codec error: {0}")]
    Codec(#[from] PoloError),
    #[error("manifest json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ManifestError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ManifestError::UnsupportedType(_) => ErrorCode::UnsupportedType,
            ManifestError::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            ManifestError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ManifestError::NotFound { .. } => ErrorCode::NotFound,
            ManifestError::MissingArgument { .. } => ErrorCode::MissingArgument,
            ManifestError::Codec(_) | ManifestError::Json(_) => ErrorCode::Codec,
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl fmt::Display) -> Self {
        ManifestError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}
