use moi_manifest::{ErrorCode, ManifestError, StateMode};
use moi_polo::PoloError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogicError {
    #[error("property '{0}' is not defined")]
    PropertyNotDefined(String),
    #[error("{0} state is not initialized")]
    NotInitialized(StateMode),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage read at slot {slot} failed: {source}")]
    Storage {
        slot: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("codec error: {0}")]
    Codec(#[from] PoloError),
}

impl LogicError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LogicError::PropertyNotDefined(_) => ErrorCode::PropertyNotDefined,
            LogicError::NotInitialized(_) => ErrorCode::NotInitialized,
            LogicError::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            LogicError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            LogicError::Storage { .. } => ErrorCode::Storage,
            LogicError::Manifest(err) => err.code(),
            LogicError::Codec(_) => ErrorCode::Codec,
        }
    }
}
