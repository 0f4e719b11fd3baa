use thiserror::Error;

use crate::calendar::import::ImportRejection;
use crate::store::StoreError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Source is not a seekable byte stream: {0}")]
    SourceType(String),

    #[error("Malformed calendar text at line {line}: {message}")]
    MalformedText { line: usize, message: String },

    #[error("Malformed calendar XML at line {line}: {message}")]
    MalformedXml { line: usize, message: String },

    #[error("Failed to parse object {identifier}: {source}")]
    ObjectParse {
        identifier: String,
        #[source]
        source: kunai_rfc::error::RfcError,
    },

    #[error("Import rejected: {0}")]
    Rejected(ImportRejection),

    #[error("Validation failed for {uid}: {message}")]
    Validation { uid: String, message: String },

    #[error(transparent)]
    RfcError(#[from] kunai_rfc::error::RfcError),

    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
