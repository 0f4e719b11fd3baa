use thiserror::Error;

use crate::rfc::ical::parse::ParseError;

/// RFC parsing and validation errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("iCalendar parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("jCal structure error: {0}")]
    JCalError(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("xCal structure error: {0}")]
    XCalError(String),

    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),
}

impl From<quick_xml::Error> for RfcError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlError(e.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for RfcError {
    fn from(e: quick_xml::encoding::EncodingError) -> Self {
        Self::XmlError(e.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for RfcError {
    fn from(e: quick_xml::escape::EscapeError) -> Self {
        Self::XmlError(e.to_string())
    }
}

impl From<std::io::Error> for RfcError {
    fn from(e: std::io::Error) -> Self {
        Self::XmlError(e.to_string())
    }
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
