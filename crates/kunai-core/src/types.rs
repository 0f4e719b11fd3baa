use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// ## Summary
/// Wire encoding of a calendar document.
///
/// The `ical`/`jcal`/`xcal` names only appear at the import/export boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    /// Line-oriented text (RFC 5545).
    #[default]
    PlainText,
    /// JSON array encoding (RFC 7265).
    Json,
    /// XML encoding (RFC 6321).
    Xml,
}

impl Encoding {
    pub const ALL: [Self; 3] = [Self::PlainText, Self::Json, Self::Xml];

    /// Returns the short format name used by callers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "ical",
            Self::Json => "jcal",
            Self::Xml => "xcal",
        }
    }

    /// Returns the MIME content type for this encoding.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::PlainText => "text/calendar; charset=UTF-8",
            Self::Json => "application/calendar+json; charset=UTF-8",
            Self::Xml => "application/calendar+xml; charset=UTF-8",
        }
    }

    /// Returns the conventional file extension.
    #[must_use]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::PlainText => "ics",
            Self::Json => "jcs",
            Self::Xml => "xcs",
        }
    }

    /// ## Summary
    /// Resolves an encoding from a file extension (case-insensitive).
    ///
    /// Accepts the conventional extensions as well as the format names.
    #[must_use]
    pub fn from_file_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.file_extension().eq_ignore_ascii_case(extension))
            .or_else(|| extension.parse().ok())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ical" | "ics" | "text" => Ok(Self::PlainText),
            "jcal" | "json" => Ok(Self::Json),
            "xcal" | "xml" => Ok(Self::Xml),
            other => Err(CoreError::UnknownEncoding(other.to_string())),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.as_str().to_string()
    }
}

/// What the import pipeline does when an object fails a structural check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ErrorPolicy {
    /// Record the failure and carry on with the next object.
    Continue,
    /// Stop the whole run on the first failure.
    #[default]
    Abort,
}

impl TryFrom<i64> for ErrorPolicy {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Continue),
            1 => Ok(Self::Abort),
            other => Err(CoreError::InvalidInput(format!(
                "errors option must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<ErrorPolicy> for i64 {
    fn from(value: ErrorPolicy) -> Self {
        match value {
            ErrorPolicy::Continue => 0,
            ErrorPolicy::Abort => 1,
        }
    }
}

/// Whether and how the import pipeline validates objects before storing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ValidatePolicy {
    /// No validation.
    Off,
    /// Record an error for the object and skip it.
    #[default]
    SkipOnIssue,
    /// Stop the whole run.
    FailOnIssue,
}

impl TryFrom<i64> for ValidatePolicy {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::SkipOnIssue),
            2 => Ok(Self::FailOnIssue),
            other => Err(CoreError::InvalidInput(format!(
                "validation option must be between 0 and 2, got {other}"
            ))),
        }
    }
}

impl From<ValidatePolicy> for i64 {
    fn from(value: ValidatePolicy) -> Self {
        match value {
            ValidatePolicy::Off => 0,
            ValidatePolicy::SkipOnIssue => 1,
            ValidatePolicy::FailOnIssue => 2,
        }
    }
}
