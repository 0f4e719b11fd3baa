//! Errors raised while reading iCalendar text.

/// Result alias for the text reader.
pub type ParseResult<T> = Result<T, ParseError>;

/// A failure located at a line and column of the source (both 1-based).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}{}", suffix(.context.as_deref()))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    /// Free-form detail appended to the message.
    pub context: Option<String>,
}

fn suffix(context: Option<&str>) -> String {
    context.map(|c| format!(": {c}")).unwrap_or_default()
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }
}

/// What went wrong on the offending line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("missing property name")]
    MissingPropertyName,
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("missing colon separator")]
    MissingColon,
    #[error("invalid parameter format")]
    InvalidParameter,
    #[error("unclosed quoted string")]
    UnclosedQuote,
    /// Content before the first `BEGIN` line.
    #[error("missing BEGIN line")]
    MissingBegin,
    /// Input ended with components still open.
    #[error("missing END line")]
    MissingEnd,
    #[error("mismatched BEGIN/END")]
    MismatchedComponent,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
