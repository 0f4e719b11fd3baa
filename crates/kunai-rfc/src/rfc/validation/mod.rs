//! ## Summary
//! Calendar object validation and best-effort repair.
//!
//! The import pipeline only orchestrates these rules: it validates, asks for
//! a repair when anything was found, validates again and then counts the
//! issues at or above [`Severity::Error`].

mod rules;

pub use rules::CalendarValidator;

use crate::rfc::ical::core::ICalendar;

/// Issue severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational; also used for issues a repair pass fixed.
    Notice = 1,
    Warning = 2,
    Error = 3,
}

impl Severity {
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn repaired(message: impl Into<String>) -> Self {
        Self::new(Severity::Notice, message)
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

/// Rule set to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// RFC 5545 rules only.
    Standard,
    /// RFC 5545 plus the single-object rules of a CalDAV resource (RFC 4791 §4.1).
    #[default]
    CalDav,
}

/// ## Summary
/// Validates calendar objects and repairs what can be repaired.
pub trait Validator: Send + Sync {
    /// Reports every issue found, without modifying the document.
    fn validate(&self, ical: &ICalendar, profile: Profile) -> Vec<Issue>;

    /// Fixes what can be fixed in place and reports each fix as a notice.
    fn repair(&self, ical: &mut ICalendar) -> Vec<Issue>;
}

/// Returns the issues at or above `threshold`.
#[must_use]
pub fn at_least(issues: Vec<Issue>, threshold: Severity) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|issue| issue.severity >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_level() {
        assert!(Severity::Error > Severity::Warning);
        assert_eq!(Severity::Error.level(), 3);
        assert_eq!(Severity::Notice.level(), 1);
    }

    #[test]
    fn at_least_filters_below_threshold() {
        let issues = vec![
            Issue::repaired("fixed"),
            Issue::warning("meh"),
            Issue::error("broken"),
        ];
        let kept = at_least(issues, Severity::Error);
        assert_eq!(kept, vec![Issue::error("broken")]);
    }
}
