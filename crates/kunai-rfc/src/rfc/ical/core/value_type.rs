//! Property value types (RFC 5545 §3.3).

use super::names;

/// Value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    Date,
    DateTime,
    Duration,
    Float,
    Integer,
    Period,
    Recur,
    Text,
    Time,
    Uri,
    UtcOffset,
    Unknown,
}

impl ValueType {
    /// Parses a `VALUE` parameter or a jCal/xCal type name (case-insensitive).
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "BINARY" => Self::Binary,
            "BOOLEAN" => Self::Boolean,
            "CAL-ADDRESS" => Self::CalAddress,
            "DATE" => Self::Date,
            "DATE-TIME" => Self::DateTime,
            "DURATION" => Self::Duration,
            "FLOAT" => Self::Float,
            "INTEGER" => Self::Integer,
            "PERIOD" => Self::Period,
            "RECUR" => Self::Recur,
            "TEXT" => Self::Text,
            "TIME" => Self::Time,
            "URI" => Self::Uri,
            "UTC-OFFSET" => Self::UtcOffset,
            _ => Self::Unknown,
        }
    }

    /// Returns the `VALUE` parameter spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::CalAddress => "CAL-ADDRESS",
            Self::Date => "DATE",
            Self::DateTime => "DATE-TIME",
            Self::Duration => "DURATION",
            Self::Float => "FLOAT",
            Self::Integer => "INTEGER",
            Self::Period => "PERIOD",
            Self::Recur => "RECUR",
            Self::Text => "TEXT",
            Self::Time => "TIME",
            Self::Uri => "URI",
            Self::UtcOffset => "UTC-OFFSET",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns the lowercase name used by jCal type slots and xCal value elements.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::CalAddress => "cal-address",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Duration => "duration",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Period => "period",
            Self::Recur => "recur",
            Self::Text => "text",
            Self::Time => "time",
            Self::Uri => "uri",
            Self::UtcOffset => "utc-offset",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the default value type of a property when no `VALUE` parameter is given.
    #[must_use]
    pub fn default_for(property: &str) -> Self {
        match property.to_ascii_uppercase().as_str() {
            names::DTSTART
            | names::DTEND
            | names::DTSTAMP
            | names::CREATED
            | names::LAST_MODIFIED
            | names::COMPLETED
            | names::DUE
            | names::RECURRENCE_ID
            | names::EXDATE
            | names::RDATE => Self::DateTime,
            names::DURATION | names::TRIGGER | names::REFRESH_INTERVAL => Self::Duration,
            names::PERCENT_COMPLETE | names::PRIORITY | names::REPEAT | names::SEQUENCE => {
                Self::Integer
            }
            names::GEO => Self::Float,
            names::RRULE | "EXRULE" => Self::Recur,
            names::TZOFFSETFROM | names::TZOFFSETTO => Self::UtcOffset,
            names::URL | names::TZURL | names::SOURCE | names::ATTACH | names::IMAGE
            | names::CONFERENCE => Self::Uri,
            names::FREEBUSY => Self::Period,
            names::ATTENDEE | names::ORGANIZER => Self::CalAddress,
            _ => Self::Text,
        }
    }

    /// ## Summary
    /// Determines the value type of a parsed text property.
    ///
    /// An explicit `VALUE` parameter wins. Otherwise the property default is
    /// refined by the shape of the raw value for the few properties that are
    /// commonly written without a `VALUE` parameter.
    #[must_use]
    pub fn resolve(property: &str, explicit: Option<&str>, raw: &str) -> Self {
        if let Some(explicit) = explicit {
            return Self::from_param(explicit);
        }

        let default = Self::default_for(property);
        match default {
            Self::DateTime => {
                let first = raw.split(',').next().unwrap_or_default();
                if first.contains('/') {
                    Self::Period
                } else if first.len() == 8 && !first.contains('T') {
                    Self::Date
                } else {
                    Self::DateTime
                }
            }
            Self::Duration => {
                if raw.starts_with(['P', '-', '+']) {
                    Self::Duration
                } else {
                    Self::DateTime
                }
            }
            other => other,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
