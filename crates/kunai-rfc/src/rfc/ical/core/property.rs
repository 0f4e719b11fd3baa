//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use super::{Parameter, ValueType};

/// A raw content line as parsed from iCalendar text.
///
/// This is the low-level representation before value type resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string (after unfolding, before unescaping).
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a new content line.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            raw_value: value.into(),
        }
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))?
            .value()
    }

    /// Returns the VALUE parameter if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value("VALUE")
    }
}

/// A parsed iCalendar property.
///
/// `values` holds one entry per value. Multi-valued properties (such as
/// `CATEGORIES` or `EXDATE`) carry several entries, structured properties
/// (`GEO`, `REQUEST-STATUS`) carry one entry per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Resolved value type.
    pub value_type: ValueType,
    /// Values in text form. TEXT values are unescaped.
    pub values: Vec<String>,
}

impl Property {
    /// Creates a property with explicit value type and values.
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value_type,
            values,
        }
    }

    /// Creates a property with a single value of the property's default type.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        let value_type = ValueType::default_for(&name);
        Self::new(name, value_type, vec![value.into()])
    }

    /// Creates a property with a text value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ValueType::Text, vec![value.into()])
    }

    /// Adds a parameter, builder style.
    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Sets a parameter, replacing any existing parameter with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Returns the TZID parameter if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value("TZID")
    }

    /// Returns the first value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// ## Summary
    /// Adds a `VALUE` parameter when the value type differs from the
    /// property's default, so that the text form keeps the type.
    ///
    /// Used by the jCal and xCal readers, which carry the type out of band.
    pub fn mark_explicit_type(&mut self) {
        if self.value_type != ValueType::Unknown
            && self.value_type != ValueType::default_for(&self.name)
            && self.get_param("VALUE").is_none()
        {
            self.params
                .insert(0, Parameter::value_type(self.value_type.as_str()));
        }
    }

    /// Returns whether the property's fields are `;`-separated in text form.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        names::is_structured(&self.name)
    }
}

/// Common property names as constants.
pub mod names {
    // Calendar properties
    pub const CALSCALE: &str = "CALSCALE";
    pub const METHOD: &str = "METHOD";
    pub const PRODID: &str = "PRODID";
    pub const VERSION: &str = "VERSION";

    // Calendar component properties
    pub const ATTACH: &str = "ATTACH";
    pub const CATEGORIES: &str = "CATEGORIES";
    pub const CLASS: &str = "CLASS";
    pub const COMMENT: &str = "COMMENT";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const GEO: &str = "GEO";
    pub const LOCATION: &str = "LOCATION";
    pub const PERCENT_COMPLETE: &str = "PERCENT-COMPLETE";
    pub const PRIORITY: &str = "PRIORITY";
    pub const RESOURCES: &str = "RESOURCES";
    pub const STATUS: &str = "STATUS";
    pub const SUMMARY: &str = "SUMMARY";

    // Date and time properties
    pub const COMPLETED: &str = "COMPLETED";
    pub const DTEND: &str = "DTEND";
    pub const DUE: &str = "DUE";
    pub const DTSTART: &str = "DTSTART";
    pub const DURATION: &str = "DURATION";
    pub const FREEBUSY: &str = "FREEBUSY";
    pub const TRANSP: &str = "TRANSP";

    // Timezone properties
    pub const TZID: &str = "TZID";
    pub const TZNAME: &str = "TZNAME";
    pub const TZOFFSETFROM: &str = "TZOFFSETFROM";
    pub const TZOFFSETTO: &str = "TZOFFSETTO";
    pub const TZURL: &str = "TZURL";

    // Relationship properties
    pub const ATTENDEE: &str = "ATTENDEE";
    pub const CONTACT: &str = "CONTACT";
    pub const ORGANIZER: &str = "ORGANIZER";
    pub const RECURRENCE_ID: &str = "RECURRENCE-ID";
    pub const RELATED_TO: &str = "RELATED-TO";
    pub const URL: &str = "URL";
    pub const UID: &str = "UID";

    // Recurrence properties
    pub const EXDATE: &str = "EXDATE";
    pub const RDATE: &str = "RDATE";
    pub const RRULE: &str = "RRULE";

    // Alarm properties
    pub const ACTION: &str = "ACTION";
    pub const REPEAT: &str = "REPEAT";
    pub const TRIGGER: &str = "TRIGGER";

    // Change management properties
    pub const CREATED: &str = "CREATED";
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const LAST_MODIFIED: &str = "LAST-MODIFIED";
    pub const SEQUENCE: &str = "SEQUENCE";

    // Miscellaneous
    pub const REQUEST_STATUS: &str = "REQUEST-STATUS";

    // RFC 7986 extensions
    pub const COLOR: &str = "COLOR";
    pub const CONFERENCE: &str = "CONFERENCE";
    pub const IMAGE: &str = "IMAGE";
    pub const NAME: &str = "NAME";
    pub const REFRESH_INTERVAL: &str = "REFRESH-INTERVAL";
    pub const SOURCE: &str = "SOURCE";

    /// Returns whether the property may carry several comma-separated values.
    #[must_use]
    pub fn is_multi_valued(name: &str) -> bool {
        [CATEGORIES, RESOURCES, EXDATE, RDATE, FREEBUSY]
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Returns whether the property value is a `;`-separated structure.
    #[must_use]
    pub fn is_structured(name: &str) -> bool {
        GEO.eq_ignore_ascii_case(name) || REQUEST_STATUS.eq_ignore_ascii_case(name)
    }
}
