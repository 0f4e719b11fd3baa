//! Built-in validation rules.

use std::collections::HashSet;

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::{Issue, Profile, Validator};
use crate::rfc::ical::core::{Component, ComponentKind, ICalendar, Property, ValueType, names};

/// Properties that MUST NOT occur more than once in a VEVENT, VTODO or
/// VJOURNAL (RFC 5545 §3.6.1-3.6.3).
const SINGLE_INSTANCE_PROPERTIES: &[&str] = &[
    names::DTSTAMP,
    names::UID,
    names::CLASS,
    names::CREATED,
    names::DESCRIPTION,
    names::DTSTART,
    names::GEO,
    names::LAST_MODIFIED,
    names::LOCATION,
    names::ORGANIZER,
    names::PRIORITY,
    names::SEQUENCE,
    names::STATUS,
    names::SUMMARY,
    names::TRANSP,
    names::URL,
    names::RECURRENCE_ID,
    names::DTEND,
    names::DUE,
    names::DURATION,
    names::COMPLETED,
    names::PERCENT_COMPLETE,
];

/// Format of DTSTAMP values inserted by a repair.
const DTSTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// ## Summary
/// Default RFC 5545 / RFC 4791 rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarValidator;

impl CalendarValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Validator for CalendarValidator {
    #[tracing::instrument(skip_all, fields(components = ical.components().len()))]
    fn validate(&self, ical: &ICalendar, profile: Profile) -> Vec<Issue> {
        let mut issues = Vec::new();

        if ical.version().is_none() {
            issues.push(Issue::error("VCALENDAR is missing VERSION"));
        }
        if ical.prodid().is_none() {
            issues.push(Issue::warning("VCALENDAR is missing PRODID"));
        }

        for component in ical.components() {
            match component.kind {
                Some(ComponentKind::Timezone) => check_timezone(component, &mut issues),
                Some(kind) if kind.is_schedulable() => check_schedulable(component, &mut issues),
                _ => {}
            }
            check_values(component, &mut issues);
        }

        if profile == Profile::CalDav {
            check_caldav_object(ical, &mut issues);
        }

        tracing::trace!(count = issues.len(), "Validation finished");
        issues
    }

    #[tracing::instrument(skip_all)]
    fn repair(&self, ical: &mut ICalendar) -> Vec<Issue> {
        let mut repaired = Vec::new();

        if ical.version().is_none() {
            ical.set_header(Property::text(names::VERSION, kunai_core::constants::CALENDAR_VERSION));
            repaired.push(Issue::repaired("Inserted VERSION"));
        }
        if ical.prodid().is_none() {
            ical.set_header(Property::text(names::PRODID, kunai_core::constants::EXPORT_PRODID));
            repaired.push(Issue::repaired("Inserted PRODID"));
        }
        if ical.root.remove_properties(names::METHOD) > 0 {
            repaired.push(Issue::repaired("Removed METHOD"));
        }

        for component in &mut ical.root.children {
            if component.kind.is_some_and(ComponentKind::is_schedulable) {
                repair_schedulable(component, &mut repaired);
            }
        }

        tracing::debug!(count = repaired.len(), "Repair finished");
        repaired
    }
}

fn label(component: &Component) -> String {
    match component.uid() {
        Some(uid) => format!("{} {uid}", component.name),
        None => component.name.clone(),
    }
}

fn check_schedulable(component: &Component, issues: &mut Vec<Issue>) {
    let label = label(component);

    if !component.has_property(names::UID) {
        issues.push(Issue::error(format!("{label} is missing UID")));
    }
    if !component.has_property(names::DTSTAMP) {
        issues.push(Issue::warning(format!("{label} is missing DTSTAMP")));
    }

    let end = match component.kind {
        Some(ComponentKind::Todo) => names::DUE,
        _ => names::DTEND,
    };
    if component.has_property(end) && component.has_property(names::DURATION) {
        issues.push(Issue::error(format!(
            "{label} has both {end} and DURATION"
        )));
    }

    for name in SINGLE_INSTANCE_PROPERTIES {
        let count = component.get_properties(name).len();
        if count > 1 {
            issues.push(Issue::error(format!(
                "{label} has {count} {name} properties, at most one is allowed"
            )));
        }
    }
}

fn repair_schedulable(component: &mut Component, repaired: &mut Vec<Issue>) {
    let label = label(component);

    if !component.has_property(names::DTSTAMP) {
        let now = Utc::now().format(DTSTAMP_FORMAT).to_string();
        component.add_property(Property::new(
            names::DTSTAMP,
            ValueType::DateTime,
            vec![now],
        ));
        repaired.push(Issue::repaired(format!("Inserted DTSTAMP into {label}")));
    }

    let end = match component.kind {
        Some(ComponentKind::Todo) => names::DUE,
        _ => names::DTEND,
    };
    if component.has_property(end) && component.remove_properties(names::DURATION) > 0 {
        repaired.push(Issue::repaired(format!("Removed DURATION from {label}")));
    }

    for name in SINGLE_INSTANCE_PROPERTIES {
        let mut seen = false;
        let before = component.properties.len();
        component.properties.retain(|p| {
            if !p.name.eq_ignore_ascii_case(name) {
                return true;
            }
            !std::mem::replace(&mut seen, true)
        });
        let dropped = before - component.properties.len();
        if dropped > 0 {
            repaired.push(Issue::repaired(format!(
                "Dropped {dropped} duplicate {name} from {label}"
            )));
        }
    }
}

fn check_timezone(component: &Component, issues: &mut Vec<Issue>) {
    let Some(tzid) = component.tzid() else {
        issues.push(Issue::error("VTIMEZONE is missing TZID"));
        return;
    };

    let has_rules = !component.children_of_kind(ComponentKind::Standard).is_empty()
        || !component.children_of_kind(ComponentKind::Daylight).is_empty();
    if !has_rules {
        issues.push(Issue::error(format!(
            "VTIMEZONE {tzid} has neither STANDARD nor DAYLIGHT"
        )));
    }
}

/// Checks typed values of a component and its sub-components.
fn check_values(component: &Component, issues: &mut Vec<Issue>) {
    for prop in &component.properties {
        for value in &prop.values {
            if let Some(problem) = value_problem(prop.value_type, value) {
                issues.push(Issue::error(format!(
                    "{} in {}: {problem}",
                    prop.name,
                    label(component)
                )));
            }
        }
    }
    for child in &component.children {
        check_values(child, issues);
    }
}

fn value_problem(value_type: ValueType, value: &str) -> Option<String> {
    let valid = match value_type {
        ValueType::Date => is_date(value),
        ValueType::DateTime => is_date_time(value),
        ValueType::Time => is_time(value),
        ValueType::Period => value
            .split_once('/')
            .is_some_and(|(start, _)| is_date_time(start)),
        ValueType::Integer => value.trim().parse::<i64>().is_ok(),
        ValueType::Binary => base64::engine::general_purpose::STANDARD
            .decode(value.trim())
            .is_ok(),
        _ => return None,
    };

    (!valid).then(|| format!("'{value}' is not a valid {}", value_type.wire_name()))
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y%m%d").is_ok()
}

fn is_date_time(value: &str) -> bool {
    let local = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S").is_ok()
}

fn is_time(value: &str) -> bool {
    let local = value.strip_suffix('Z').unwrap_or(value);
    NaiveTime::parse_from_str(local, "%H%M%S").is_ok()
}

/// RFC 4791 §4.1: one object per resource, one UID, no METHOD.
fn check_caldav_object(ical: &ICalendar, issues: &mut Vec<Issue>) {
    if ical.header(names::METHOD).is_some() {
        issues.push(Issue::error(
            "METHOD is not allowed in a calendar object resource",
        ));
    }

    let mut kinds = HashSet::new();
    let mut uids = HashSet::new();
    for component in ical.components() {
        if component.kind == Some(ComponentKind::Timezone) {
            continue;
        }
        kinds.insert(component.name.as_str());
        if let Some(uid) = component.uid() {
            uids.insert(uid);
        }
    }

    if kinds.len() > 1 {
        issues.push(Issue::error(
            "Calendar object mixes several component types",
        ));
    }
    if uids.len() > 1 {
        issues.push(Issue::error(format!(
            "Calendar object carries {} different UIDs",
            uids.len()
        )));
    }
}
