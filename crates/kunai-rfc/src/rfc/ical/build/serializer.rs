//! iCalendar serializer (RFC 5545).
//!
//! Serializes the component tree to text, keeping document order.

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::rfc::ical::core::{Component, ICalendar, Parameter, Property, ValueType};

/// Serializes an iCalendar document to a string.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    serialize_component(&ical.root)
}

/// Serializes a component (and its children) to a string.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut result = String::new();
    write_component(&mut result, component);
    result
}

fn write_component(out: &mut String, component: &Component) {
    out.push_str(&fold_line(&format!("BEGIN:{}", component.name)));
    for prop in &component.properties {
        out.push_str(&serialize_property(prop));
    }
    for child in &component.children {
        write_component(out, child);
    }
    out.push_str(&fold_line(&format!("END:{}", component.name)));
}

/// Serializes a property to a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in &prop.params {
        line.push(';');
        line.push_str(&serialize_parameter(param));
    }

    line.push(':');
    line.push_str(&serialize_values(prop));

    fold_line(&line)
}

fn serialize_parameter(param: &Parameter) -> String {
    let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
    format!("{}={}", param.name, values.join(","))
}

fn serialize_values(prop: &Property) -> String {
    let escape = |v: &String| match prop.value_type {
        ValueType::Text => escape_text(v),
        _ => v.clone(),
    };

    if prop.is_structured() {
        prop.values
            .iter()
            .map(|v| escape_text(v))
            .collect::<Vec<_>>()
            .join(";")
    } else {
        prop.values.iter().map(escape).collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::parse::parse;

    #[test]
    fn serialize_escapes_text_values() {
        let prop = Property::text("SUMMARY", "Lunch, then coffee");
        assert_eq!(serialize_property(&prop), "SUMMARY:Lunch\\, then coffee\r\n");
    }

    #[test]
    fn serialize_quotes_parameters() {
        let prop = Property::single("ATTENDEE", "mailto:jane@example.com")
            .with_param(Parameter::new("CN", "Doe, Jane"));
        assert_eq!(
            serialize_property(&prop),
            "ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com\r\n"
        );
    }

    #[test]
    fn serialize_lists_and_structures() {
        let categories = Property::new(
            "CATEGORIES",
            ValueType::Text,
            vec!["A".into(), "B,C".into()],
        );
        assert_eq!(serialize_property(&categories), "CATEGORIES:A,B\\,C\r\n");

        let geo = Property::new("GEO", ValueType::Float, vec!["1.5".into(), "-2.25".into()]);
        assert_eq!(serialize_property(&geo), "GEO:1.5;-2.25\r\n");
    }

    #[test]
    fn round_trip_is_stable() {
        let source = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//T//T//EN\r\nBEGIN:VEVENT\r\n\
                      UID:abc\r\nDTSTART;VALUE=DATE:20260101\r\nEXDATE:20260108T100000Z,20260115T100000Z\r\n\
                      DESCRIPTION:multi\\nline\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let parsed = parse(source).unwrap();
        let text = serialize(&parsed);
        assert_eq!(text, source);
        assert_eq!(parse(&text).unwrap(), parsed);
    }
}
