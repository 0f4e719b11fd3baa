//! iCalendar document parser (RFC 5545).
//!
//! Parses complete iCalendar documents into the component tree.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::{split_unescaped, unescape_text};
use crate::rfc::ical::core::{
    Component, ComponentKind, ContentLine, ICalendar, Property, ValueType, names,
};

type Lines = std::iter::Peekable<std::vec::IntoIter<(usize, ContentLine)>>;

/// Parses an iCalendar document from a string.
///
/// ## Errors
///
/// Returns an error if the input is not valid iCalendar.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    tracing::trace!("Parsing iCalendar document");

    let root = parse_component_text(input)?;

    if root.kind != Some(ComponentKind::Calendar) {
        tracing::warn!(name = %root.name, "Root component is not VCALENDAR");
        return Err(
            ParseError::new(ParseErrorKind::MissingBegin, 1, 1).with_context("expected VCALENDAR")
        );
    }

    Ok(ICalendar { root })
}

/// ## Summary
/// Parses the first `BEGIN`/`END` block of the input, whatever its name.
///
/// ## Errors
///
/// Returns an error if a content line is malformed or the block is unbalanced.
pub fn parse_component_text(input: &str) -> ParseResult<Component> {
    let lines = split_lines(input);

    if lines.is_empty() {
        tracing::warn!("Empty iCalendar input");
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }

    let content_lines: Vec<(usize, ContentLine)> = lines
        .into_iter()
        .map(|(line_num, line)| parse_content_line(&line, line_num).map(|cl| (line_num, cl)))
        .collect::<ParseResult<_>>()?;

    tracing::trace!(count = content_lines.len(), "Parsed content lines");

    let mut iter = content_lines.into_iter().peekable();
    let (line_num, begin_line) = iter
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;

    if begin_line.name != "BEGIN" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1));
    }

    parse_component_body(&mut iter, line_num, &begin_line.raw_value)
}

/// Parses a component whose BEGIN line has already been consumed.
fn parse_component_body(
    iter: &mut Lines,
    begin_line_num: usize,
    component_name: &str,
) -> ParseResult<Component> {
    let mut component = Component::named(component_name);
    let mut last_line_num = begin_line_num;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(
                ParseError::new(ParseErrorKind::MissingEnd, last_line_num, 1)
                    .with_context(format!("missing END:{}", component.name)),
            );
        };
        last_line_num = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let nested = parse_component_body(iter, line_num, &content_line.raw_value)?;
                component.children.push(nested);
            }
            "END" => {
                let end_name = content_line.raw_value.to_ascii_uppercase();
                if end_name != component.name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{}, got END:{end_name}",
                                component.name
                            )),
                    );
                }
                break;
            }
            _ => component.properties.push(property_from_line(content_line)),
        }
    }

    Ok(component)
}

/// Builds a property from a content line, resolving its value type and values.
fn property_from_line(cl: ContentLine) -> Property {
    let value_type = ValueType::resolve(&cl.name, cl.value_type(), &cl.raw_value);
    let raw = cl.raw_value.as_str();

    let values = if names::is_structured(&cl.name) {
        split_unescaped(raw, ';')
            .into_iter()
            .map(unescape_text)
            .collect()
    } else if names::is_multi_valued(&cl.name) {
        split_unescaped(raw, ',')
            .into_iter()
            .map(|v| match value_type {
                ValueType::Text => unescape_text(v),
                _ => v.to_string(),
            })
            .collect()
    } else if value_type == ValueType::Text {
        vec![unescape_text(raw)]
    } else {
        vec![raw.to_string()]
    };

    Property {
        name: cl.name,
        params: cl.params,
        value_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        PRODID:-//Test//Test//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:abc\r\n\
        DTSTART;TZID=Europe/Berlin:20260123T120000\r\n\
        SUMMARY:Lunch\\, then coffee\r\n\
        CATEGORIES:WORK,FOOD\\,DRINK\r\n\
        GEO:37.386013;-122.082932\r\n\
        BEGIN:VALARM\r\n\
        ACTION:DISPLAY\r\n\
        TRIGGER:-PT15M\r\n\
        END:VALARM\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test_log::test]
    fn parse_simple_calendar() {
        let ical = parse(SIMPLE).unwrap();
        assert_eq!(ical.version(), Some("2.0"));

        let event = &ical.components()[0];
        assert_eq!(event.kind, Some(ComponentKind::Event));
        assert_eq!(event.uid(), Some("abc"));
        assert_eq!(event.summary(), Some("Lunch, then coffee"));
        assert_eq!(event.children[0].kind, Some(ComponentKind::Alarm));

        let dtstart = event.get_property("DTSTART").unwrap();
        assert_eq!(dtstart.value_type, ValueType::DateTime);
        assert_eq!(dtstart.tzid(), Some("Europe/Berlin"));

        let categories = event.get_property("CATEGORIES").unwrap();
        assert_eq!(categories.values, ["WORK", "FOOD,DRINK"]);

        let geo = event.get_property("GEO").unwrap();
        assert_eq!(geo.value_type, ValueType::Float);
        assert_eq!(geo.values, ["37.386013", "-122.082932"]);
    }

    #[test]
    fn parse_bare_lf_without_trailing_newline() {
        let ical = parse("BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:t\nEND:VTODO\nEND:VCALENDAR").unwrap();
        assert_eq!(ical.components()[0].uid(), Some("t"));
    }

    #[test]
    fn mismatched_end_is_reported_with_line() {
        let err = parse("BEGIN:VCALENDAR\nBEGIN:VEVENT\nEND:VTODO\nEND:VCALENDAR").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedComponent);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn missing_end_is_reported() {
        let err = parse("BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:x\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);
    }

    #[test]
    fn non_calendar_root_is_rejected() {
        assert!(parse("BEGIN:VEVENT\nUID:x\nEND:VEVENT\n").is_err());
        let component = parse_component_text("BEGIN:VEVENT\nUID:x\nEND:VEVENT\n").unwrap();
        assert_eq!(component.uid(), Some("x"));
    }
}
