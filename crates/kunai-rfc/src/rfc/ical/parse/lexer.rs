//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Unfolds physical lines and splits each logical line into name,
//! parameters and raw value.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

/// Splits input into logical content lines.
///
/// Accepts CRLF and bare LF. A line led by SP/HTAB continues the previous
/// one with that single character removed; a line without any colon is
/// glued on as-is. Each entry carries the 1-based number of the physical
/// line it started on.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let continuation = line
            .strip_prefix([' ', '\t'])
            .or_else(|| (!line.contains(':')).then_some(line));
        let Some(rest) = continuation else {
            lines.push((index + 1, line.to_string()));
            continue;
        };
        if let Some((_, previous)) = lines.last_mut() {
            previous.push_str(rest);
        } else {
            lines.push((index + 1, rest.to_string()));
        }
    }

    lines
}

/// Parses a single content line: `name *(";" param) ":" value`.
///
/// ## Errors
/// Returns an error if the line is malformed or contains invalid characters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut cursor = Cursor::new(line, line_num);

    let name = cursor.name(ParseErrorKind::InvalidPropertyName)?;
    if name.is_empty() {
        return Err(cursor.fail_at(ParseErrorKind::MissingPropertyName, 0));
    }

    let mut params = Vec::new();
    loop {
        match cursor.bump() {
            Some(b':') => break,
            Some(b';') => params.push(cursor.parameter()?),
            _ => return Err(cursor.fail_at(ParseErrorKind::MissingColon, line.len())),
        }
    }

    Ok(ContentLine {
        name: name.to_ascii_uppercase(),
        params,
        raw_value: cursor.rest().to_string(),
    })
}

/// Byte cursor over one logical line. Only ASCII delimiters are inspected,
/// so slicing at their offsets stays on char boundaries.
struct Cursor<'a> {
    line: &'a str,
    pos: usize,
    line_num: usize,
}

impl<'a> Cursor<'a> {
    const fn new(line: &'a str, line_num: usize) -> Self {
        Self {
            line,
            pos: 0,
            line_num,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.line.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn fail_at(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, self.line_num, offset + 1)
    }

    /// Consumes a name token (`ALPHA / DIGIT / "-"`), stopping before any
    /// delimiter.
    fn name(&mut self, invalid: ParseErrorKind) -> ParseResult<&'a str> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b';' | b':' | b'=' => break,
                b if b.is_ascii_alphanumeric() || b == b'-' => self.pos += 1,
                _ => return Err(self.fail_at(invalid, self.pos)),
            }
        }
        Ok(&self.line[start..self.pos])
    }

    /// Consumes `name "=" value *("," value)` and leaves the cursor on the
    /// delimiter that ended it.
    fn parameter(&mut self) -> ParseResult<Parameter> {
        let start = self.pos;
        let name = self.name(ParseErrorKind::InvalidParameter)?;
        if name.is_empty() || self.bump() != Some(b'=') {
            return Err(self.fail_at(ParseErrorKind::InvalidParameter, start));
        }

        let mut values = vec![self.param_value()?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            values.push(self.param_value()?);
        }

        match self.peek() {
            Some(b';' | b':') => Ok(Parameter::with_values(name.to_ascii_uppercase(), values)),
            Some(other) => Err(self
                .fail_at(ParseErrorKind::InvalidParameter, self.pos)
                .with_context(format!("unexpected character '{}'", char::from(other)))),
            None => Err(self.fail_at(ParseErrorKind::MissingColon, self.line.len())),
        }
    }

    /// Consumes one parameter value, quoted or bare, decoding RFC 6868 carets.
    fn param_value(&mut self) -> ParseResult<String> {
        if self.peek() != Some(b'"') {
            let start = self.pos;
            while !matches!(self.peek(), None | Some(b',' | b';' | b':')) {
                self.pos += 1;
            }
            return Ok(decode_carets(&self.line[start..self.pos]));
        }

        let open = self.pos;
        self.pos += 1;
        let Some(len) = self.rest().find('"') else {
            return Err(self.fail_at(ParseErrorKind::UnclosedQuote, open));
        };
        let value = decode_carets(&self.line[self.pos..self.pos + len]);
        self.pos += len + 1;
        Ok(value)
    }
}

/// Decodes RFC 6868 caret escapes; unknown escapes are kept verbatim.
fn decode_carets(raw: &str) -> String {
    if !raw.contains('^') {
        return raw.to_string();
    }

    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        let decoded = match (c, chars.peek()) {
            ('^', Some('^')) => '^',
            ('^', Some('n')) => '\n',
            ('^', Some('\'')) => '"',
            _ => {
                value.push(c);
                continue;
            }
        };
        chars.next();
        value.push(decoded);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_unfolds() {
        let input = "DESCRIPTION:This is a long description\r\n  that continues here\r\nUID:1\r\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].1,
            "DESCRIPTION:This is a long description that continues here"
        );
        assert_eq!(lines[1], (3, "UID:1".to_string()));
    }

    #[test]
    fn split_lines_tab_continuation() {
        let lines = split_lines("SUMMARY:First\n\tSecond");
        assert_eq!(lines[0].1, "SUMMARY:FirstSecond");
    }

    #[test]
    fn bare_name_and_value() {
        let line = parse_content_line("summary:Team Meeting", 1).unwrap();
        assert_eq!(line.name, "SUMMARY");
        assert!(line.params.is_empty());
        assert_eq!(line.raw_value, "Team Meeting");
    }

    #[test]
    fn value_keeps_later_colons() {
        let line =
            parse_content_line("DTSTART;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(line.params[0].name, "TZID");
        assert_eq!(line.params[0].value(), Some("America/New_York"));
        assert_eq!(line.raw_value, "20260123T120000");

        let line = parse_content_line("URL:http://example.com:8080/a", 1).unwrap();
        assert_eq!(line.raw_value, "http://example.com:8080/a");
    }

    #[test]
    fn empty_value_after_params() {
        let line = parse_content_line("X-EMPTY;X-P=1:", 1).unwrap();
        assert_eq!(line.raw_value, "");
    }

    #[test]
    fn quoted_and_listed_param_values() {
        let line =
            parse_content_line("ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com", 1).unwrap();
        assert_eq!(line.params[0].value(), Some("Doe, Jane"));
        assert_eq!(line.raw_value, "mailto:jane@example.com");

        let line = parse_content_line(
            "ATTENDEE;ROLE=REQ-PARTICIPANT,OPT-PARTICIPANT;RSVP=TRUE:mailto:a@example.com",
            1,
        )
        .unwrap();
        assert_eq!(line.params[0].values, ["REQ-PARTICIPANT", "OPT-PARTICIPANT"]);
        assert_eq!(line.params[1].value(), Some("TRUE"));
    }

    #[test]
    fn caret_encoding() {
        let line =
            parse_content_line("ATTENDEE;CN=\"Test^nName ^'x^' ^q\":mailto:t@example.com", 1)
                .unwrap();
        assert_eq!(line.params[0].value(), Some("Test\nName \"x\" ^q"));
    }

    #[test]
    fn malformed_lines() {
        let err =
            parse_content_line("ATTENDEE;CN=\"Unclosed:mailto:test@example.com", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);

        let err = parse_content_line("INVALID", 4).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
        assert_eq!(err.line, 4);

        let err = parse_content_line(":value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingPropertyName);

        let err = parse_content_line("BAD NAME:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);

        let err = parse_content_line("X;=1:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidParameter);

        let err = parse_content_line("X;P=\"a\"b:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidParameter);
    }
}
