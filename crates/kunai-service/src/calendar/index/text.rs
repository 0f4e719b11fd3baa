//! Line-oriented indexer for iCalendar text (RFC 5545).

use std::io::{BufRead, BufReader, Read, Seek};

use kunai_rfc::rfc::ical::parse::parse_content_line;

use super::{ComponentFragment, FragmentKind, StructuralIndexer, Structure, rewind};
use crate::error::{ServiceError, ServiceResult};

const CALENDAR: &str = "VCALENDAR";
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// ## Summary
/// Indexes iCalendar text record by record.
///
/// A record starting with whitespace continues the previous one and is never
/// read as a `BEGIN`/`END` marker. Records outside any tracked component are
/// kept verbatim as calendar-level lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextIndexer;

enum Marker<'a> {
    Begin(&'a str),
    End(&'a str),
}

impl<'a> Marker<'a> {
    fn parse(record: &'a str) -> Option<Self> {
        let (name, value) = record.split_once(':')?;
        if name.eq_ignore_ascii_case("BEGIN") {
            Some(Self::Begin(value.trim()))
        } else if name.eq_ignore_ascii_case("END") {
            Some(Self::End(value.trim()))
        } else {
            None
        }
    }
}

/// A tracked component between its `BEGIN` and `END` records.
struct OpenFragment {
    kind: FragmentKind,
    start: u64,
    /// Depth of untracked sub-components (VALARM, STANDARD, ...).
    depth: usize,
    identifier: Option<String>,
    /// Identifier record still collecting folded continuation lines.
    pending: Option<(usize, String)>,
}

impl OpenFragment {
    const fn new(kind: FragmentKind, start: u64) -> Self {
        Self {
            kind,
            start,
            depth: 0,
            identifier: None,
            pending: None,
        }
    }

    fn observe(&mut self, record: &str, line: usize) {
        if self.depth > 0 || self.identifier.is_some() || self.pending.is_some() {
            return;
        }
        let name = record.split([';', ':']).next().unwrap_or_default();
        if self
            .kind
            .identifier_property()
            .is_some_and(|property| property.eq_ignore_ascii_case(name))
        {
            self.pending = Some((line, record.to_string()));
        }
    }

    fn continue_record(&mut self, continuation: &str) {
        if let Some((_, record)) = self.pending.as_mut() {
            record.push_str(continuation);
        }
    }

    fn finish_identifier(&mut self) -> ServiceResult<()> {
        let Some((line, record)) = self.pending.take() else {
            return Ok(());
        };
        let content = parse_content_line(&record, line).map_err(|e| ServiceError::MalformedText {
            line,
            message: e.to_string(),
        })?;
        let value = content.raw_value.trim();
        if !value.is_empty() {
            self.identifier = Some(value.to_string());
        }
        Ok(())
    }
}

/// Strips the single leading whitespace character of a folded line.
fn unfold(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

impl StructuralIndexer for TextIndexer {
    type Fragment = ComponentFragment;

    #[tracing::instrument(skip_all)]
    fn index<R: Read + Seek>(&self, source: &mut R) -> ServiceResult<Structure> {
        rewind(source)?;
        let mut reader = BufReader::new(source);

        let mut structure = Structure::new();
        let mut buf = Vec::new();
        let mut offset = 0_u64;
        let mut line_no = 0_usize;
        let mut open: Option<OpenFragment> = None;
        // Nesting depth of an untracked top-level component being skipped.
        let mut skipping = 0_usize;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            let mut record_start = offset;
            offset += read as u64;
            line_no += 1;

            let mut record = std::str::from_utf8(&buf)
                .map_err(|e| ServiceError::MalformedText {
                    line: line_no,
                    message: e.to_string(),
                })?
                .trim_end_matches(['\r', '\n']);
            if line_no == 1
                && let Some(rest) = record.strip_prefix(BYTE_ORDER_MARK)
            {
                record = rest;
                record_start += BYTE_ORDER_MARK.len_utf8() as u64;
            }
            if record.is_empty() {
                continue;
            }

            if record.starts_with(char::is_whitespace) {
                match open.as_mut() {
                    Some(fragment) => fragment.continue_record(unfold(record)),
                    None if skipping == 0 => structure.push_root_line(record.to_string()),
                    None => {}
                }
                continue;
            }

            if let Some(fragment) = open.as_mut() {
                fragment.finish_identifier()?;
            }

            match Marker::parse(record) {
                Some(Marker::Begin(name)) => {
                    if skipping > 0 {
                        skipping += 1;
                        continue;
                    }
                    let tracked = FragmentKind::from_component_name(name);
                    if let Some(fragment) = open.as_mut() {
                        if let Some(kind) = tracked {
                            return Err(ServiceError::MalformedText {
                                line: line_no,
                                message: format!(
                                    "BEGIN:{kind} inside {} opened at byte {}",
                                    fragment.kind, fragment.start
                                ),
                            });
                        }
                        fragment.depth += 1;
                    } else if let Some(kind) = tracked {
                        open = Some(OpenFragment::new(kind, record_start));
                    } else if name.eq_ignore_ascii_case(CALENDAR) {
                        // Envelope of the whole document.
                    } else {
                        tracing::debug!(
                            component = name,
                            line = line_no,
                            "Skipping untracked component"
                        );
                        skipping = 1;
                    }
                }
                Some(Marker::End(name)) => {
                    if skipping > 0 {
                        skipping -= 1;
                        continue;
                    }
                    match open.take() {
                        Some(mut fragment) if fragment.depth > 0 => {
                            fragment.depth -= 1;
                            open = Some(fragment);
                        }
                        Some(fragment) => {
                            if FragmentKind::from_component_name(name) != Some(fragment.kind) {
                                return Err(ServiceError::MalformedText {
                                    line: line_no,
                                    message: format!("END:{name} closes {}", fragment.kind),
                                });
                            }
                            tracing::debug!(
                                kind = %fragment.kind,
                                identifier = ?fragment.identifier,
                                start = fragment.start,
                                end = offset,
                                "Indexed fragment"
                            );
                            structure.push(
                                fragment.kind,
                                fragment.identifier.clone(),
                                ComponentFragment {
                                    kind: fragment.kind,
                                    identifier: fragment.identifier,
                                    start: fragment.start,
                                    end: offset,
                                    path: None,
                                },
                            );
                        }
                        None if name.eq_ignore_ascii_case(CALENDAR) => {}
                        None => {
                            return Err(ServiceError::MalformedText {
                                line: line_no,
                                message: format!("END:{name} without matching BEGIN"),
                            });
                        }
                    }
                }
                None => match open.as_mut() {
                    Some(fragment) => fragment.observe(record, line_no),
                    None if skipping == 0 => structure.push_root_line(record.to_string()),
                    None => {}
                },
            }
        }

        if let Some(fragment) = open {
            return Err(ServiceError::MalformedText {
                line: line_no,
                message: format!(
                    "{} opened at byte {} is never closed",
                    fragment.kind, fragment.start
                ),
            });
        }
        if skipping > 0 {
            return Err(ServiceError::MalformedText {
                line: line_no,
                message: "untracked component is never closed".to_string(),
            });
        }

        tracing::debug!(
            fragments = structure.fragment_count(),
            root_lines = structure.root_lines().len(),
            "Indexed calendar text"
        );
        Ok(structure)
    }
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
