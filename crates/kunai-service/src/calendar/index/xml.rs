//! Tag-boundary indexer for xCal documents (RFC 6321).

use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use super::{ComponentFragment, FragmentKind, StructuralIndexer, Structure, rewind};
use crate::error::{ServiceError, ServiceResult};

/// Depth of the identifier element below its component: xCal nests every
/// property inside a `<properties>` wrapper (`<vevent><properties><uid>`).
pub const IDENTIFIER_DEPTH_OFFSET: usize = 2;

const PROPERTIES: &str = "properties";
const CALENDAR: &str = "vcalendar";

/// ## Summary
/// Indexes an xCal document with a forward-only tag scanner.
///
/// Element names are compared by local name, lowercased, so namespace
/// prefixes are ignored. The `<properties>` element of `vcalendar` is
/// recorded as the [`FragmentKind::CalendarRoot`] fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlIndexer;

struct ScanFailure {
    position: u64,
    message: String,
}

impl ScanFailure {
    fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

struct OpenComponent {
    kind: FragmentKind,
    start: u64,
    depth: usize,
    path: String,
    identifier: Option<String>,
    /// Depth of the identifier element being read, and its text so far.
    capture: Option<(usize, String)>,
}

impl OpenComponent {
    fn captures(&self, name: &str, depth: usize) -> bool {
        self.identifier.is_none()
            && self.capture.is_none()
            && depth == self.depth + IDENTIFIER_DEPTH_OFFSET
            && self
                .kind
                .identifier_property()
                .is_some_and(|property| property.eq_ignore_ascii_case(name))
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, captured)) = self.capture.as_mut() {
            captured.push_str(text);
        }
    }

    fn fragment(self, end: u64) -> ComponentFragment {
        ComponentFragment {
            kind: self.kind,
            identifier: self.identifier,
            start: self.start,
            end,
            path: Some(self.path),
        }
    }
}

#[derive(Default)]
struct Scanner {
    structure: Structure,
    path: Vec<String>,
    open: Option<OpenComponent>,
    root_start: Option<u64>,
}

impl Scanner {
    fn enter(&mut self, name: String, start: u64) -> Result<(), ScanFailure> {
        self.path.push(name);
        let depth = self.path.len();
        let name = &self.path[depth - 1];
        let tracked = FragmentKind::from_component_name(name);

        if let Some(open) = self.open.as_mut() {
            if let Some(kind) = tracked {
                return Err(ScanFailure::new(
                    start,
                    format!("<{name}> ({kind}) inside an open {}", open.kind),
                ));
            }
            if open.captures(name, depth) {
                open.capture = Some((depth, String::new()));
            }
        } else if let Some(kind) = tracked {
            self.open = Some(OpenComponent {
                kind,
                start,
                depth,
                path: self.path[..depth - 1].join("/"),
                identifier: None,
                capture: None,
            });
        } else if name == PROPERTIES && self.parent_is(CALENDAR) {
            self.root_start = Some(start);
        }
        Ok(())
    }

    fn leave(&mut self, end: u64) -> Result<(), ScanFailure> {
        let depth = self.path.len();
        let name = self
            .path
            .pop()
            .ok_or_else(|| ScanFailure::new(end, "end tag without start tag"))?;

        if let Some(open) = self.open.as_mut() {
            if let Some((capture_depth, text)) = open.capture.take() {
                if capture_depth == depth {
                    let text = text.trim();
                    if !text.is_empty() {
                        open.identifier = Some(text.to_string());
                    }
                } else {
                    open.capture = Some((capture_depth, text));
                }
            }
            if depth == open.depth
                && let Some(open) = self.open.take()
            {
                tracing::debug!(
                    kind = %open.kind,
                    identifier = ?open.identifier,
                    start = open.start,
                    end,
                    "Indexed fragment"
                );
                let identifier = open.identifier.clone();
                self.structure.push(open.kind, identifier, open.fragment(end));
            }
        } else if name == PROPERTIES
            && self.parent_is_last(CALENDAR)
            && let Some(start) = self.root_start.take()
        {
            self.structure.set_root(ComponentFragment {
                kind: FragmentKind::CalendarRoot,
                identifier: None,
                start,
                end,
                path: Some(self.path.join("/")),
            });
        }
        Ok(())
    }

    /// Parent of the element on top of the path stack.
    fn parent_is(&self, name: &str) -> bool {
        self.path.len() >= 2 && self.path[self.path.len() - 2] == name
    }

    /// Top of the path stack, after the current element was popped.
    fn parent_is_last(&self, name: &str) -> bool {
        self.path.last().is_some_and(|last| last == name)
    }

    fn capturing(&self) -> bool {
        self.open.as_ref().is_some_and(|open| open.capture.is_some())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(open) = self.open.as_mut() {
            open.push_text(text);
        }
    }
}

fn element_name(raw: &[u8], position: u64) -> Result<String, ScanFailure> {
    std::str::from_utf8(raw)
        .map(str::to_ascii_lowercase)
        .map_err(|e| ScanFailure::new(position, e.to_string()))
}

fn scan<B: BufRead>(input: B) -> Result<Structure, ScanFailure> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(false);

    let mut scanner = Scanner::default();
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(ScanFailure::new(reader.error_position(), e.to_string())),
        };
        let after = reader.buffer_position();

        match event {
            Event::Start(e) => {
                let start = after - (e.len() as u64 + 2);
                scanner.enter(element_name(e.local_name().as_ref(), start)?, start)?;
            }
            Event::Empty(e) => {
                // `<name/>`: enter and leave without content.
                let start = after - (e.len() as u64 + 3);
                scanner.enter(element_name(e.local_name().as_ref(), start)?, start)?;
                scanner.leave(after)?;
            }
            Event::End(_) => scanner.leave(after)?,
            Event::Text(e) if scanner.capturing() => {
                let text = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(|e| ScanFailure::new(after, e.to_string()))?;
                scanner.push_text(&text);
            }
            Event::CData(e) if scanner.capturing() => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| ScanFailure::new(after, e.to_string()))?;
                scanner.push_text(text);
            }
            Event::GeneralRef(e) if scanner.capturing() => {
                match e.resolve_char_ref() {
                    Ok(Some(ch)) => scanner.push_text(ch.encode_utf8(&mut [0; 4])),
                    Ok(None) => {
                        let entity = reader
                            .decoder()
                            .decode(e.as_ref())
                            .map_err(|e| ScanFailure::new(after, e.to_string()))?;
                        let resolved = quick_xml::escape::resolve_predefined_entity(&entity)
                            .ok_or_else(|| {
                                ScanFailure::new(after, format!("unknown entity &{entity};"))
                            })?;
                        scanner.push_text(resolved);
                    }
                    Err(e) => return Err(ScanFailure::new(after, e.to_string())),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = scanner.path.last() {
        return Err(ScanFailure::new(
            reader.buffer_position(),
            format!("unexpected end of document inside <{open}>"),
        ));
    }
    Ok(scanner.structure)
}

/// Returns the 1-based line holding the byte at `position`.
fn line_at<R: Read + Seek>(source: &mut R, position: u64) -> ServiceResult<usize> {
    rewind(source)?;
    let mut reader = BufReader::new(source.by_ref().take(position));
    let mut newlines = 0;
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        newlines += chunk.iter().filter(|&&b| b == b'\n').count();
        let consumed = chunk.len();
        reader.consume(consumed);
    }
    Ok(newlines + 1)
}

impl StructuralIndexer for XmlIndexer {
    type Fragment = ComponentFragment;

    #[tracing::instrument(skip_all)]
    fn index<R: Read + Seek>(&self, source: &mut R) -> ServiceResult<Structure> {
        rewind(source)?;

        match scan(BufReader::new(source.by_ref())) {
            Ok(structure) => {
                tracing::debug!(
                    fragments = structure.fragment_count(),
                    has_root = structure.root().is_some(),
                    "Indexed calendar XML"
                );
                Ok(structure)
            }
            Err(failure) => {
                let line = line_at(source, failure.position)?;
                tracing::warn!(line, error = %failure.message, "Malformed calendar XML");
                Err(ServiceError::MalformedXml {
                    line,
                    message: failure.message,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
