//! ## Summary
//! Turns indexed fragments back into self-contained calendar documents,
//! one logical object at a time.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use kunai_core::constants::{XML_CALENDAR_OPEN, XML_IMPORT_PREFIX, XML_IMPORT_SUFFIX};
use kunai_core::error::CoreError;
use kunai_core::types::Encoding;
use kunai_rfc::rfc::codec::parse_encoded;
use kunai_rfc::rfc::ical::core::{Component, ComponentKind, ICalendar, Property, names};

use super::index::{
    ComponentFragment, FragmentKind, Group, GroupKey, GroupMap, Indexed, Structure,
};
use crate::error::{ServiceError, ServiceResult};

const TEXT_OPEN: &str = "BEGIN:VCALENDAR\r\n";
const TEXT_CLOSE: &str = "END:VCALENDAR\r\n";

/// One logical object: every fragment sharing an identifier, plus the time
/// zones they reference, as a single document.
#[derive(Debug, Clone)]
pub struct AssembledObject {
    pub key: GroupKey,
    pub kind: FragmentKind,
    pub document: ICalendar,
}

impl AssembledObject {
    /// Returns the identifier, or `anonymous-<n>` for groups without one.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.key.to_string()
    }
}

/// Orders groups by assembly kind, keeping first-seen order within a kind.
fn object_queue<T>(mut groups: GroupMap<T>) -> Vec<(FragmentKind, Group<T>)> {
    FragmentKind::OBJECTS
        .into_iter()
        .flat_map(|kind| {
            groups
                .remove(&kind)
                .unwrap_or_default()
                .into_iter()
                .map(move |group| (kind, group))
        })
        .collect()
}

/// ## Summary
/// Adds a copy of every time zone the document references and lacks.
///
/// References without a matching definition are skipped.
fn attach_timezones(document: &mut ICalendar, timezones: &HashMap<String, Component>) {
    let mut referenced: Vec<String> = Vec::new();
    for component in document.components() {
        for tzid in component.referenced_tzids() {
            if !referenced.iter().any(|seen| seen == tzid) {
                referenced.push(tzid.to_string());
            }
        }
    }

    for tzid in referenced {
        let present = document
            .timezones()
            .iter()
            .any(|tz| tz.tzid() == Some(tzid.as_str()));
        if present {
            continue;
        }
        match timezones.get(&tzid) {
            Some(timezone) => document.add_component(timezone.clone()),
            None => tracing::trace!(%tzid, "Referenced time zone has no definition"),
        }
    }
}

/// Format-specific wrapping that makes extracted fragments parseable.
struct Envelope {
    open: Vec<u8>,
    close: &'static str,
}

impl Envelope {
    fn wrap(&self, body: &[u8]) -> Vec<u8> {
        let mut document = Vec::with_capacity(self.open.len() + body.len() + self.close.len());
        document.extend_from_slice(&self.open);
        document.extend_from_slice(body);
        document.extend_from_slice(self.close.as_bytes());
        document
    }
}

fn read_fragment<R: Read + Seek>(
    source: &mut R,
    fragment: &ComponentFragment,
) -> ServiceResult<Vec<u8>> {
    let len =
        usize::try_from(fragment.len()).map_err(|e| ServiceError::SourceType(e.to_string()))?;
    source.seek(SeekFrom::Start(fragment.start))?;
    let mut bytes = vec![0; len];
    source.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// ## Summary
/// Assembles objects from byte-range fragments of a text or XML source.
///
/// Time zones are materialized up front and kept in memory; everything else
/// is read from the source lazily, one group per iteration. The source is
/// borrowed for the lifetime of the assembler.
pub struct ObjectAssembler<'a, R> {
    source: &'a mut R,
    encoding: Encoding,
    envelope: Envelope,
    timezones: HashMap<String, Component>,
    queue: std::vec::IntoIter<(FragmentKind, Group<ComponentFragment>)>,
}

impl<'a, R: Read + Seek> ObjectAssembler<'a, R> {
    /// ## Summary
    /// Prepares assembly and materializes every identified time zone.
    ///
    /// A time zone whose fragment does not parse is skipped with a warning;
    /// objects referencing it are assembled without it.
    ///
    /// ## Errors
    /// Returns an error for JSON (which has no byte ranges) and if the
    /// source cannot be read.
    #[tracing::instrument(skip(structure, source), fields(fragments = structure.fragment_count()))]
    pub fn new(
        structure: Structure,
        source: &'a mut R,
        encoding: Encoding,
    ) -> ServiceResult<Self> {
        let (mut groups, root_lines, root) = structure.into_parts();

        let envelope = match encoding {
            Encoding::PlainText => {
                let mut open = TEXT_OPEN.as_bytes().to_vec();
                for line in &root_lines {
                    open.extend_from_slice(line.as_bytes());
                    open.extend_from_slice(b"\r\n");
                }
                Envelope { open, close: TEXT_CLOSE }
            }
            Encoding::Xml => {
                let open = match &root {
                    Some(fragment) => {
                        let mut open = XML_CALENDAR_OPEN.as_bytes().to_vec();
                        open.extend(read_fragment(source, fragment)?);
                        open.extend_from_slice(b"<components>");
                        open
                    }
                    None => XML_IMPORT_PREFIX.as_bytes().to_vec(),
                };
                Envelope { open, close: XML_IMPORT_SUFFIX }
            }
            Encoding::Json => {
                return Err(CoreError::InvalidInput(
                    "JSON sources are assembled from parsed components".to_string(),
                )
                .into());
            }
        };

        let mut assembler = Self {
            source,
            encoding,
            envelope,
            timezones: HashMap::new(),
            queue: Vec::new().into_iter(),
        };

        for group in groups.remove(&FragmentKind::TimeZone).unwrap_or_default() {
            let GroupKey::Identified(tzid) = &group.key else {
                continue;
            };
            match assembler.materialize(&group.members) {
                Ok(document) => {
                    if let Some(timezone) = document
                        .root
                        .children
                        .into_iter()
                        .find(|c| c.kind == Some(ComponentKind::Timezone))
                    {
                        assembler.timezones.entry(tzid.clone()).or_insert(timezone);
                    }
                }
                Err(ServiceError::RfcError(e)) => {
                    tracing::warn!(%tzid, error = %e, "Skipping unparseable time zone");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(timezones = assembler.timezones.len(), "Materialized time zones");
        assembler.queue = object_queue(groups).into_iter();
        Ok(assembler)
    }

    /// Time zones available for attachment, by `TZID`.
    #[must_use]
    pub const fn timezones(&self) -> &HashMap<String, Component> {
        &self.timezones
    }

    fn materialize(&mut self, fragments: &[ComponentFragment]) -> ServiceResult<ICalendar> {
        let mut body = Vec::new();
        for fragment in fragments {
            body.extend(read_fragment(self.source, fragment)?);
            if self.encoding == Encoding::PlainText && !body.ends_with(b"\n") {
                body.extend_from_slice(b"\r\n");
            }
        }
        Ok(parse_encoded(&self.envelope.wrap(&body), self.encoding)?)
    }

    fn assemble(
        &mut self,
        kind: FragmentKind,
        group: Group<ComponentFragment>,
    ) -> ServiceResult<AssembledObject> {
        let mut document = match self.materialize(&group.members) {
            Ok(document) => document,
            Err(ServiceError::RfcError(source)) => {
                return Err(ServiceError::ObjectParse {
                    identifier: group.key.to_string(),
                    source,
                });
            }
            Err(e) => return Err(e),
        };
        attach_timezones(&mut document, &self.timezones);

        tracing::debug!(
            identifier = %group.key,
            %kind,
            fragments = group.members.len(),
            "Assembled object"
        );
        Ok(AssembledObject {
            key: group.key,
            kind,
            document,
        })
    }
}

impl<R: Read + Seek> Iterator for ObjectAssembler<'_, R> {
    type Item = ServiceResult<AssembledObject>;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, group) = self.queue.next()?;
        Some(self.assemble(kind, group))
    }
}

/// ## Summary
/// Assembles objects from the parsed components of a JSON source.
///
/// Each document carries only the calendar's `VERSION` and `PRODID`, the
/// group's components and the time zones they reference.
pub struct ParsedAssembler {
    header: Vec<Property>,
    timezones: HashMap<String, Component>,
    queue: std::vec::IntoIter<(FragmentKind, Group<Component>)>,
}

impl ParsedAssembler {
    #[must_use]
    pub fn new(structure: Structure<Component>) -> Self {
        let (mut groups, _, root) = structure.into_parts();

        let header = root
            .map(|root| {
                root.properties
                    .into_iter()
                    .filter(|p| {
                        p.name.eq_ignore_ascii_case(names::VERSION)
                            || p.name.eq_ignore_ascii_case(names::PRODID)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut timezones = HashMap::new();
        for group in groups.remove(&FragmentKind::TimeZone).unwrap_or_default() {
            if let GroupKey::Identified(tzid) = group.key
                && let Some(timezone) = group.members.into_iter().next()
            {
                timezones.entry(tzid).or_insert(timezone);
            }
        }

        Self {
            header,
            timezones,
            queue: object_queue(groups).into_iter(),
        }
    }
}

impl Iterator for ParsedAssembler {
    type Item = ServiceResult<AssembledObject>;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, group) = self.queue.next()?;

        let mut document = ICalendar::empty();
        document.root.properties.clone_from(&self.header);
        for component in group.members {
            document.add_component(component);
        }
        attach_timezones(&mut document, &self.timezones);

        tracing::debug!(identifier = %group.key, %kind, "Assembled object");
        Some(Ok(AssembledObject {
            key: group.key,
            kind,
            document,
        }))
    }
}

/// Assembler over either kind of indexed source.
pub enum Assembler<'a, R> {
    Ranges(ObjectAssembler<'a, R>),
    Parsed(ParsedAssembler),
}

impl<R: Read + Seek> Iterator for Assembler<'_, R> {
    type Item = ServiceResult<AssembledObject>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Ranges(assembler) => assembler.next(),
            Self::Parsed(assembler) => assembler.next(),
        }
    }
}

/// ## Summary
/// Builds the assembler matching an indexing result.
///
/// ## Errors
/// Returns an error if time zones cannot be read from the source.
pub fn assemble<R: Read + Seek>(
    indexed: Indexed,
    source: &mut R,
    encoding: Encoding,
) -> ServiceResult<Assembler<'_, R>> {
    Ok(match indexed {
        Indexed::Ranges(structure) => {
            Assembler::Ranges(ObjectAssembler::new(structure, source, encoding)?)
        }
        Indexed::Parsed(structure) => Assembler::Parsed(ParsedAssembler::new(structure)),
    })
}

#[cfg(test)]
#[path = "assemble_tests.rs"]
mod tests;
