//! Grouping "indexer" for jCal documents (RFC 7265).

use std::io::{Read, Seek};

use kunai_rfc::rfc::ical::core::Component;
use kunai_rfc::rfc::jcal;

use super::{FragmentKind, StructuralIndexer, Structure, rewind};
use crate::error::ServiceResult;

/// ## Summary
/// Parses a jCal document whole and groups its components by identifier.
///
/// jCal has no line or tag boundaries worth scanning, so the fragments are
/// the parsed components themselves. The calendar-level properties become
/// the root entry, without children.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonIndexer;

impl StructuralIndexer for JsonIndexer {
    type Fragment = Component;

    #[tracing::instrument(skip_all)]
    fn index<R: Read + Seek>(&self, source: &mut R) -> ServiceResult<Structure<Component>> {
        rewind(source)?;
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        let mut calendar = jcal::parse(&bytes)?.root;
        let children = std::mem::take(&mut calendar.children);

        let mut structure = Structure::new();
        for component in children {
            let Some(kind) = FragmentKind::from_component_name(&component.name) else {
                tracing::debug!(component = %component.name, "Skipping untracked component");
                continue;
            };
            let identifier = component.identifier().map(str::to_string);
            structure.push(kind, identifier, component);
        }
        structure.set_root(calendar);

        tracing::debug!(
            components = structure.fragment_count(),
            input_len = bytes.len(),
            "Indexed calendar JSON"
        );
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ServiceError;

    const DOCUMENT: &str = r#"["vcalendar",
        [["version",{},"text","2.0"],["prodid",{},"text","-//Test//EN"]],
        [
          ["vevent",[["uid",{},"text","e1"],["summary",{},"text","one"]],[]],
          ["vtimezone",[["tzid",{},"text","Europe/Berlin"]],[]],
          ["vevent",[["uid",{},"text","e1"],["recurrence-id",{},"date-time","2026-01-02T10:00:00Z"]],[]],
          ["vfreebusy",[["uid",{},"text","fb"]],[]]
        ]]"#;

    #[test_log::test]
    fn components_are_grouped_by_identifier() {
        let structure = JsonIndexer
            .index(&mut Cursor::new(DOCUMENT.as_bytes().to_vec()))
            .unwrap();

        let events = structure.groups(FragmentKind::Event);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].members.len(), 2);
        assert!(structure.fragments(FragmentKind::TimeZone, "Europe/Berlin").is_some());
        assert_eq!(structure.fragment_count(), 3);

        let root = structure.root().unwrap();
        assert!(root.children.is_empty());
        assert_eq!(root.properties.len(), 2);
    }

    #[test_log::test]
    fn invalid_json_is_an_rfc_error() {
        let result = JsonIndexer.index(&mut Cursor::new(b"[\"vcalendar\",".to_vec()));
        assert!(matches!(result, Err(ServiceError::RfcError(_))));
    }
}
