use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use kunai_rfc::rfc::codec::parse_encoded;
use kunai_rfc::rfc::ical::core::Property;

use super::*;
use crate::store::{MemoryStore, StoreError};

fn timezone(tzid: &str, marker: &str) -> Component {
    let mut timezone = Component::timezone()
        .with_property(Property::text("TZID", tzid))
        .with_property(Property::text("X-MARKER", marker));
    timezone.add_child(
        Component::named("STANDARD")
            .with_property(Property::single("DTSTART", "19701025T030000"))
            .with_property(Property::single("TZOFFSETFROM", "+0200"))
            .with_property(Property::single("TZOFFSETTO", "+0100")),
    );
    timezone
}

fn document(uid: &str, tzid: Option<&str>) -> ICalendar {
    let mut document = ICalendar::new("-//Test//EN");
    if let Some(tzid) = tzid {
        document.add_component(timezone(tzid, uid));
    }
    document.add_component(
        Component::event()
            .with_property(Property::text("UID", uid))
            .with_property(Property::single("DTSTAMP", "20260101T000000Z")),
    );
    document
}

fn export(documents: Vec<ICalendar>, encoding: Encoding) -> String {
    Exporter::new(documents, encoding)
        .collect::<ServiceResult<Vec<_>>>()
        .unwrap()
        .concat()
}

#[test_log::test]
fn text_export_has_fixed_envelope() {
    let output = export(vec![document("a", None)], Encoding::PlainText);

    assert!(output.starts_with(
        "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//IDN nextcloud.com//Calendar App//EN\n"
    ));
    assert!(output.ends_with("END:VCALENDAR\n"));
    assert!(output.contains("UID:a"));
}

#[test_log::test]
fn shared_time_zone_is_emitted_once() {
    let documents = vec![
        document("a", Some("Europe/Berlin")),
        document("b", Some("Europe/Berlin")),
        document("c", Some("America/New_York")),
    ];
    let output = export(documents, Encoding::PlainText);

    assert_eq!(output.matches("BEGIN:VTIMEZONE").count(), 2);
    assert_eq!(output.matches("TZID:Europe/Berlin").count(), 1);
    // First definition wins, and zones follow every other component.
    assert!(output.contains("X-MARKER:a"));
    assert!(!output.contains("X-MARKER:b"));
    let last_event = output.rfind("END:VEVENT").unwrap();
    let first_zone = output.find("BEGIN:VTIMEZONE").unwrap();
    assert!(last_event < first_zone);
}

#[test_log::test]
fn time_zones_without_tzid_are_dropped() {
    let nameless = |uid: &str| {
        let mut document = document(uid, None);
        let mut zone = timezone("unused", uid);
        zone.remove_properties("TZID");
        document.add_component(zone);
        document
    };
    let output = export(vec![nameless("a"), nameless("b")], Encoding::PlainText);

    assert_eq!(output.matches("BEGIN:VEVENT").count(), 2);
    assert!(!output.contains("BEGIN:VTIMEZONE"));
}

#[test_log::test]
fn json_export_is_one_valid_array() {
    let documents = vec![
        document("a", Some("Europe/Berlin")),
        document("b", Some("Europe/Berlin")),
    ];
    let output = export(documents, Encoding::Json);

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value[0], "vcalendar");
    let components = value[2].as_array().unwrap();
    assert_eq!(components.len(), 3);
    assert_eq!(components[2][0], "vtimezone");

    let reparsed = parse_encoded(output.as_bytes(), Encoding::Json).unwrap();
    assert_eq!(reparsed.uids(), ["a", "b"]);
}

#[test_log::test]
fn empty_exports_are_well_formed() {
    for encoding in Encoding::ALL {
        let output = export(Vec::new(), encoding);
        let reparsed = parse_encoded(output.as_bytes(), encoding).unwrap();
        assert!(reparsed.components().is_empty(), "{encoding}");
        assert_eq!(reparsed.version(), Some("2.0"), "{encoding}");
    }
}

#[test_log::test]
fn xml_export_parses_back() {
    let documents = vec![document("a", Some("Europe/Berlin")), document("b", None)];
    let output = export(documents, Encoding::Xml);

    assert!(output.ends_with("</components></vcalendar></icalendar>"));
    let reparsed = parse_encoded(output.as_bytes(), Encoding::Xml).unwrap();
    assert_eq!(reparsed.events().len(), 2);
    assert_eq!(reparsed.timezones().len(), 1);
}

#[test_log::test]
fn chunks_arrive_one_component_at_a_time() {
    let documents = vec![document("a", None), document("b", None)];
    let chunks: Vec<String> = Exporter::new(documents, Encoding::Json)
        .map(Result::unwrap)
        .collect();

    assert_eq!(chunks.len(), 4);
    assert!(chunks[1].starts_with("[\"vevent\""));
    assert!(chunks[2].starts_with(",[\"vevent\""));
}

#[test_log::test(tokio::test)]
async fn stream_yields_the_same_chunks() {
    let documents = vec![document("a", Some("Europe/Berlin"))];
    let expected = export(documents.clone(), Encoding::Xml);

    let chunks: Vec<ServiceResult<String>> = Exporter::new(documents, Encoding::Xml)
        .into_stream()
        .collect()
        .await;
    let streamed: String = chunks.into_iter().map(Result::unwrap).collect();
    assert_eq!(streamed, expected);
}

#[test_log::test(tokio::test)]
async fn store_export_respects_the_count() {
    let store = MemoryStore::new();
    for uid in ["a", "b", "c"] {
        let data = kunai_rfc::rfc::ical::build::serialize(&document(uid, None));
        store.create("work", &format!("{uid}.ics"), &data).await.unwrap();
    }

    let options = ExportOptions::new(Encoding::PlainText).with_range(None, Some(2));
    let exporter = export_calendar(&store, "work", &options);
    assert_eq!(exporter.content_type(), "text/calendar; charset=UTF-8");

    let output: String = exporter.map(Result::unwrap).collect::<Vec<_>>().await.concat();
    assert_eq!(output.matches("BEGIN:VEVENT").count(), 2);
}

#[test_log::test(tokio::test)]
async fn documents_are_pulled_one_at_a_time() {
    let pulled = AtomicUsize::new(0);
    let documents = futures::stream::iter(vec![document("a", None), document("b", None)])
        .inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        })
        .map(Ok::<_, StoreError>);
    let mut chunks = ExportStream::new(documents, Encoding::PlainText);

    let prologue = chunks.next().await.unwrap().unwrap();
    assert!(prologue.starts_with("BEGIN:VCALENDAR"));
    assert_eq!(pulled.load(Ordering::SeqCst), 0);

    assert!(chunks.next().await.unwrap().unwrap().contains("UID:a"));
    assert_eq!(pulled.load(Ordering::SeqCst), 1);

    assert!(chunks.next().await.unwrap().unwrap().contains("UID:b"));
    assert_eq!(pulled.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn store_failure_ends_the_stream() {
    let documents = futures::stream::iter(vec![
        Ok(document("a", None)),
        Err(StoreError::Backend("connection lost".to_string())),
        Ok(document("b", None)),
    ]);

    let chunks: Vec<ServiceResult<String>> =
        ExportStream::new(documents, Encoding::Json).collect().await;
    assert_eq!(chunks.len(), 3);
    assert!(chunks[1].as_ref().unwrap().contains("\"a\""));
    assert!(matches!(chunks[2], Err(crate::error::ServiceError::StoreError(_))));
}

#[test_log::test(tokio::test)]
async fn file_export_writes_the_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.ics");
    let documents = vec![document("a", None), document("b", Some("Europe/Berlin"))];
    let expected = export(documents.clone(), Encoding::PlainText);

    let chunks = Exporter::new(documents, Encoding::PlainText).into_stream();
    let written = export_to_file(chunks, &path).await.unwrap();

    let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(on_disk, expected);
    assert_eq!(written, expected.len() as u64);
}

#[test_log::test(tokio::test)]
async fn writer_export_stops_at_the_first_error() {
    let failing = futures::stream::iter(vec![
        Ok("first".to_string()),
        Err(crate::error::ServiceError::SourceType("boom".to_string())),
        Ok("never".to_string()),
    ]);
    let mut buffer: Vec<u8> = Vec::new();

    let result = export_to_writer(failing, &mut buffer).await;
    assert!(result.is_err());
    assert_eq!(buffer, b"first");
}
