use std::io::Cursor;

use kunai_core::types::Encoding;
use kunai_rfc::rfc::ical::core::{Component, Property};
use kunai_rfc::rfc::validation::CalendarValidator;

use super::*;
use crate::store::MemoryStore;

const CALENDAR: &str = "work";

const SINGLE: &str = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:abc\r\nEND:VEVENT\r\nEND:VCALENDAR";

async fn import(
    input: &str,
    options: ImportOptions,
    store: &MemoryStore,
) -> ServiceResult<ImportOutcome> {
    let mut source = Cursor::new(input.as_bytes().to_vec());
    import_calendar(&mut source, options, store, &CalendarValidator::new(), CALENDAR).await
}

fn continue_on_error() -> ImportOptions {
    ImportOptions::new(Encoding::PlainText).with_error_policy(ErrorPolicy::Continue)
}

#[test_log::test(tokio::test)]
async fn single_event_is_created() {
    let store = MemoryStore::new();
    let outcome = import(SINGLE, ImportOptions::default(), &store).await.unwrap();

    assert_eq!(outcome.len(), 1);
    assert_eq!(outcome.get("abc"), Some(&ObjectOutcome::Created));
    assert_eq!(store.uids(CALENDAR).await, ["abc"]);
}

#[test_log::test(tokio::test)]
async fn source_with_byte_order_mark_is_created() {
    let store = MemoryStore::new();
    let input = format!("\u{FEFF}{SINGLE}");
    let outcome = import(&input, continue_on_error(), &store).await.unwrap();

    assert_eq!(outcome.get("abc"), Some(&ObjectOutcome::Created));
    assert_eq!(store.uids(CALENDAR).await, ["abc"]);
}

#[test_log::test(tokio::test)]
async fn reimport_without_supersede_reports_exists() {
    let store = MemoryStore::new();
    let options = ImportOptions::default();

    let first = import(SINGLE, options, &store).await.unwrap();
    let second = import(SINGLE, options, &store).await.unwrap();

    assert_eq!(first.get("abc"), Some(&ObjectOutcome::Created));
    assert_eq!(second.get("abc"), Some(&ObjectOutcome::Exists));
    assert_eq!(store.len(CALENDAR).await, 1);
}

#[test_log::test(tokio::test)]
async fn reimport_with_supersede_updates() {
    let store = MemoryStore::new();
    let options = ImportOptions::default().with_supersede(true);

    import(SINGLE, options, &store).await.unwrap();
    let changed = SINGLE.replace("UID:abc", "UID:abc\r\nSUMMARY:changed");
    let second = import(&changed, options, &store).await.unwrap();

    assert_eq!(second.get("abc"), Some(&ObjectOutcome::Updated));
    let object_id = store.find_by_uid(CALENDAR, "abc").await.unwrap().unwrap();
    assert!(store.get(CALENDAR, &object_id).await.unwrap().data.contains("SUMMARY:changed"));
}

#[test_log::test(tokio::test)]
async fn override_without_master_goes_to_nbct() {
    let input = "BEGIN:VCALENDAR\r\n\
                 BEGIN:VEVENT\r\nUID:orphan\r\nRECURRENCE-ID:20260102T100000Z\r\nEND:VEVENT\r\n\
                 BEGIN:VEVENT\r\nUID:fine\r\nEND:VEVENT\r\n\
                 END:VCALENDAR\r\n";
    let store = MemoryStore::new();

    let outcome = import(input, continue_on_error(), &store).await.unwrap();
    assert!(matches!(outcome.get(NO_BASE_COMPONENT_KEY), Some(ObjectOutcome::Error(m)) if m[0].starts_with("orphan")));
    assert_eq!(outcome.get("fine"), Some(&ObjectOutcome::Created));
    assert_eq!(store.uids(CALENDAR).await, ["fine"]);

    let store = MemoryStore::new();
    let err = import(input, ImportOptions::default(), &store).await.unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(ImportRejection::NoBaseComponents)));
    assert!(store.is_empty(CALENDAR).await);
}

#[test_log::test(tokio::test)]
async fn objects_without_uid_go_to_noid() {
    let input = "BEGIN:VCALENDAR\r\n\
                 BEGIN:VTODO\r\nSUMMARY:one\r\nEND:VTODO\r\n\
                 BEGIN:VTODO\r\nSUMMARY:two\r\nEND:VTODO\r\n\
                 END:VCALENDAR\r\n";
    let store = MemoryStore::new();

    let outcome = import(input, continue_on_error(), &store).await.unwrap();
    match outcome.get(MISSING_UID_KEY) {
        Some(ObjectOutcome::Error(messages)) => assert_eq!(messages.len(), 2),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.summary().errors, 2);
}

#[test_log::test]
fn mixed_base_components_are_rejected() {
    let mut document = ICalendar::empty();
    document.add_component(Component::event().with_property(Property::text("UID", "a")));
    document.add_component(Component::todo().with_property(Property::text("UID", "a")));

    assert_eq!(check_structure(&document), Err(ImportRejection::MixedComponentTypes));
    assert_eq!(ImportRejection::MixedComponentTypes.key(), "mbct");
}

const INVALID: &str = "BEGIN:VCALENDAR\r\n\
                       BEGIN:VEVENT\r\nUID:bad\r\nDTSTART:20261399T990000Z\r\nEND:VEVENT\r\n\
                       END:VCALENDAR\r\n";

#[test_log::test(tokio::test)]
async fn invalid_object_is_skipped() {
    let store = MemoryStore::new();
    let outcome = import(INVALID, ImportOptions::default(), &store).await.unwrap();

    assert!(matches!(outcome.get("bad"), Some(ObjectOutcome::Error(m)) if m[0].contains("DTSTART")));
    assert!(store.is_empty(CALENDAR).await);
}

#[test_log::test(tokio::test)]
async fn invalid_object_fails_the_run() {
    let store = MemoryStore::new();
    let options = ImportOptions::default().with_validate_policy(ValidatePolicy::FailOnIssue);

    let err = import(INVALID, options, &store).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { ref uid, .. } if uid == "bad"));
}

#[test_log::test(tokio::test)]
async fn validation_off_imports_as_is() {
    let store = MemoryStore::new();
    let options = ImportOptions::default().with_validate_policy(ValidatePolicy::Off);

    let outcome = import(INVALID, options, &store).await.unwrap();
    assert_eq!(outcome.get("bad"), Some(&ObjectOutcome::Created));
}

#[test_log::test(tokio::test)]
async fn repairable_issues_are_fixed_before_storing() {
    let input = "BEGIN:VCALENDAR\r\nMETHOD:PUBLISH\r\n\
                 BEGIN:VEVENT\r\nUID:r\r\nDTSTART:20260101T100000Z\r\nDTEND:20260101T110000Z\r\nDURATION:PT1H\r\nEND:VEVENT\r\n\
                 END:VCALENDAR\r\n";
    let store = MemoryStore::new();

    let outcome = import(input, ImportOptions::default(), &store).await.unwrap();
    assert_eq!(outcome.get("r"), Some(&ObjectOutcome::Created));

    let object_id = store.find_by_uid(CALENDAR, "r").await.unwrap().unwrap();
    let data = store.get(CALENDAR, &object_id).await.unwrap().data;
    assert!(!data.contains("METHOD"));
    assert!(!data.contains("DURATION"));
    assert!(data.contains("DTSTAMP"));
    assert!(data.contains("VERSION:2.0"));
}

const UNPARSEABLE: &str = "BEGIN:VCALENDAR\r\n\
                           BEGIN:VEVENT\r\nUID:broken\r\nDTSTART;TZID=\"Europe/Berlin:20260101T100000\r\nEND:VEVENT\r\n\
                           BEGIN:VEVENT\r\nUID:fine\r\nEND:VEVENT\r\n\
                           END:VCALENDAR\r\n";

#[test_log::test(tokio::test)]
async fn unparseable_object_follows_the_error_policy() {
    let store = MemoryStore::new();
    let outcome = import(UNPARSEABLE, continue_on_error(), &store).await.unwrap();
    assert!(matches!(outcome.get("broken"), Some(ObjectOutcome::Error(_))));
    assert_eq!(outcome.get("fine"), Some(&ObjectOutcome::Created));

    let store = MemoryStore::new();
    let err = import(UNPARSEABLE, ImportOptions::default(), &store).await.unwrap_err();
    assert!(matches!(err, ServiceError::ObjectParse { ref identifier, .. } if identifier == "broken"));
}

#[test_log::test(tokio::test)]
async fn malformed_source_always_propagates() {
    let store = MemoryStore::new();
    let options = ImportOptions::new(Encoding::Xml).with_error_policy(ErrorPolicy::Continue);
    let mut source = Cursor::new(b"<icalendar><vcalendar></icalendar>".to_vec());

    let err = import_calendar(&mut source, options, &store, &CalendarValidator::new(), CALENDAR)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedXml { line: 1, .. }));
}

#[test_log::test(tokio::test)]
async fn summary_counts_every_outcome() {
    let store = MemoryStore::new();
    let options = continue_on_error().with_supersede(true);
    import(SINGLE, options, &store).await.unwrap();

    let input = "BEGIN:VCALENDAR\r\n\
                 BEGIN:VEVENT\r\nUID:abc\r\nEND:VEVENT\r\n\
                 BEGIN:VEVENT\r\nUID:new\r\nEND:VEVENT\r\n\
                 BEGIN:VEVENT\r\nSUMMARY:no uid\r\nEND:VEVENT\r\n\
                 END:VCALENDAR\r\n";
    let outcome = import(input, options, &store).await.unwrap();
    let summary = outcome.summary();

    assert_eq!((summary.created, summary.updated, summary.skipped, summary.errors), (1, 1, 0, 1));
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["created"], 1);
    assert!(json["elapsed_seconds"].is_number());
}
