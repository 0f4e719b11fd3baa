//! In-memory calendar store.

use std::collections::HashMap;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::BoxStream;
use kunai_rfc::rfc::ical::parse::parse;
use tokio::sync::RwLock;

use super::{CalendarStore, ObjectRange, StoreError, StoreResult, StoredObject, generate_etag};

/// ## Summary
/// Calendar store holding objects in memory, per calendar in insertion order.
///
/// The UID of an object is read from its data on every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    calendars: RwLock<HashMap<String, Vec<StoredObject>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of objects in a calendar.
    pub async fn len(&self, calendar: &str) -> usize {
        self.calendars.read().await.get(calendar).map_or(0, Vec::len)
    }

    /// Returns whether a calendar holds no objects.
    pub async fn is_empty(&self, calendar: &str) -> bool {
        self.len(calendar).await == 0
    }

    /// Returns a stored object by its object id.
    pub async fn get(&self, calendar: &str, object_id: &str) -> Option<StoredObject> {
        self.calendars
            .read()
            .await
            .get(calendar)?
            .iter()
            .find(|object| object.object_id == object_id)
            .cloned()
    }

    /// Returns the UIDs of a calendar in insertion order.
    pub async fn uids(&self, calendar: &str) -> Vec<String> {
        self.calendars
            .read()
            .await
            .get(calendar)
            .map(|objects| objects.iter().map(|object| object.uid.clone()).collect())
            .unwrap_or_default()
    }
}

fn uid_of(data: &str) -> StoreResult<String> {
    let ical = parse(data).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    ical.base_components()
        .first()
        .copied()
        .or_else(|| ical.components().first())
        .and_then(|component| component.uid())
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidData("object has no UID".to_string()))
}

#[async_trait::async_trait]
impl CalendarStore for MemoryStore {
    async fn find_by_uid(&self, calendar: &str, uid: &str) -> StoreResult<Option<String>> {
        Ok(self.calendars.read().await.get(calendar).and_then(|objects| {
            objects
                .iter()
                .find(|object| object.uid == uid)
                .map(|object| object.object_id.clone())
        }))
    }

    #[tracing::instrument(skip(self, data), fields(data_len = data.len()))]
    async fn create(&self, calendar: &str, object_id: &str, data: &str) -> StoreResult<String> {
        let uid = uid_of(data)?;
        let mut calendars = self.calendars.write().await;
        let objects = calendars.entry(calendar.to_string()).or_default();

        if objects.iter().any(|object| object.object_id == object_id) {
            return Err(StoreError::AlreadyExists {
                calendar: calendar.to_string(),
                object_id: object_id.to_string(),
            });
        }

        let etag = generate_etag(data.as_bytes());
        objects.push(StoredObject {
            object_id: object_id.to_string(),
            uid,
            data: data.to_string(),
            etag: etag.clone(),
            modified: Utc::now(),
        });
        tracing::debug!(%etag, "Created object");
        Ok(etag)
    }

    #[tracing::instrument(skip(self, data), fields(data_len = data.len()))]
    async fn update(&self, calendar: &str, object_id: &str, data: &str) -> StoreResult<String> {
        let uid = uid_of(data)?;
        let mut calendars = self.calendars.write().await;
        let object = calendars
            .get_mut(calendar)
            .and_then(|objects| objects.iter_mut().find(|object| object.object_id == object_id))
            .ok_or_else(|| StoreError::NotFound {
                calendar: calendar.to_string(),
                object_id: object_id.to_string(),
            })?;

        let etag = generate_etag(data.as_bytes());
        object.uid = uid;
        object.data = data.to_string();
        object.etag.clone_from(&etag);
        object.modified = Utc::now();
        tracing::debug!(%etag, "Updated object");
        Ok(etag)
    }

    fn list_objects<'a>(
        &'a self,
        calendar: &'a str,
        range: ObjectRange,
    ) -> BoxStream<'a, StoreResult<StoredObject>> {
        let limit = range.limit();
        // Objects are only ever appended, so a position stays a valid cursor
        // across polls. The lock is held for one lookup at a time.
        futures::stream::unfold((0_usize, 0_usize), move |(cursor, listed)| async move {
            if listed >= limit {
                return None;
            }
            let calendars = self.calendars.read().await;
            let (position, object) = calendars
                .get(calendar)?
                .iter()
                .enumerate()
                .skip(cursor)
                .find(|(_, object)| range.contains(object))?;
            Some((Ok(object.clone()), (position + 1, listed + 1)))
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:e1\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    #[test_log::test(tokio::test)]
    async fn create_then_find_by_uid() {
        let store = MemoryStore::new();
        assert_eq!(store.find_by_uid("work", "e1").await.unwrap(), None);

        let etag = store.create("work", "a.ics", EVENT).await.unwrap();
        assert_eq!(
            store.find_by_uid("work", "e1").await.unwrap().as_deref(),
            Some("a.ics")
        );
        assert_eq!(store.get("work", "a.ics").await.unwrap().etag, etag);
        assert_eq!(store.find_by_uid("home", "e1").await.unwrap(), None);
    }

    #[test_log::test(tokio::test)]
    async fn duplicate_object_id_is_rejected() {
        let store = MemoryStore::new();
        store.create("work", "a.ics", EVENT).await.unwrap();
        let err = store.create("work", "a.ics", EVENT).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn update_replaces_data_and_etag() {
        let store = MemoryStore::new();
        let first = store.create("work", "a.ics", EVENT).await.unwrap();

        let changed = EVENT.replace("END:VEVENT", "SUMMARY:changed\r\nEND:VEVENT");
        let second = store.update("work", "a.ics", &changed).await.unwrap();

        assert_ne!(first, second);
        assert!(store.get("work", "a.ics").await.unwrap().data.contains("changed"));
        assert_eq!(store.len("work").await, 1);
    }

    #[test_log::test(tokio::test)]
    async fn update_of_missing_object_fails() {
        let store = MemoryStore::new();
        let err = store.update("work", "missing.ics", EVENT).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn data_without_uid_is_invalid() {
        let store = MemoryStore::new();
        let err = store
            .create("work", "a.ics", "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert!(store.is_empty("work").await);
    }

    #[test_log::test(tokio::test)]
    async fn list_objects_applies_the_range() {
        let store = MemoryStore::new();
        for n in 0..3 {
            let data = EVENT.replace("UID:e1", &format!("UID:e{n}"));
            store.create("work", &format!("{n}.ics"), &data).await.unwrap();
        }

        let store = &store;
        let listed = |calendar: &'static str, range: ObjectRange| async move {
            store
                .list_objects(calendar, range)
                .map(|object| object.unwrap().uid)
                .collect::<Vec<_>>()
                .await
        };

        assert_eq!(listed("work", ObjectRange::default()).await, ["e0", "e1", "e2"]);

        let capped = ObjectRange { start: None, count: Some(2) };
        assert_eq!(listed("work", capped).await, ["e0", "e1"]);

        let future = ObjectRange {
            start: Some(Utc::now() + chrono::Duration::days(1)),
            count: None,
        };
        assert!(listed("work", future).await.is_empty());
        assert!(listed("home", ObjectRange::default()).await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn listing_sees_objects_added_while_streaming() {
        let store = MemoryStore::new();
        store.create("work", "0.ics", EVENT).await.unwrap();

        let mut objects = store.list_objects("work", ObjectRange::default());
        assert_eq!(objects.next().await.unwrap().unwrap().object_id, "0.ics");

        let data = EVENT.replace("UID:e1", "UID:e2");
        store.create("work", "1.ics", &data).await.unwrap();
        assert_eq!(objects.next().await.unwrap().unwrap().object_id, "1.ics");
        assert!(objects.next().await.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn uid_comes_from_an_override_when_no_base_component_exists() {
        let store = MemoryStore::new();
        let data = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:moved\r\n\
                    RECURRENCE-ID:20260105T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        store.create("work", "a.ics", data).await.unwrap();
        assert_eq!(store.uids("work").await, ["moved"]);
    }
}
