//! Calendar object storage consumed by the import and export pipelines.

mod documents;
mod memory;

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use kunai_core::options::ExportOptions;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use documents::StoredDocuments;
pub use memory::MemoryStore;

/// Store layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: calendar={calendar}, object={object_id}")]
    NotFound { calendar: String, object_id: String },

    #[error("Object already exists: calendar={calendar}, object={object_id}")]
    AlreadyExists { calendar: String, object_id: String },

    #[error("Invalid calendar data: {0}")]
    InvalidData(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored calendar object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Name of the object within its calendar (e.g. `<uuid>.ics`).
    pub object_id: String,
    pub uid: String,
    /// iCalendar text.
    pub data: String,
    pub etag: String,
    pub modified: DateTime<Utc>,
}

/// Selection of stored objects for export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectRange {
    /// Keep objects modified at or after this instant.
    pub start: Option<DateTime<Utc>>,
    /// Keep at most this many objects.
    pub count: Option<u32>,
}

impl ObjectRange {
    #[must_use]
    pub fn contains(&self, object: &StoredObject) -> bool {
        self.start.is_none_or(|start| object.modified >= start)
    }

    /// Returns how many objects the range admits.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.count
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(usize::MAX)
    }
}

impl From<&ExportOptions> for ObjectRange {
    fn from(options: &ExportOptions) -> Self {
        Self {
            start: options.range_start,
            count: options.range_count,
        }
    }
}

/// ## Summary
/// Generates a strong `ETag` from the stored bytes.
///
/// The `ETag` is a SHA-256 hash, hex-encoded and quoted.
#[must_use]
pub fn generate_etag(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hasher.finalize();
    format!("\"{}\"", hex::encode(hash))
}

/// ## Summary
/// Create/update/lookup of calendar objects by UID.
///
/// Every write is expected to be atomic on its own; the pipelines never
/// hold locks across calls.
#[async_trait::async_trait]
pub trait CalendarStore: Send + Sync {
    /// Returns the object id holding `uid` in `calendar`, if any.
    ///
    /// ## Errors
    /// Returns an error if the backend fails.
    async fn find_by_uid(&self, calendar: &str, uid: &str) -> StoreResult<Option<String>>;

    /// Stores a new object and returns its `ETag`.
    ///
    /// ## Errors
    /// Returns an error if the object id is taken or the data has no UID.
    async fn create(&self, calendar: &str, object_id: &str, data: &str) -> StoreResult<String>;

    /// Replaces an existing object and returns its new `ETag`.
    ///
    /// ## Errors
    /// Returns an error if the object does not exist.
    async fn update(&self, calendar: &str, object_id: &str, data: &str) -> StoreResult<String>;

    /// Lists the objects of a calendar within `range`, in store order.
    ///
    /// Objects are fetched as the stream is polled, never the whole calendar
    /// up front. Backend failures surface as stream items.
    fn list_objects<'a>(
        &'a self,
        calendar: &'a str,
        range: ObjectRange,
    ) -> BoxStream<'a, StoreResult<StoredObject>>;
}
