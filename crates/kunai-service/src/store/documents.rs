use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::stream::{BoxStream, Stream, StreamExt};
use kunai_rfc::rfc::ical::core::ICalendar;
use kunai_rfc::rfc::ical::parse::parse;

use super::{StoreResult, StoredObject};

/// ## Summary
/// Parses stored objects into calendar documents as they are listed.
///
/// Only the object being parsed is held. Objects whose data no longer parses
/// are skipped with a warning; store failures are passed through.
pub struct StoredDocuments<'a> {
    objects: BoxStream<'a, StoreResult<StoredObject>>,
}

impl<'a> StoredDocuments<'a> {
    #[must_use]
    pub fn new(objects: BoxStream<'a, StoreResult<StoredObject>>) -> Self {
        Self { objects }
    }
}

impl Stream for StoredDocuments<'_> {
    type Item = StoreResult<ICalendar>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let object = match ready!(self.objects.poll_next_unpin(cx)) {
                Some(Ok(object)) => object,
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            };
            match parse(&object.data) {
                Ok(document) => return Poll::Ready(Some(Ok(document))),
                Err(e) => {
                    tracing::warn!(
                        object_id = %object.object_id,
                        error = %e,
                        "Skipping unparseable stored object"
                    );
                }
            }
        }
    }
}
