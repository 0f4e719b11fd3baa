//! ## Summary
//! Export pipeline: streams calendar documents out as one document in any
//! encoding, emitting each shared time zone once.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::{Stream, StreamExt};
use kunai_core::constants::{
    JSON_EXPORT_EPILOGUE, JSON_EXPORT_PROLOGUE, TEXT_EXPORT_EPILOGUE, TEXT_EXPORT_PROLOGUE,
    XML_EXPORT_EPILOGUE, XML_EXPORT_PROLOGUE,
};
use kunai_core::options::ExportOptions;
use kunai_core::types::Encoding;
use kunai_rfc::rfc::codec::serialize_component_encoded;
use kunai_rfc::rfc::ical::core::{Component, ComponentKind, ICalendar};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CalendarStore, ObjectRange, StoreResult, StoredDocuments};

/// Returns the fixed prologue and epilogue of an encoding.
#[must_use]
pub const fn envelope(encoding: Encoding) -> (&'static str, &'static str) {
    match encoding {
        Encoding::PlainText => (TEXT_EXPORT_PROLOGUE, TEXT_EXPORT_EPILOGUE),
        Encoding::Json => (JSON_EXPORT_PROLOGUE, JSON_EXPORT_EPILOGUE),
        Encoding::Xml => (XML_EXPORT_PROLOGUE, XML_EXPORT_EPILOGUE),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prologue,
    Documents,
    Timezones,
    Epilogue,
    Done,
}

enum Step {
    Chunk(ServiceResult<String>),
    NeedDocument,
    Finished,
}

/// Chunk production shared by the blocking and the streaming exporter.
/// Documents are fed in one at a time whenever it asks for one.
struct Chunker {
    encoding: Encoding,
    stage: Stage,
    current: std::vec::IntoIter<Component>,
    timezones: VecDeque<Component>,
    seen_tzids: HashSet<String>,
    emitted: usize,
}

impl Chunker {
    fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            stage: Stage::Prologue,
            current: Vec::new().into_iter(),
            timezones: VecDeque::new(),
            seen_tzids: HashSet::new(),
            emitted: 0,
        }
    }

    fn step(&mut self) -> Step {
        loop {
            match self.stage {
                Stage::Prologue => {
                    self.stage = Stage::Documents;
                    return Step::Chunk(Ok(envelope(self.encoding).0.to_string()));
                }
                Stage::Documents => match self.current.next() {
                    Some(component) if component.kind == Some(ComponentKind::Timezone) => {
                        self.stash(component);
                    }
                    Some(component) => return Step::Chunk(self.emit(&component)),
                    None => return Step::NeedDocument,
                },
                Stage::Timezones => match self.timezones.pop_front() {
                    Some(timezone) => return Step::Chunk(self.emit(&timezone)),
                    None => self.stage = Stage::Epilogue,
                },
                Stage::Epilogue => {
                    self.stage = Stage::Done;
                    return Step::Chunk(Ok(envelope(self.encoding).1.to_string()));
                }
                Stage::Done => return Step::Finished,
            }
        }
    }

    /// Hands over the next document, or `None` once there are no more.
    fn feed(&mut self, document: Option<ICalendar>) {
        match document {
            Some(document) => self.current = document.root.children.into_iter(),
            None => {
                tracing::debug!(
                    components = self.emitted,
                    timezones = self.timezones.len(),
                    "Documents exhausted"
                );
                self.stage = Stage::Timezones;
            }
        }
    }

    /// Keeps the first zone seen per `TZID`. A zone without one cannot be
    /// referenced and is dropped.
    fn stash(&mut self, timezone: Component) {
        let Some(tzid) = timezone.tzid().map(str::to_string) else {
            tracing::trace!("Dropping time zone without TZID");
            return;
        };
        if self.seen_tzids.contains(&tzid) {
            tracing::trace!(%tzid, "Dropping duplicate time zone");
            return;
        }
        self.seen_tzids.insert(tzid);
        self.timezones.push_back(timezone);
    }

    fn emit(&mut self, component: &Component) -> ServiceResult<String> {
        let body = serialize_component_encoded(component, self.encoding)?;
        let chunk = if self.encoding == Encoding::Json && self.emitted > 0 {
            format!(",{body}")
        } else {
            body
        };
        self.emitted += 1;
        Ok(chunk)
    }
}

/// ## Summary
/// Lazily produces the chunks of an exported calendar from in-memory
/// documents.
///
/// Non-time-zone components are serialized as soon as their document is
/// pulled, in document order. Time zones are held back, deduplicated by
/// `TZID` (first seen wins) and emitted after the last document. At most
/// one component serialization is held at a time.
pub struct Exporter<I> {
    documents: I,
    chunker: Chunker,
}

impl<I: Iterator<Item = ICalendar>> Exporter<I> {
    #[must_use]
    pub fn new(documents: impl IntoIterator<IntoIter = I>, encoding: Encoding) -> Self {
        Self {
            documents: documents.into_iter(),
            chunker: Chunker::new(encoding),
        }
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.chunker.encoding
    }

    /// Returns the `Content-Type` of the produced document.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.chunker.encoding.content_type()
    }

    /// Adapts the exporter to an asynchronous stream of chunks.
    pub fn into_stream(self) -> impl Stream<Item = ServiceResult<String>> {
        futures::stream::iter(self)
    }
}

impl<I: Iterator<Item = ICalendar>> Iterator for Exporter<I> {
    type Item = ServiceResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.chunker.step() {
                Step::Chunk(chunk) => return Some(chunk),
                Step::NeedDocument => self.chunker.feed(self.documents.next()),
                Step::Finished => return None,
            }
        }
    }
}

/// ## Summary
/// Streaming exporter pulling documents from an asynchronous source, such
/// as a store listing.
///
/// Chunks are produced exactly as [`Exporter`] produces them. The next
/// document is only requested once the current one is fully emitted. A
/// source failure is yielded once and ends the stream.
pub struct ExportStream<S> {
    documents: S,
    chunker: Chunker,
}

impl<S> ExportStream<S>
where
    S: Stream<Item = StoreResult<ICalendar>> + Unpin,
{
    #[must_use]
    pub fn new(documents: S, encoding: Encoding) -> Self {
        Self {
            documents,
            chunker: Chunker::new(encoding),
        }
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.chunker.encoding
    }

    /// Returns the `Content-Type` of the produced document.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.chunker.encoding.content_type()
    }
}

impl<S> Stream for ExportStream<S>
where
    S: Stream<Item = StoreResult<ICalendar>> + Unpin,
{
    type Item = ServiceResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            match this.chunker.step() {
                Step::Chunk(chunk) => return Poll::Ready(Some(chunk)),
                Step::Finished => return Poll::Ready(None),
                Step::NeedDocument => match ready!(this.documents.poll_next_unpin(cx)) {
                    Some(Ok(document)) => this.chunker.feed(Some(document)),
                    Some(Err(e)) => {
                        this.chunker.stage = Stage::Done;
                        return Poll::Ready(Some(Err(ServiceError::from(e))));
                    }
                    None => this.chunker.feed(None),
                },
            }
        }
    }
}

/// ## Summary
/// Builds a streaming exporter over the objects of a stored calendar.
///
/// The store applies `range_start`/`range_count`. Objects are fetched and
/// parsed one at a time as the stream is polled; store failures surface as
/// the stream's last item.
#[must_use]
#[tracing::instrument(skip(store), fields(format = %options.format))]
pub fn export_calendar<'a, S: CalendarStore + ?Sized>(
    store: &'a S,
    calendar: &'a str,
    options: &ExportOptions,
) -> ExportStream<StoredDocuments<'a>> {
    let objects = store.list_objects(calendar, ObjectRange::from(options));
    ExportStream::new(StoredDocuments::new(objects), options.format)
}

/// ## Summary
/// Drains chunks into an asynchronous writer and flushes it.
///
/// ## Errors
/// Returns the first serialization, store or write error; the remaining
/// chunks are not produced.
pub async fn export_to_writer<C, W>(chunks: C, writer: &mut W) -> ServiceResult<u64>
where
    C: Stream<Item = ServiceResult<String>>,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut written = 0_u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        writer.write_all(chunk.as_bytes()).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}

/// ## Summary
/// Writes an export to a file, creating or truncating it.
///
/// The file is closed on every exit path; on error it may hold a partial
/// document.
///
/// ## Errors
/// Returns an error if the file cannot be created or written.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn export_to_file<C, P>(chunks: C, path: P) -> ServiceResult<u64>
where
    C: Stream<Item = ServiceResult<String>>,
    P: AsRef<Path>,
{
    let file = tokio::fs::File::create(path.as_ref()).await?;
    let mut writer = tokio::io::BufWriter::new(file);
    let written = export_to_writer(chunks, &mut writer).await?;
    writer.into_inner().sync_all().await?;
    tracing::info!(bytes = written, "Export written");
    Ok(written)
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
