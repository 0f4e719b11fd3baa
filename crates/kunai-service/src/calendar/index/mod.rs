//! ## Summary
//! Structural indexers: locate the components of a calendar document
//! without building its object tree.

mod json;
mod structure;
mod text;
mod xml;

use std::io::{Read, Seek, SeekFrom};

use kunai_core::types::Encoding;
use kunai_rfc::rfc::ical::core::Component;

pub use json::JsonIndexer;
pub use structure::{ComponentFragment, FragmentKind, Group, GroupKey, GroupMap, Structure};
pub use text::TextIndexer;
pub use xml::{IDENTIFIER_DEPTH_OFFSET, XmlIndexer};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Single pass over a seekable byte source producing a [`Structure`].
///
/// Indexing always starts from the beginning of the source, so the same
/// source can be indexed again.
pub trait StructuralIndexer {
    type Fragment;

    /// ## Errors
    /// Returns [`ServiceError::SourceType`] if the source cannot be rewound,
    /// and a malformed-input error if the document cannot be scanned.
    fn index<R: Read + Seek>(&self, source: &mut R) -> ServiceResult<Structure<Self::Fragment>>;
}

/// Output of an indexing pass, by source encoding.
#[derive(Debug)]
pub enum Indexed {
    /// Byte ranges into the source (text and XML).
    Ranges(Structure<ComponentFragment>),
    /// Components already parsed from the source (JSON).
    Parsed(Structure<Component>),
}

/// ## Summary
/// Indexes a source with the indexer matching its encoding.
///
/// ## Errors
/// Propagates the indexer's errors.
pub fn index<R: Read + Seek>(source: &mut R, encoding: Encoding) -> ServiceResult<Indexed> {
    match encoding {
        Encoding::PlainText => TextIndexer.index(source).map(Indexed::Ranges),
        Encoding::Xml => XmlIndexer.index(source).map(Indexed::Ranges),
        Encoding::Json => JsonIndexer.index(source).map(Indexed::Parsed),
    }
}

/// Seeks to the start of the source before any scanning.
pub(crate) fn rewind<R: Seek>(source: &mut R) -> ServiceResult<()> {
    source
        .seek(SeekFrom::Start(0))
        .map(|_| ())
        .map_err(|e| ServiceError::SourceType(e.to_string()))
}
