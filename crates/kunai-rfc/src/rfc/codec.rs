//! Encoding dispatch over the three calendar codecs.

use kunai_core::types::Encoding;

use crate::error::RfcResult;
use crate::rfc::ical::core::{Component, ICalendar};
use crate::rfc::{ical, jcal, xcal};

/// ## Summary
/// Parses a complete calendar document in the given encoding.
///
/// ## Errors
/// Returns an error if the input is not valid in that encoding.
pub fn parse_encoded(input: &[u8], encoding: Encoding) -> RfcResult<ICalendar> {
    match encoding {
        Encoding::PlainText => Ok(ical::parse::parse(std::str::from_utf8(input)?)?),
        Encoding::Json => jcal::parse(input),
        Encoding::Xml => xcal::parse(input),
    }
}

/// ## Summary
/// Serializes a complete calendar document in the given encoding.
///
/// ## Errors
/// Returns an error if the XML writer fails.
pub fn serialize_encoded(ical: &ICalendar, encoding: Encoding) -> RfcResult<String> {
    match encoding {
        Encoding::PlainText => Ok(ical::build::serialize(ical)),
        Encoding::Json => Ok(jcal::serialize(ical)),
        Encoding::Xml => xcal::serialize(ical),
    }
}

/// ## Summary
/// Serializes a single component as a standalone element of the given encoding.
///
/// Text yields a `BEGIN`/`END` block, JSON a component array node and XML a
/// component element without declaration.
///
/// ## Errors
/// Returns an error if the XML writer fails.
pub fn serialize_component_encoded(component: &Component, encoding: Encoding) -> RfcResult<String> {
    match encoding {
        Encoding::PlainText => Ok(ical::build::serialize_component(component)),
        Encoding::Json => Ok(jcal::serialize_component(component)),
        Encoding::Xml => xcal::serialize_component(component),
    }
}
