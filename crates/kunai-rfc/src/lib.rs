//! Calendar document model and codecs for iCalendar, jCal and xCal.

pub mod error;
pub mod rfc;
