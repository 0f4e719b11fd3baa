//! iCalendar (RFC 5545) model, text parser and text serializer.

pub mod build;
pub mod core;
pub mod parse;
