//! jCal: the JSON format for iCalendar (RFC 7265).
//!
//! A component is `[name, [properties...], [components...]]` and a property
//! is `[name, {parameters}, type, value...]`, all names in lowercase.

mod build;
mod parse;

pub use build::{component_to_json, serialize, serialize_component, to_json};
pub use parse::{component_from_json, from_json, parse};
