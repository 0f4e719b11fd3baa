//! xCal: the XML format for iCalendar (RFC 6321).
//!
//! Components wrap their content in `properties` and `components`
//! elements; a property wraps its parameters in `parameters` followed by
//! one element per value, named after the value type.

mod build;
mod parse;

pub use build::{serialize, serialize_component};
pub use parse::parse;

/// Returns the xCal value element used for a parameter's values.
fn parameter_value_type(param: &str) -> &'static str {
    match param.to_ascii_uppercase().as_str() {
        "DELEGATED-FROM" | "DELEGATED-TO" | "MEMBER" | "SENT-BY" => "cal-address",
        "ALTREP" | "DIR" => "uri",
        _ => "text",
    }
}

/// Field element names of the structured `REQUEST-STATUS` value.
const REQUEST_STATUS_FIELDS: [&str; 3] = ["code", "description", "data"];

/// Field element names of the structured `GEO` value.
const GEO_FIELDS: [&str; 2] = ["latitude", "longitude"];
