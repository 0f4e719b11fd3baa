//! iCalendar core models (RFC 5545).
//!
//! Values are kept in their text form: TEXT values unescaped, everything
//! else exactly as written in the basic (RFC 5545) notation. The jCal and
//! xCal codecs convert to and from their extended notations at the edges.

mod component;
mod parameter;
mod property;
pub mod value;
mod value_type;

pub use component::{Component, ComponentKind, ICalendar, TimeProperty};
pub use parameter::Parameter;
pub use property::{ContentLine, Property, names};
pub use value_type::ValueType;
