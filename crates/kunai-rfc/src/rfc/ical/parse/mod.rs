//! iCalendar text parsing (RFC 5545).

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::{parse, parse_component_text};
pub use values::{split_unescaped, unescape_text};
