//! Streaming calendar import and export.

pub mod assemble;
pub mod export;
pub mod import;
pub mod index;
