//! Shared vocabulary for the kunai calendar import/export engine.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod options;
pub mod types;
