pub mod calendar;
pub mod error;
pub mod store;
