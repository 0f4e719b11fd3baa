pub mod codec;
pub mod ical;
pub mod jcal;
pub mod validation;
pub mod xcal;
