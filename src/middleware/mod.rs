//! Middleware applied to the mock surface.

pub mod delay;
pub mod envelope;

pub use delay::delay;
pub use envelope::{envelope, success_message, TOTAL_COUNT_HEADER};
