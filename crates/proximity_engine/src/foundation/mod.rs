//! Foundation layer: math types, logging, and timing utilities.

pub mod logging;
pub mod math;
pub mod time;
