//! Utility functions and helpers
//!
//! Atomic file replacement and clock-derived naming.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, atomic_write_with, cleanup_temp_files};
pub use time::{day_stamp, instant_stamp, iso_utc_now, today};
