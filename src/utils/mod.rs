//! Shared utilities
//!
//! Timestamp formatting and logger setup.

pub mod logger;
pub mod timestamp;

pub use logger::{init_logger, LogLevel};
pub use timestamp::{
    is_stamp_milli, is_valid_format, stamp, with_timestamp, Clock, FixedClock, SystemClock,
    STAMP_MILLI,
};
