//! Timestamp utilities
//!
//! Provides the clock abstraction and the millisecond stamp prepended to
//! every reported line.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::{self, Write};

/// Default stamp format, rendered like `Jan _2 15:04:05.000`
pub const STAMP_MILLI: &str = "%b %e %H:%M:%S%.3f";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Host wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to a single instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Check that every specifier in `format` is known to chrono
pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render the current time of `clock` using `format`
///
/// A format chrono cannot render falls back to [`STAMP_MILLI`].
pub fn stamp(clock: &dyn Clock, format: &str) -> String {
    let now = clock.now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", now.format(STAMP_MILLI));
    }
    out
}

/// Prefix a message with a stamp: `<stamp>: <message>`
pub fn with_timestamp(stamp: &str, args: fmt::Arguments<'_>) -> String {
    format!("{stamp}: {args}")
}

/// Check whether `text` has the shape of a [`STAMP_MILLI`] stamp
pub fn is_stamp_milli(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 19 || !text.is_ascii() {
        return false;
    }

    let digit = |i: usize| bytes[i].is_ascii_digit();
    let day = matches!(
        (bytes[4], bytes[5]),
        (b' ', b'1'..=b'9') | (b'1'..=b'2', b'0'..=b'9') | (b'3', b'0'..=b'1')
    );
    let hour = matches!((bytes[7], bytes[8]), (b'0'..=b'1', b'0'..=b'9') | (b'2', b'0'..=b'3'));
    let sexagesimal = |i: usize| matches!(bytes[i], b'0'..=b'5') && digit(i + 1);

    MONTHS.contains(&&text[0..3])
        && bytes[3] == b' '
        && day
        && bytes[6] == b' '
        && hour
        && bytes[9] == b':'
        && sexagesimal(10)
        && bytes[12] == b':'
        && sexagesimal(13)
        && bytes[15] == b'.'
        && digit(16)
        && digit(17)
        && digit(18)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(month: u32, day: u32) -> FixedClock {
        let at = Local
            .with_ymd_and_hms(2024, month, day, 15, 4, 5)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(7);
        FixedClock(at)
    }

    #[test]
    fn test_stamp_pads_single_digit_day() {
        let s = stamp(&fixed(1, 2), STAMP_MILLI);
        assert_eq!(s, "Jan  2 15:04:05.007");
        assert!(is_stamp_milli(&s));
    }

    #[test]
    fn test_stamp_two_digit_day() {
        let s = stamp(&fixed(11, 23), STAMP_MILLI);
        assert_eq!(s, "Nov 23 15:04:05.007");
        assert!(is_stamp_milli(&s));
    }

    #[test]
    fn test_system_clock_stamp_shape() {
        assert!(is_stamp_milli(&stamp(&SystemClock, STAMP_MILLI)));
    }

    #[test]
    fn test_with_timestamp() {
        let line = with_timestamp("Jan  2 15:04:05.007", format_args!("pod {} ready", "db-0"));
        assert_eq!(line, "Jan  2 15:04:05.007: pod db-0 ready");
    }

    #[test]
    fn test_is_stamp_milli_rejects() {
        assert!(!is_stamp_milli(""));
        assert!(!is_stamp_milli("Foo  2 15:04:05.007"));
        assert!(!is_stamp_milli("Jan  2 15:04:05"));
        assert!(!is_stamp_milli("2024-01-02 15:04:05"));
    }

    #[test]
    fn test_is_stamp_milli_rejects_impossible_fields() {
        assert!(!is_stamp_milli("Jan 39 15:04:05.007"));
        assert!(!is_stamp_milli("Jan 32 15:04:05.007"));
        assert!(!is_stamp_milli("Jan  0 15:04:05.007"));
        assert!(!is_stamp_milli("Jan 02 15:04:05.007"));
        assert!(!is_stamp_milli("Jan  2 24:04:05.007"));
        assert!(!is_stamp_milli("Jan  2 15:60:05.007"));
        assert!(!is_stamp_milli("Jan  2 15:04:61.007"));
        assert!(is_stamp_milli("Dec 31 23:59:59.999"));
        assert!(is_stamp_milli("Feb 10 00:00:00.000"));
    }

    #[test]
    fn test_is_valid_format() {
        assert!(is_valid_format(STAMP_MILLI));
        assert!(is_valid_format("%H:%M:%S"));
        assert!(is_valid_format("plain text"));
        assert!(!is_valid_format("%Q"));
        assert!(!is_valid_format("%H:%M %Q"));
    }

    #[test]
    fn test_stamp_unknown_specifier_falls_back() {
        let s = stamp(&fixed(1, 2), "%Q");
        assert_eq!(s, "Jan  2 15:04:05.007");
    }
}
