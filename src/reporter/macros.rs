//! Formatting shorthands for [`Reporter`](crate::Reporter)

/// Log a formatted, timestamped line
///
/// ```ignore
/// report_log!(reporter, "waiting for {} pods", count);
/// ```
#[macro_export]
macro_rules! report_log {
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.logf(::std::format_args!($($arg)+))
    };
}

/// Report a formatted error; evaluates to `Result<(), ReporterError>`
#[macro_export]
macro_rules! report_error {
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.errorf(::std::format_args!($($arg)+))
    };
}

/// Attempt a formatted fatal report; always evaluates to an `Err`
#[macro_export]
macro_rules! report_fatal {
    ($reporter:expr, $($arg:tt)+) => {
        $reporter.fatalf(::std::format_args!($($arg)+))
    };
}
