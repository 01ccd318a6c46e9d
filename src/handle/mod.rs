//! Test reporting handles
//!
//! A handle is the test framework's own reporting surface. The reporter
//! wraps one and either echoes around it or delegates to it.

mod libtest;
mod recording;

pub use libtest::LibtestHandle;
pub use recording::{RecordedLine, RecordingHandle};

/// Capability set of an underlying test-reporting handle
pub trait TestHandle {
    /// Record an informational line
    fn log(&mut self, line: &str);

    /// Record a failure line and mark the test as failed
    fn error(&mut self, line: &str);

    /// Whether the test has failed so far
    fn failed(&self) -> bool;

    /// Test name, if the framework knows it
    fn name(&self) -> &str {
        ""
    }
}

impl<T: TestHandle + ?Sized> TestHandle for &mut T {
    fn log(&mut self, line: &str) {
        (**self).log(line)
    }

    fn error(&mut self, line: &str) {
        (**self).error(line)
    }

    fn failed(&self) -> bool {
        (**self).failed()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: TestHandle + ?Sized> TestHandle for Box<T> {
    fn log(&mut self, line: &str) {
        (**self).log(line)
    }

    fn error(&mut self, line: &str) {
        (**self).error(line)
    }

    fn failed(&self) -> bool {
        (**self).failed()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
