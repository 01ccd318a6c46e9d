//! Handle over Rust's built-in test harness

use std::thread;

use super::TestHandle;

/// Reports through the standard test harness
///
/// Log lines go to the harness-captured stdout, which is only shown for
/// failing tests or under `--nocapture`. Errors mark the handle failed and
/// the test continues; dropping a failed handle panics so the harness
/// records the failure.
#[derive(Debug)]
pub struct LibtestHandle {
    name: String,
    failed: bool,
}

impl LibtestHandle {
    /// Create a handle named after the current test thread
    pub fn current() -> Self {
        let name = thread::current().name().unwrap_or("unnamed").to_string();
        Self::new(name)
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: false,
        }
    }
}

impl TestHandle for LibtestHandle {
    fn log(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, line: &str) {
        eprintln!("{line}");
        self.failed = true;
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LibtestHandle {
    fn drop(&mut self) {
        if self.failed && !thread::panicking() {
            panic!("test {} reported errors", self.name);
        }
    }
}
