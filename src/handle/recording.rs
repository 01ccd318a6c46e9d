//! In-memory recording handle

use serde::Serialize;
use std::fmt;

use super::TestHandle;

/// A line captured by [`RecordingHandle`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum RecordedLine {
    Log(String),
    Error(String),
}

impl RecordedLine {
    pub fn text(&self) -> &str {
        match self {
            RecordedLine::Log(line) | RecordedLine::Error(line) => line,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RecordedLine::Error(_))
    }
}

impl fmt::Display for RecordedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedLine::Log(line) => write!(f, "{line}"),
            RecordedLine::Error(line) => write!(f, "FAIL {line}"),
        }
    }
}

/// Handle that keeps every reported line in call order
#[derive(Clone, Debug, Default)]
pub struct RecordingHandle {
    name: String,
    lines: Vec<RecordedLine>,
    failed: bool,
}

impl RecordingHandle {
    /// Create an empty handle for the named test
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start out in the failed state, as if an earlier check already failed
    pub fn already_failed(mut self) -> Self {
        self.failed = true;
        self
    }

    /// All captured lines
    pub fn lines(&self) -> &[RecordedLine] {
        &self.lines
    }

    /// Captured log lines only
    pub fn logs(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| !l.is_error())
            .map(RecordedLine::text)
            .collect()
    }

    /// Captured error lines only
    pub fn errors(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.is_error())
            .map(RecordedLine::text)
            .collect()
    }

    /// Render the captured output as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.lines)
    }
}

impl TestHandle for RecordingHandle {
    fn log(&mut self, line: &str) {
        self.lines.push(RecordedLine::Log(line.to_string()));
    }

    fn error(&mut self, line: &str) {
        self.lines.push(RecordedLine::Error(line.to_string()));
        self.failed = true;
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn name(&self) -> &str {
        &self.name
    }
}
