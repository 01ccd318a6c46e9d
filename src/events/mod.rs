//! Namespace event dumps on test failure
//!
//! When a test fails, the cluster events of its namespace usually explain
//! why. These helpers register a teardown hook that logs them through the
//! reporter.

mod cluster;

pub use cluster::KubeEventSource;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::handle::TestHandle;
use crate::report_log;
use crate::reporter::{Reporter, ReporterOption, TearDownFn};

/// One cluster event, flattened for logging
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Normal or Warning
    pub event_type: String,
    pub reason: String,
    /// Kind of the object the event is about
    pub kind: String,
    /// Name of the object the event is about
    pub name: String,
    pub message: String,
    pub count: i32,
    pub last_seen: Option<DateTime<Utc>>,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = self
            .last_seen
            .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} {} {}/{} {}: {}",
            seen, self.event_type, self.kind, self.name, self.reason, self.message
        )?;
        if self.count > 1 {
            write!(f, " (x{})", self.count)?;
        }
        Ok(())
    }
}

/// Anything that can list the events of a namespace
pub trait EventSource: Send {
    fn events(&self, namespace: &str) -> Result<Vec<EventRecord>>;
}

/// Log the events of `namespace` through `reporter`
///
/// Listing failures are logged, never propagated.
pub fn dump_events<H, S>(reporter: &mut Reporter<H>, source: &S, namespace: &str) -> usize
where
    H: TestHandle,
    S: EventSource + ?Sized,
{
    match source.events(namespace) {
        Ok(events) => {
            report_log!(reporter, "Events in namespace {}:", namespace);
            if events.is_empty() {
                reporter.log("  <none>");
            }
            for event in &events {
                report_log!(reporter, "  {}", event);
            }
            events.len()
        }
        Err(e) => {
            warn!(namespace, "Failed to list events: {:#}", e);
            report_log!(reporter, "Failed to list events in namespace {}: {:#}", namespace, e);
            0
        }
    }
}

/// Teardown hook that dumps the events of `namespace` when the test failed
pub fn events_tear_down<H, S>(source: S, namespace: impl Into<String>) -> TearDownFn<H>
where
    H: TestHandle,
    S: EventSource + 'static,
{
    let namespace: String = namespace.into();
    namespaces_tear_down(source, [namespace])
}

/// Teardown hook that dumps the events of each namespace, in order, when the test failed
pub fn namespaces_tear_down<H, S, I>(source: S, namespaces: I) -> TearDownFn<H>
where
    H: TestHandle,
    S: EventSource + 'static,
    I: IntoIterator,
    I::Item: Into<String>,
{
    let namespaces: Vec<String> = namespaces.into_iter().map(Into::into).collect();
    Box::new(move |reporter: &mut Reporter<H>, failed: bool| {
        if !failed {
            debug!(namespaces = ?namespaces, "Test not failed, skipping event dump");
            return;
        }
        for namespace in &namespaces {
            dump_events(reporter, &source, namespace);
        }
    })
}

/// Option that dumps the events of `namespace` from the current cluster on failure
pub fn print_events_on_failure<H>(namespace: impl Into<String>) -> ReporterOption<H>
where
    H: TestHandle + 'static,
{
    print_events_on_failure_with(KubeEventSource::new(), namespace)
}

/// Option that dumps the events of `namespace` from `source` on failure
pub fn print_events_on_failure_with<H, S>(source: S, namespace: impl Into<String>) -> ReporterOption<H>
where
    H: TestHandle + 'static,
    S: EventSource + 'static,
{
    let hook = events_tear_down(source, namespace);
    Box::new(move |reporter: &mut Reporter<H>| reporter.register_tear_down(hook))
}

impl<H: TestHandle + 'static> Reporter<H> {
    /// Like [`Reporter::from_env`], and also dumps the events of the
    /// configured `event_namespaces` from the current cluster on failure
    pub fn from_env_with_events<I>(handle: H, options: I) -> Self
    where
        I: IntoIterator<Item = ReporterOption<H>>,
    {
        Self::from_config_file(handle, ConfigFile::resolve(), KubeEventSource::new(), options)
    }

    /// Reporter configured by `file`, dumping its `event_namespaces` from `source`
    ///
    /// The event hook is registered before `options` are applied, so a hook
    /// registered by an option replaces it.
    pub fn from_config_file<S, I>(handle: H, file: ConfigFile, source: S, options: I) -> Self
    where
        S: EventSource + 'static,
        I: IntoIterator<Item = ReporterOption<H>>,
    {
        let events = if file.event_namespaces.is_empty() {
            None
        } else {
            let hook = namespaces_tear_down(source, file.event_namespaces);
            Some(Box::new(move |reporter: &mut Reporter<H>| reporter.register_tear_down(hook))
                as ReporterOption<H>)
        };
        Self::with_options(handle, file.reporter, events.into_iter().chain(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, ReporterConfig};
    use crate::handle::RecordingHandle;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    /// Event source backed by a fixed list
    struct StaticEvents {
        events: Vec<EventRecord>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl EventSource for StaticEvents {
        fn events(&self, namespace: &str) -> Result<Vec<EventRecord>> {
            self.requested.lock().unwrap().push(namespace.to_string());
            Ok(self.events.clone())
        }
    }

    struct BrokenEvents;

    impl EventSource for BrokenEvents {
        fn events(&self, _namespace: &str) -> Result<Vec<EventRecord>> {
            anyhow::bail!("connection refused")
        }
    }

    fn backoff_event() -> EventRecord {
        EventRecord {
            event_type: "Warning".to_string(),
            reason: "BackOff".to_string(),
            kind: "Pod".to_string(),
            name: "kms-0".to_string(),
            message: "Back-off restarting failed container".to_string(),
            count: 4,
            last_seen: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single(),
        }
    }

    fn static_source(events: Vec<EventRecord>) -> (StaticEvents, Arc<Mutex<Vec<String>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let source = StaticEvents {
            events,
            requested: Arc::clone(&requested),
        };
        (source, requested)
    }

    #[test]
    fn test_event_display() {
        assert_eq!(
            backoff_event().to_string(),
            "2024-05-06T07:08:09Z Warning Pod/kms-0 BackOff: Back-off restarting failed container (x4)"
        );

        let single = EventRecord {
            count: 1,
            last_seen: None,
            ..backoff_event()
        };
        assert!(single.to_string().starts_with("- Warning"));
        assert!(!single.to_string().ends_with(")"));
    }

    #[test]
    fn test_events_dumped_on_failure() {
        let (source, requested) = static_source(vec![backoff_event()]);
        let mut reporter = Reporter::with_options(
            RecordingHandle::new("t"),
            ReporterConfig::delegating(),
            [print_events_on_failure_with(source, "encryption-e2e")],
        );

        reporter.error("secret not encrypted").unwrap();

        assert_eq!(*requested.lock().unwrap(), vec!["encryption-e2e".to_string()]);
        let logs = reporter.handle().logs();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].ends_with(": Events in namespace encryption-e2e:"));
        assert!(logs[1].contains("Pod/kms-0 BackOff"));
    }

    #[test]
    fn test_events_skipped_when_not_failed() {
        let (source, requested) = static_source(vec![backoff_event()]);
        let mut reporter = Reporter::new(RecordingHandle::new("t"), ReporterConfig::delegating());
        let mut hook = events_tear_down(source, "ns");

        hook(&mut reporter, false);

        assert!(requested.lock().unwrap().is_empty());
        assert!(reporter.handle().lines().is_empty());
    }

    #[test]
    fn test_empty_namespace() {
        let (source, _) = static_source(Vec::new());
        let mut reporter = Reporter::new(RecordingHandle::new("t"), ReporterConfig::delegating());

        assert_eq!(dump_events(&mut reporter, &source, "ns"), 0);
        let logs = reporter.handle().logs();
        assert!(logs[1].ends_with(":   <none>"));
    }

    #[test]
    fn test_listing_error_is_logged() {
        let mut reporter = Reporter::new(RecordingHandle::new("t"), ReporterConfig::delegating());

        assert_eq!(dump_events(&mut reporter, &BrokenEvents, "ns"), 0);

        let logs = reporter.handle().logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("Failed to list events in namespace ns: connection refused"));
        assert!(!reporter.failed());
    }

    #[test]
    fn test_config_file_namespaces_dumped_in_order() {
        let (source, requested) = static_source(vec![backoff_event()]);
        let file = ConfigFile {
            reporter: ReporterConfig::delegating(),
            event_namespaces: vec!["kms".to_string(), "encryption-e2e".to_string()],
            ..ConfigFile::default()
        };
        let mut reporter =
            Reporter::from_config_file(RecordingHandle::new("t"), file, source, Vec::new());
        assert_eq!(reporter.mode(), Mode::Delegating);
        assert!(reporter.has_tear_down());

        reporter.error("secret not encrypted").unwrap();

        assert_eq!(
            *requested.lock().unwrap(),
            vec!["kms".to_string(), "encryption-e2e".to_string()]
        );
        let logs = reporter.handle().logs();
        assert_eq!(logs.len(), 4);
        assert!(logs[0].ends_with(": Events in namespace kms:"));
        assert!(logs[2].ends_with(": Events in namespace encryption-e2e:"));
    }

    #[test]
    fn test_config_file_without_namespaces_has_no_hook() {
        let (source, requested) = static_source(vec![backoff_event()]);
        let file = ConfigFile {
            reporter: ReporterConfig::delegating(),
            ..ConfigFile::default()
        };
        let mut reporter =
            Reporter::from_config_file(RecordingHandle::new("t"), file, source, Vec::new());
        assert!(!reporter.has_tear_down());

        reporter.error("boom").unwrap();
        assert!(requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_config_file_hook_replaced_by_option() {
        let (source, requested) = static_source(vec![backoff_event()]);
        let (other, other_requested) = static_source(Vec::new());
        let file = ConfigFile {
            reporter: ReporterConfig::delegating(),
            event_namespaces: vec!["kms".to_string()],
            ..ConfigFile::default()
        };
        let mut reporter = Reporter::from_config_file(
            RecordingHandle::new("t"),
            file,
            source,
            [print_events_on_failure_with(other, "override")],
        );

        reporter.error("boom").unwrap();

        assert!(requested.lock().unwrap().is_empty());
        assert_eq!(*other_requested.lock().unwrap(), vec!["override".to_string()]);
    }
}
