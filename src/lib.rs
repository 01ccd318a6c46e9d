//! e2e-reporter - timestamping test reporter for end-to-end suites
//!
//! Wraps a test framework's reporting handle so that e2e tests get useful
//! output both on a developer machine and under CI.
//!
//! ## Features
//!
//! - Every line is stamped with a millisecond timestamp
//! - Outside CI (no `CI` variable) lines are echoed to the console at once
//!   instead of being held back by the harness
//! - Errors run a registered teardown hook, e.g. to dump namespace events
//! - `fatal` is refused so that no failure can skip the teardown hook
//! - Termination, stamp format and event namespaces can be set in
//!   `e2e-reporter.yaml` (or the file named by `E2E_REPORTER_CONFIG`); see
//!   [`Reporter::from_env_with_events`]
//!
//! ## Usage
//!
//! ```no_run
//! use e2e_reporter::{events, LibtestHandle, Reporter};
//!
//! let mut e = Reporter::from_env(
//!     LibtestHandle::current(),
//!     [events::print_events_on_failure("encryption-e2e")],
//! );
//! e.log("creating secret");
//! if let Err(err) = e.error("secret was stored in plain text") {
//!     panic!("{err}");
//! }
//! ```

pub mod config;
pub mod events;
pub mod handle;
pub mod reporter;
pub mod utils;

pub use config::{Mode, ReporterConfig, Termination};
pub use handle::{LibtestHandle, RecordingHandle, TestHandle};
pub use reporter::{Reporter, ReporterError, ReporterOption, TearDownFn};
