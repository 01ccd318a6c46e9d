//! Test reporter adapter
//!
//! Wraps a [`TestHandle`] and stamps every line it reports. In local mode
//! lines are echoed straight to the console, since the test harness only
//! shows captured output for failed tests; under CI they are passed through
//! to the handle. Errors run the registered teardown hook, and `fatal` is
//! refused outright so that no failure can skip the hook.

mod error;
#[macro_use]
mod macros;

pub use error::{ReporterError, FATAL_FORBIDDEN};

use std::convert::Infallible;
use std::fmt::{self, Display};
use std::io::{self, Write};
use tracing::{debug, error, warn};

use crate::config::{usable_timestamp_format, Mode, ReporterConfig, Termination};
use crate::handle::TestHandle;
use crate::utils::{stamp, with_timestamp, Clock, SystemClock};

/// Teardown hook, called with the reporter and the failed state
pub type TearDownFn<H> = Box<dyn FnMut(&mut Reporter<H>, bool) + Send>;

/// Construction-time option applied to a new reporter
pub type ReporterOption<H> = Box<dyn FnOnce(&mut Reporter<H>)>;

/// Timestamping reporter around a test handle
pub struct Reporter<H> {
    handle: H,
    mode: Mode,
    termination: Termination,
    timestamp_format: String,
    clock: Box<dyn Clock>,
    console: Box<dyn Write + Send>,
    tear_down: Option<TearDownFn<H>>,
}

impl<H: TestHandle> Reporter<H> {
    /// Create a reporter with the given configuration
    ///
    /// A stamp format that fails [`ReporterConfig::validate`] is replaced by
    /// [`STAMP_MILLI`](crate::utils::STAMP_MILLI).
    pub fn new(handle: H, config: ReporterConfig) -> Self {
        debug!(
            test = handle.name(),
            mode = %config.mode,
            termination = %config.termination,
            "Creating reporter"
        );

        Self {
            handle,
            mode: config.mode,
            termination: config.termination,
            timestamp_format: usable_timestamp_format(&config.timestamp_format),
            clock: Box::new(SystemClock),
            console: Box::new(io::stdout()),
            tear_down: None,
        }
    }

    /// Create a reporter and apply `options` in order
    pub fn with_options<I>(handle: H, config: ReporterConfig, options: I) -> Self
    where
        I: IntoIterator<Item = ReporterOption<H>>,
    {
        let mut reporter = Self::new(handle, config);
        for option in options {
            option(&mut reporter);
        }
        reporter
    }

    /// Create a reporter whose mode follows the CI marker
    pub fn from_env<I>(handle: H, options: I) -> Self
    where
        I: IntoIterator<Item = ReporterOption<H>>,
    {
        Self::with_options(handle, ReporterConfig::from_env(), options)
    }

    /// Replace the clock used for stamps
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the console that local mode writes to
    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Register the teardown hook
    ///
    /// A later registration replaces an earlier one.
    pub fn register_tear_down<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Reporter<H>, bool) + Send + 'static,
    {
        if self.tear_down.is_some() {
            debug!(test = self.handle.name(), "Replacing teardown hook");
        }
        self.tear_down = Some(Box::new(hook));
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_local(&self) -> bool {
        self.mode == Mode::Local
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn has_tear_down(&self) -> bool {
        self.tear_down.is_some()
    }

    /// Failed state of the underlying handle
    pub fn failed(&self) -> bool {
        self.handle.failed()
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }

    /// Log a message
    pub fn log(&mut self, message: impl Display) {
        self.logf(format_args!("{message}"));
    }

    /// Log a formatted message
    pub fn logf(&mut self, args: fmt::Arguments<'_>) {
        let line = self.stamped(args);
        match self.mode {
            Mode::Local => self.echo(&line),
            Mode::Delegating => self.handle.log(&line),
        }
    }

    /// Report an error
    pub fn error(&mut self, message: impl Display) -> Result<(), ReporterError> {
        self.errorf(format_args!("{message}"))
    }

    /// Report a formatted error
    ///
    /// In local mode the teardown hook sees `failed = true` and the test is
    /// then terminated per the configured [`Termination`]. Otherwise the
    /// line goes to the handle and the hook sees the handle's failed state.
    pub fn errorf(&mut self, args: fmt::Arguments<'_>) -> Result<(), ReporterError> {
        if self.mode == Mode::Local {
            self.logf(format_args!("ERROR: {args}"));
            self.handle_tear_down(true);
            return self.terminate();
        }

        let line = self.stamped(args);
        self.handle.error(&line);
        let failed = self.handle.failed();
        self.handle_tear_down(failed);
        Ok(())
    }

    /// Always refused; report through [`Reporter::error`] instead
    pub fn fatal(&self, message: impl Display) -> Result<Infallible, ReporterError> {
        self.fatalf(format_args!("{message}"))
    }

    /// Always refused; report through [`Reporter::errorf`] instead
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> Result<Infallible, ReporterError> {
        warn!(test = self.handle.name(), message = %args, "Refusing fatal report");
        Err(ReporterError::ForbiddenOperation(FATAL_FORBIDDEN))
    }

    fn stamped(&self, args: fmt::Arguments<'_>) -> String {
        let now = stamp(self.clock.as_ref(), &self.timestamp_format);
        with_timestamp(&now, args)
    }

    fn echo(&mut self, line: &str) {
        match writeln!(self.console, "{line}") {
            Ok(()) => self.flush_console(),
            Err(e) => warn!("Failed to write to console: {}", e),
        }
    }

    fn flush_console(&mut self) {
        if let Err(e) = self.console.flush() {
            warn!("Failed to flush console: {}", e);
        }
    }

    fn handle_tear_down(&mut self, failed: bool) {
        // Detached while running so errors reported by the hook don't re-enter it
        if let Some(mut hook) = self.tear_down.take() {
            debug!(test = self.handle.name(), failed, "Running teardown hook");
            hook(self, failed);
            if self.tear_down.is_none() {
                self.tear_down = Some(hook);
            }
        }
    }

    fn terminate(&mut self) -> Result<(), ReporterError> {
        match self.termination {
            Termination::Exit => {
                error!(test = self.handle.name(), "Exiting after local error");
                self.flush_console();
                std::process::exit(-1)
            }
            Termination::Propagate => Err(ReporterError::Terminated {
                test: self.handle.name().to_string(),
            }),
        }
    }
}

impl<H: TestHandle> fmt::Debug for Reporter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("test", &self.handle.name())
            .field("mode", &self.mode)
            .field("termination", &self.termination)
            .field("timestamp_format", &self.timestamp_format)
            .field("tear_down", &self.tear_down.is_some())
            .finish()
    }
}
