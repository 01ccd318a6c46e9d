//! Reporter errors

use thiserror::Error;

/// Message carried by every refused `fatal` call
pub const FATAL_FORBIDDEN: &str =
    "Use error() with an assertion instead of fatal() so that the teardown hook can dump debugging info on failure";

/// Reporter errors
#[derive(Error, Debug)]
pub enum ReporterError {
    /// `fatal`/`fatalf` were called; they are never allowed
    #[error("Forbidden operation: {0}")]
    ForbiddenOperation(&'static str),

    /// A local-mode error ended the test without exiting the process
    #[error("Test '{test}' terminated after a local error")]
    Terminated { test: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
