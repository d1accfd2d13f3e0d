//! Structured logging initialisation.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "RUSTDOC_JS_LOG";
pub const DEFAULT_FILTER: &str = "warn";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use; later calls are no-ops.
///
/// Logs go to stderr so they never interleave with the report on stdout.
pub fn initialise() -> Result<(), TelemetryError> {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    initialise_with(&directives)
}

pub fn initialise_with(directives: &str) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(directives))
        .map(|_| ())
}

fn install_subscriber(directives: &str) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::{TelemetryError, initialise_with};

    #[test]
    fn repeated_initialisation_is_idempotent() {
        initialise_with("debug").expect("first initialisation should succeed");
        initialise_with("trace").expect("second initialisation should be a no-op");
    }

    #[test]
    fn invalid_filter_is_rejected_before_install() {
        let result = super::install_subscriber("rustdoc_js=loud");
        assert!(matches!(result, Err(TelemetryError::Filter(_))));
    }
}
