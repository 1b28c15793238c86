//! Unified logging bootstrap
//!
//! Installs a `tracing-subscriber` fmt subscriber with an `EnvFilter`.
//! Components log through the `tracing` macros directly; this module only
//! decides where those events go and at which level.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Log levels accepted by [`LogOptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Directive string understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Minimum log level. `None` falls back to `RUST_LOG`, then `info`.
    pub level: Option<LogLevel>,
    /// Include the event target (module path) in each line
    pub with_target: bool,
    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: None,
            with_target: true,
            ansi: false,
        }
    }
}

static INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Initialize logging
///
/// Safe to call more than once: only the first call installs a subscriber.
/// Returns `true` if this call installed it.
pub fn init(options: LogOptions) -> bool {
    let mut installed = false;
    INITIALIZED.get_or_init(|| {
        let filter = match options.level {
            Some(level) => EnvFilter::new(level.as_str()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        // Another subscriber may already be set by the host (e.g. a test harness).
        installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(options.with_target)
            .with_ansi(options.ansi)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!(with_target = options.with_target, "Logging initialized");
        }
        installed
    });
    installed
}

/// Format an error together with its cause chain
///
/// Produces `outer: middle: root` for nested sources.
pub fn format_error(error: &dyn std::error::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
