//! Log output for hosts and the CLI.
//!
//! Library crates only emit `tracing` events. This module installs the
//! subscriber that prints them to stderr, and keeps a handle so the level can
//! be changed at any time after startup.

use std::fmt;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tfmt, reload, Registry};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Minimum severity that reaches the log.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogLevel {
    /// Nothing is logged.
    #[default]
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name, ignoring case. Anything unrecognized turns
    /// logging off.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::None => "none",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::None => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Changes the level of the subscriber installed by [`init_logging`].
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    /// Switch to `level`. Returns `false` if the subscriber is gone.
    pub fn set_level(&self, level: LogLevel) -> bool {
        self.filter.reload(level.as_filter()).is_ok()
    }

    /// Switch to the level named by `value` (see [`LogLevel::parse`]).
    pub fn set_log_level(&self, value: &str) -> bool {
        self.set_level(LogLevel::parse(value))
    }

    /// The level currently in effect.
    pub fn level(&self) -> Option<LevelFilter> {
        self.filter.clone_current()
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle")
            .field("level", &self.level())
            .finish()
    }
}

/// Install the global stderr subscriber.
///
/// Returns `None` when a global subscriber is already installed.
pub fn init_logging(format: LogFormat, level: LogLevel) -> Option<LogHandle> {
    let (filter, handle) = reload::Layer::new(level.as_filter());
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(
                tfmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tfmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
    };

    installed.ok().map(|()| LogHandle { filter: handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_defaults_to_none() {
        assert_eq!(LogLevel::parse("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse(" warn "), LogLevel::Warn);
        assert_eq!(LogLevel::parse("Error"), LogLevel::Error);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::None);
        assert_eq!(LogLevel::parse(""), LogLevel::None);
    }

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LogLevel::None.as_filter(), LevelFilter::OFF);
        assert_eq!(LogLevel::Info.as_filter(), LevelFilter::INFO);
        assert!(LogLevel::Debug > LogLevel::Warn);
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }

    #[test]
    fn handle_switches_level_at_runtime() {
        let Some(handle) = init_logging(LogFormat::Text, LogLevel::Error) else {
            // Another test in this binary installed the global subscriber first.
            return;
        };
        assert_eq!(handle.level(), Some(LevelFilter::ERROR));
        assert!(handle.set_log_level("debug"));
        assert_eq!(handle.level(), Some(LevelFilter::DEBUG));
        assert!(handle.set_log_level("nonsense"));
        assert_eq!(handle.level(), Some(LevelFilter::OFF));
    }
}
