//! Logging setup shared by `muse-run` and `muse-reply`
//!
//! Diagnostics always go to stderr: stdout carries the reply text or the
//! run summary and must stay clean for piping. The HTTP and Mastodon client
//! crates are held at `warn` so `--verbose` shows pipeline stages rather
//! than connection pool chatter.
//!
//! # Examples
//!
//! ```no_run
//! use libmusecast::logging::{LogFormat, LoggingConfig};
//!
//! // MUSECAST_LOG_FORMAT / MUSECAST_LOG_LEVEL, with a command line override
//! LoggingConfig::from_env(false)
//!     .with_format_override(Some(LogFormat::Json))
//!     .init();
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "MUSECAST_LOG_FORMAT";
pub const LOG_LEVEL_VAR: &str = "MUSECAST_LOG_LEVEL";

const DEFAULT_LEVEL: &str = "info";

/// Dependencies whose debug output drowns the pipeline's own events
const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "megalodon"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, no colors
    #[default]
    Text,
    /// One JSON object per line, topic span fields flattened in
    Json,
    /// Multi-line with colors, for watching a run by hand
    Pretty,
}

impl LogFormat {
    const NAMES: [(&'static str, LogFormat); 3] = [
        ("text", LogFormat::Text),
        ("json", LogFormat::Json),
        ("pretty", LogFormat::Pretty),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, format)| *format)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::NAMES.iter().map(|(name, _)| *name).collect();
                format!(
                    "Invalid log format: '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Create a logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Output format on stderr
    /// * `level` - Minimum level for Musecast's own events (error, warn, info, debug, trace)
    /// * `verbose` - Forces `debug`, as `--verbose` does on both binaries
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Read `MUSECAST_LOG_FORMAT` and `MUSECAST_LOG_LEVEL`
    ///
    /// An unknown format falls back to text, a missing level to `info`.
    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(verbose, |name| std::env::var(name).ok())
    }

    fn from_lookup<F>(verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup(LOG_FORMAT_VAR)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let level = lookup(LOG_LEVEL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        Self::new(format, level, verbose)
    }

    /// Replace the format when the command line names one
    pub fn with_format_override(mut self, format: Option<LogFormat>) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    /// Filter directive: our level, with the noisy client crates capped at warn
    fn filter_directive(&self) -> String {
        let level = if self.verbose { "debug" } else { &self.level };
        let mut directive = level.to_string();
        for target in QUIET_TARGETS {
            directive.push_str(&format!(",{}=warn", target));
        }
        directive
    }

    /// `RUST_LOG` wins; an unparsable level degrades to `info`
    fn env_filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        EnvFilter::try_new(self.filter_directive()).unwrap_or_else(|e| {
            eprintln!(
                "Ignoring invalid log level '{}' ({}), using {}",
                self.level, e, DEFAULT_LEVEL
            );
            EnvFilter::new(DEFAULT_LEVEL)
        })
    }

    /// Install the global subscriber
    ///
    /// # Panics
    ///
    /// Panics if a subscriber has already been installed
    pub fn init(&self) {
        let filter = self.env_filter();
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        match self.format {
            LogFormat::Json => builder
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_target(true)
                .init(),
            LogFormat::Pretty => builder
                .pretty()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .init(),
            LogFormat::Text => builder.with_ansi(false).with_target(false).init(),
        }
    }
}

/// Initialize logging from `MUSECAST_LOG_FORMAT` / `MUSECAST_LOG_LEVEL`
pub fn init_default() {
    LoggingConfig::from_env(false).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_from_str_invalid() {
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert_eq!(
            err,
            "Invalid log format: 'xml'. Valid options: text, json, pretty"
        );
    }

    #[test]
    fn test_log_format_display_round_trips() {
        for format in [LogFormat::Text, LogFormat::Json, LogFormat::Pretty] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LoggingConfig::from_lookup(false, lookup(&[]));
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = LoggingConfig::from_lookup(
            false,
            lookup(&[(LOG_FORMAT_VAR, "json"), (LOG_LEVEL_VAR, " warn ")]),
        );
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_from_lookup_ignores_bad_format_and_blank_level() {
        let config = LoggingConfig::from_lookup(
            false,
            lookup(&[(LOG_FORMAT_VAR, "xml"), (LOG_LEVEL_VAR, "  ")]),
        );
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_format_override() {
        let config = LoggingConfig::new(LogFormat::Text, "info".to_string(), false);
        assert_eq!(
            config.clone().with_format_override(Some(LogFormat::Pretty)).format,
            LogFormat::Pretty
        );
        assert_eq!(config.with_format_override(None).format, LogFormat::Text);
    }

    #[test]
    fn test_filter_directive_quiets_client_crates() {
        let config = LoggingConfig::new(LogFormat::Text, "warn".to_string(), false);
        assert_eq!(
            config.filter_directive(),
            "warn,hyper=warn,hyper_util=warn,reqwest=warn,megalodon=warn"
        );
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig::new(LogFormat::Text, "warn".to_string(), true);
        assert!(config.filter_directive().starts_with("debug,"));
    }
}
