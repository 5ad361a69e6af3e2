// src/logging.rs

//! Logging setup for `shellpipe` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SHELLPIPE_LOG` environment variable
//! 3. default to `info`
//!
//! A bare level ("debug") applies to shellpipe's own modules while other
//! crates stay at `warn`, so pipeline routing can be traced without tokio
//! internals drowning it. Anything else in `SHELLPIPE_LOG` is taken as a full
//! `EnvFilter` directive, e.g. `shellpipe::session=trace,info`.
//!
//! Logs are sent to STDERR so that stdout carries only command output.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SHELLPIPE_LOG";

const DEFAULT_LEVEL: &str = "info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(cli_level, env.as_deref());

    fmt()
        .with_env_filter(EnvFilter::try_new(&directive.filter)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(rejected) = directive.rejected {
        tracing::warn!(value = %rejected, "ignoring unparseable {LOG_ENV}; using {DEFAULT_LEVEL}");
    }
    Ok(())
}

/// Filter chosen for the subscriber, plus the env value that was refused.
#[derive(Debug, PartialEq, Eq)]
struct Directive {
    filter: String,
    rejected: Option<String>,
}

fn filter_directive(cli_level: Option<LogLevel>, env: Option<&str>) -> Directive {
    let accept = |filter: String| Directive {
        filter,
        rejected: None,
    };

    if let Some(lvl) = cli_level {
        return accept(scoped(level_name(lvl)));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        None => accept(scoped(DEFAULT_LEVEL)),
        Some(raw) => {
            if let Some(level) = parse_level_str(raw) {
                accept(scoped(level))
            } else if EnvFilter::try_new(raw).is_ok() {
                accept(raw.to_string())
            } else {
                Directive {
                    filter: scoped(DEFAULT_LEVEL),
                    rejected: Some(raw.to_string()),
                }
            }
        }
    }
}

fn scoped(level: &str) -> String {
    format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}
