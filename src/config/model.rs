// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::session::DEFAULT_DELIMITER;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [session]
/// delimiter = "shellpipe$"
/// separator = " "
///
/// [pipeline]
/// drain_timeout_ms = 5000
///
/// [alias]
/// up = "upper"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Alias name -> built-in command name.
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// Text shown in front of the prompt.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Joins the values of one `log` call on stdout.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_separator() -> String {
    " ".to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            separator: default_separator(),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSection {
    /// Upper bound on waiting for a pipeline to drain. Unset waits forever.
    #[serde(default)]
    pub drain_timeout_ms: Option<u64>,
}

impl PipelineSection {
    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_ms.map(Duration::from_millis)
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub session: SessionSection,
    pub pipeline: PipelineSection,
    pub alias: BTreeMap<String, String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        session: SessionSection,
        pipeline: PipelineSection,
        alias: BTreeMap<String, String>,
    ) -> Self {
        Self {
            session,
            pipeline,
            alias,
        }
    }
}
