// src/config/validate.rs

use crate::commands::CommandRegistry;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ShellError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ShellError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.session, raw.pipeline, raw.alias))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_session(cfg)?;
    validate_pipeline(cfg)?;
    validate_aliases(cfg)?;
    Ok(())
}

fn validate_session(cfg: &RawConfigFile) -> Result<()> {
    if cfg.session.separator.contains('\n') {
        return Err(ShellError::ConfigError(
            "[session].separator must not contain a newline".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.drain_timeout_ms == Some(0) {
        return Err(ShellError::ConfigError(
            "[pipeline].drain_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_aliases(cfg: &RawConfigFile) -> Result<()> {
    let builtins = CommandRegistry::with_builtins();

    for (alias, target) in cfg.alias.iter() {
        if alias.is_empty() || alias.contains(char::is_whitespace) || alias == "|" {
            return Err(ShellError::ConfigError(format!(
                "alias '{alias}' is not a valid command name"
            )));
        }
        if builtins.contains(alias) {
            return Err(ShellError::ConfigError(format!(
                "alias '{alias}' would shadow a built-in command"
            )));
        }
        if !builtins.contains(target) {
            return Err(ShellError::ConfigError(format!(
                "alias '{alias}' points at unknown command '{target}'"
            )));
        }
    }
    Ok(())
}
