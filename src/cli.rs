// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `shellpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shellpipe",
    version,
    about = "Run a pipeline of shell commands, piping each stage's output into the next.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Shellpipe.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override the session delimiter from the config.
    #[arg(long, value_name = "TEXT")]
    pub delimiter: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHELLPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the pipeline, but don't run it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the command listing and exit.
    #[arg(long)]
    pub list: bool,

    /// Pipeline tokens; separate stages with a quoted `|`, e.g.
    /// `shellpipe echo a b '|' upper`.
    #[arg(value_name = "TOKENS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_keep_pipes_and_hyphens() {
        let args = CliArgs::try_parse_from([
            "shellpipe", "--dry-run", "echo", "-n", "|", "upper",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert_eq!(args.tokens, vec!["echo", "-n", "|", "upper"]);
    }
}
