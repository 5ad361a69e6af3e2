// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::commands::CommandRegistry;
use crate::config::{ConfigFile, load_or_default};
use crate::pipeline::{PipelineRunner, StageSpec, split_stages};
use crate::session::{Session, StdinInput, StdoutSink};

pub use crate::context::{Completion, ContextOptions, ExecutionContext};
pub use crate::errors::ShellError;
pub use crate::types::CommandArgs;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - command registry (built-ins + configured aliases)
/// - the session (stdout sink, stdin prompts)
/// - the pipeline runner
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;
    let registry = Arc::new(build_registry(&cfg)?);

    let delimiter = args
        .delimiter
        .clone()
        .unwrap_or_else(|| cfg.session.delimiter.clone());

    let session = Session::builder()
        .sink(Arc::new(StdoutSink::new(cfg.session.separator.clone())))
        .input(Arc::new(StdinInput::new()))
        .parent(registry)
        .delimiter(delimiter)
        .build();

    if args.list {
        println!("{}", session.help(None)?);
        return Ok(());
    }

    let stages = split_stages(args.tokens)?;

    if args.dry_run {
        print_dry_run(&session, &stages);
        return Ok(());
    }

    let runner = PipelineRunner::new(session)?.with_drain_timeout(cfg.pipeline.drain_timeout());
    runner
        .run_with_callback(
            &stages,
            Some(Box::new(|outcome: &errors::Result<()>| {
                debug!(ok = outcome.is_ok(), "pipeline callback invoked");
            })),
        )
        .await?;

    Ok(())
}

/// Built-in commands plus the aliases from `[alias]`.
pub fn build_registry(cfg: &ConfigFile) -> errors::Result<CommandRegistry> {
    let mut registry = CommandRegistry::with_builtins();
    for (alias, target) in cfg.alias.iter() {
        registry.alias(alias, target)?;
    }
    Ok(registry)
}

/// Dry-run output: the session delimiter and every resolved stage.
fn print_dry_run(session: &Session, stages: &[StageSpec]) {
    println!("shellpipe dry-run");
    println!("  delimiter = {}", session.delimiter(None));
    println!();

    println!("stages ({}):", stages.len());
    for (index, stage) in stages.iter().enumerate() {
        let resolved = session.parent().and_then(|registry| registry.get(&stage.name));
        match resolved {
            Some(descriptor) if descriptor.name != stage.name => {
                println!("  {index}: {stage}  (alias for {})", descriptor.name);
            }
            Some(_) => println!("  {index}: {stage}"),
            None => println!("  {index}: {stage}  (unknown command)"),
        }
        if let Some(stdin_from) = index.checked_sub(1) {
            println!("      stdin: output of stage {stdin_from}");
        }
    }

    debug!("dry-run complete (no execution)");
}
