// src/commands/builtin.rs

//! Built-in commands.
//!
//! Most built-ins are synchronous: they log and complete before returning.
//! `delay` and `confirm` complete later from a spawned tokio task, which is
//! what the session's pending-work counter exists for.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::commands::{CommandDescriptor, CommandRegistry};
use crate::context::{Completion, ExecutionContext};
use crate::errors::{Result, ShellError};
use crate::types::CommandArgs;

pub fn register_builtins(registry: &mut CommandRegistry) {
    let builtins = [
        CommandDescriptor::new("echo")
            .description("Print the arguments")
            .usage("echo [WORD]...")
            .handler(echo),
        CommandDescriptor::new("upper")
            .description("Uppercase piped values")
            .usage("... | upper")
            .handler(upper),
        CommandDescriptor::new("lower")
            .description("Lowercase piped values")
            .usage("... | lower")
            .handler(lower),
        CommandDescriptor::new("grep")
            .description("Keep piped values matching a regex")
            .usage("... | grep PATTERN")
            .handler(grep),
        CommandDescriptor::new("count")
            .description("Count piped values")
            .usage("... | count")
            .handler(count),
        CommandDescriptor::new("delay")
            .description("Forward piped values after a pause")
            .usage("... | delay MILLIS")
            .handler(delay),
        CommandDescriptor::new("confirm")
            .description("Ask before forwarding piped values")
            .usage("... | confirm [QUESTION]...")
            .handler(confirm),
        CommandDescriptor::new("help")
            .description("Show help for one or all commands")
            .usage("help [COMMAND]")
            .handler(help),
        CommandDescriptor::new("delimiter")
            .description("Show or change the prompt delimiter")
            .usage("delimiter [NEW]")
            .handler(delimiter),
        CommandDescriptor::new("match")
            .description("List commands starting with a prefix")
            .usage("match PREFIX")
            .handler(match_prefix),
    ];

    for descriptor in builtins {
        registry.register(descriptor);
    }
}

fn echo(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    ctx.log(args.positional)?;
    done.done();
    Ok(())
}

fn upper(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    map_stdin(ctx, &args, str::to_uppercase)?;
    done.done();
    Ok(())
}

fn lower(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    map_stdin(ctx, &args, str::to_lowercase)?;
    done.done();
    Ok(())
}

/// Log `f` applied to every piped value; nothing piped means nothing logged.
fn map_stdin(ctx: &ExecutionContext, args: &CommandArgs, f: fn(&str) -> String) -> Result<()> {
    let values = args.stdin_values();
    if values.is_empty() {
        return Ok(());
    }
    ctx.log(values.iter().map(|v| f(v)))
}

fn grep(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    let pattern = args
        .first()
        .ok_or_else(|| ShellError::invalid_argument("grep", "missing PATTERN"))?;
    let re = Regex::new(pattern)
        .map_err(|e| ShellError::invalid_argument("grep", e.to_string()))?;

    let kept: Vec<&String> = args.stdin_values().iter().filter(|v| re.is_match(v)).collect();
    debug!(pattern, kept = kept.len(), "grep filtered piped values");
    if !kept.is_empty() {
        ctx.log(kept.into_iter().cloned())?;
    }

    done.done();
    Ok(())
}

fn count(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    ctx.log([args.stdin_values().len().to_string()])?;
    done.done();
    Ok(())
}

fn delay(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    let millis: u64 = match args.first() {
        Some(raw) => raw
            .parse()
            .map_err(|_| ShellError::invalid_argument("delay", format!("not a number: {raw}")))?,
        None => 0,
    };
    let handle = tokio::runtime::Handle::try_current().map_err(anyhow::Error::from)?;

    let ctx = ctx.clone();
    handle.spawn(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        if let Some(values) = args.stdin {
            if let Err(e) = ctx.log(values) {
                warn!(error = %e, "delay: forwarding piped values failed");
            }
        }
        done.done();
    });

    Ok(())
}

fn confirm(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    let question = if args.positional.is_empty() {
        "Continue?".to_string()
    } else {
        args.positional.join(" ")
    };
    let handle = tokio::runtime::Handle::try_current().map_err(anyhow::Error::from)?;

    let ctx = ctx.clone();
    handle.spawn(async move {
        match ctx.prompt(&question, Some("n")).await {
            Ok(answer) if is_yes(&answer) => {
                if let Some(values) = args.stdin {
                    if let Err(e) = ctx.log(values) {
                        warn!(error = %e, "confirm: forwarding piped values failed");
                    }
                }
            }
            Ok(answer) => debug!(%answer, "confirm declined; dropping piped values"),
            Err(e) => warn!(error = %e, "confirm: prompt failed"),
        }
        done.done();
    });

    Ok(())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn help(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    ctx.log([ctx.help(args.first())?])?;
    done.done();
    Ok(())
}

fn delimiter(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    ctx.log([ctx.delimiter(args.first())?])?;
    done.done();
    Ok(())
}

fn match_prefix(ctx: &ExecutionContext, args: CommandArgs, done: Completion) -> Result<()> {
    ctx.log(ctx.r#match(args.first().unwrap_or(""))?)?;
    done.done();
    Ok(())
}
