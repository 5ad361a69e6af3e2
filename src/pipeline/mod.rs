// src/pipeline/mod.rs

//! Pipeline assembly and execution.
//!
//! - [`split_stages`] turns an already tokenized command line into stages,
//!   splitting on literal `|` tokens.
//! - [`runner`] resolves the stages against the registry, links one
//!   execution context per stage and waits for the session to drain.

pub mod runner;

use std::fmt;

use crate::errors::{Result, ShellError};
use crate::types::CommandArgs;

pub use runner::PipelineRunner;

/// Token separating two stages.
pub const PIPE: &str = "|";

/// One stage of a pipeline before it is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: String,
    pub args: CommandArgs,
}

impl StageSpec {
    pub fn new<I, S>(name: impl Into<String>, positional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: CommandArgs::from_positional(positional),
        }
    }
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args.positional {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Split `tokens` on `|` into stages: the first token of each stage is the
/// command name, the rest are its positional arguments.
pub fn split_stages<I, S>(tokens: I) -> Result<Vec<StageSpec>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    if tokens.is_empty() {
        return Err(ShellError::EmptyPipeline);
    }

    tokens
        .split(|t| t == PIPE)
        .enumerate()
        .map(|(index, stage)| match stage.split_first() {
            Some((name, rest)) => Ok(StageSpec::new(name.clone(), rest.iter().cloned())),
            None => Err(ShellError::EmptyStage(index)),
        })
        .collect()
}

/// Render stages back into a single command line.
pub fn render_line(stages: &[StageSpec]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_pipe_tokens() {
        let stages = split_stages(["echo", "a", "b", "|", "upper", "|", "count"]).unwrap();
        assert_eq!(
            stages,
            vec![
                StageSpec::new("echo", ["a", "b"]),
                StageSpec::new("upper", Vec::<String>::new()),
                StageSpec::new("count", Vec::<String>::new()),
            ]
        );
        assert_eq!(render_line(&stages), "echo a b | upper | count");
    }

    #[test]
    fn rejects_empty_input() {
        let none: [&str; 0] = [];
        assert!(matches!(split_stages(none), Err(ShellError::EmptyPipeline)));
    }

    #[test]
    fn rejects_empty_stage() {
        assert!(matches!(
            split_stages(["echo", "|", "|", "count"]),
            Err(ShellError::EmptyStage(1))
        ));
        assert!(matches!(
            split_stages(["echo", "|"]),
            Err(ShellError::EmptyStage(1))
        ));
    }
}
