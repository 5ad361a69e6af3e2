// src/commands/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::commands::{CommandDescriptor, builtin};
use crate::errors::{Result, ShellError};

/// Name and alias lookup for commands.
///
/// Built once at startup and then shared read-only (the session holds it as
/// its `parent`).
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<CommandDescriptor>>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Add or replace a command. Returns the descriptor it replaced.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Option<Arc<CommandDescriptor>> {
        self.commands
            .insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    /// Make `alias` resolve to the command `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        if !self.commands.contains_key(target) {
            return Err(ShellError::CommandNotFound(target.to_string()));
        }
        if self.commands.contains_key(alias) {
            return Err(ShellError::ConfigError(format!(
                "alias '{alias}' would shadow an existing command"
            )));
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.commands.get(name).cloned()
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<CommandDescriptor>> {
        self.get(name)
            .ok_or_else(|| ShellError::CommandNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    /// Command names and aliases that start with `partial`, sorted.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        let mut matches: Vec<String> = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .filter(|name| name.starts_with(partial))
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();
        matches
    }

    pub fn help_for(&self, name: &str) -> Result<String> {
        let descriptor = self.resolve(name)?;

        let mut lines = vec![match self.aliases.get(name) {
            Some(target) => format!("{name} (alias for {target})"),
            None => name.to_string(),
        }];
        if !descriptor.description.is_empty() {
            lines.push(format!("  {}", descriptor.description));
        }
        if let Some(usage) = &descriptor.usage {
            lines.push(format!("  usage: {usage}"));
        }
        Ok(lines.join("\n"))
    }

    pub fn help_listing(&self) -> String {
        let width = self.commands.keys().map(String::len).max().unwrap_or(0);

        let mut lines = vec!["Commands:".to_string()];
        lines.extend(
            self.commands
                .iter()
                .map(|(name, descriptor)| format!("  {name:<width$}  {}", descriptor.description)),
        );
        if !self.aliases.is_empty() {
            lines.push(String::new());
            lines.push("Aliases:".to_string());
            lines.extend(
                self.aliases
                    .iter()
                    .map(|(alias, target)| format!("  {alias} -> {target}")),
            );
        }
        lines.join("\n").trim_end().to_string()
    }
}
