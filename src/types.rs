/// Argument bundle for a single command invocation.
///
/// `stdin` is filled in by the upstream stage when this invocation is the
/// downstream of a pipe. It is the only channel through which piped data
/// crosses from one stage to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    pub positional: Vec<String>,
    pub stdin: Option<Vec<String>>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// First positional argument, if any.
    pub fn first(&self) -> Option<&str> {
        self.positional.first().map(String::as_str)
    }

    /// Piped input, or an empty slice for a stage that received nothing.
    pub fn stdin_values(&self) -> &[String] {
        self.stdin.as_deref().unwrap_or(&[])
    }
}
