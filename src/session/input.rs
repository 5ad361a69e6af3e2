// src/session/input.rs

//! Input sources used to answer prompts.

use std::fmt::{self, Debug};
use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::errors::Result;

/// Something that can show a prompt and read back one line.
///
/// Boxed-future signature so implementations can be stored as
/// `Arc<dyn InputSource>`.
pub trait InputSource: Send + Sync + Debug {
    fn read_line<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Reads answers from the process stdin, writing the prompt to stdout.
#[derive(Default)]
pub struct StdinInput {
    reader: Mutex<Option<BufReader<Stdin>>>,
}

impl Debug for StdinInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdinInput").finish_non_exhaustive()
    }
}

impl StdinInput {
    pub fn new() -> Self {
        Self::default()
    }

    async fn prompt_and_read(&self, prompt: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut guard = self.reader.lock().await;
        let reader = guard.get_or_insert_with(|| BufReader::new(tokio::io::stdin()));

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed").into());
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl InputSource for StdinInput {
    fn read_line<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.prompt_and_read(prompt))
    }
}
