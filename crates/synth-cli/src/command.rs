//! Shell-command text generator
//!
//! Runs `sh -c <command>`, writes the prompt to stdin and takes stdout as the
//! generated text. The child is killed if the call is cancelled, which is how
//! the repair timeout reaches it.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use synth_core::{GenerationError, TextGenerator};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// [`TextGenerator`] backed by an external command
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
}

impl CommandGenerator {
    /// Create generator for a shell command line
    #[inline]
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    fn name(&self) -> &str {
        &self.command
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GenerationError::Unavailable(format!("cannot spawn `{}`: {e}", self.command)))?;

        // Feed stdin concurrently so a chatty child cannot fill its stdout pipe and stall.
        let writer = child.stdin.take().map(|mut stdin| {
            let bytes = prompt.as_bytes().to_vec();
            tokio::spawn(async move {
                stdin.write_all(&bytes).await?;
                stdin.shutdown().await
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GenerationError::RequestFailed(format!("`{}`: {e}", self.command)))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The child may legitimately exit without reading the prompt.
                Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!(command = %self.command, "generator closed stdin early");
                }
                Ok(Err(e)) => {
                    return Err(GenerationError::RequestFailed(format!(
                        "writing prompt to `{}`: {e}",
                        self.command
                    )))
                }
                Err(e) => return Err(GenerationError::RequestFailed(e.to_string())),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::RequestFailed(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            GenerationError::RequestFailed(format!("`{}` wrote non-UTF-8 output: {e}", self.command))
        })
    }
}
