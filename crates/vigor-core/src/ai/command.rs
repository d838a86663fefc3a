//! Completer that shells out to a local LLM CLI.
//!
//! Runs a configured program (by default `claude -p`), writes the prompt to
//! its stdin, and returns whatever it prints on stdout. Any program that
//! reads a prompt on stdin and prints a completion works.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::Completer;

/// Completer that runs an external command per request.
#[derive(Debug, Clone)]
pub struct CommandCompleter {
    program: String,
    args: Vec<String>,
}

impl CommandCompleter {
    /// Default program: Claude Code in print mode.
    pub const DEFAULT_PROGRAM: &'static str = "claude";

    /// Create a completer for `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, vec!["-p".to_string()])
    }
}

#[async_trait]
impl Completer for CommandCompleter {
    fn name(&self) -> &str {
        "command"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future (timeout, cancellation) must not leave a
            // stray process behind.
            .kill_on_drop(true);

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "failed to spawn '{}' -- is it installed and on PATH?",
                self.program
            )
        })?;

        debug!(program = %self.program, pid = ?child.id(), "spawned completion command");

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(prompt.as_bytes()).await {
                Ok(()) => {}
                // The command exited without reading its input; its exit
                // status below says why.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(program = %self.program, "command closed stdin early");
                }
                Err(e) => {
                    return Err(e).context("failed to write prompt to command stdin");
                }
            }
            // Close stdin so the command starts processing.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("failed to wait on '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout)
            .with_context(|| format!("'{}' produced non-UTF-8 output", self.program))?;
        if stdout.trim().is_empty() {
            bail!("'{}' produced no output", self.program);
        }
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_claude_print_mode() {
        let c = CommandCompleter::default();
        assert_eq!(c.program(), "claude");
        assert_eq!(c.args(), ["-p".to_string()]);
        assert_eq!(c.name(), "command");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cat_echoes_prompt() {
        let c = CommandCompleter::new("cat", vec![]);
        let out = c.complete("{\"weekSchedule\": []}").await.unwrap();
        assert_eq!(out, "{\"weekSchedule\": []}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_includes_stderr() {
        let c = CommandCompleter::new(
            "sh",
            vec!["-c".to_string(), "echo quota exhausted >&2; exit 3".to_string()],
        );
        let msg = c.complete("x").await.unwrap_err().to_string();
        assert!(msg.contains("quota exhausted"), "{msg}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_is_an_error() {
        let c = CommandCompleter::new("true", vec![]);
        assert!(c.complete("x").await.is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let c = CommandCompleter::new("/nonexistent/vigor-llm", vec![]);
        let msg = format!("{:#}", c.complete("x").await.unwrap_err());
        assert!(msg.contains("failed to spawn"), "{msg}");
    }
}
