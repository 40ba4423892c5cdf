use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, render_prompt};

/// Bridges to a model through external processes.
///
/// The chat command receives the rendered prompt on stdin and answers on stdout.
/// The embed command receives the text on stdin and prints a JSON array of floats.
/// Transport to any hosted model is left to those programs.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    chat_command: Vec<String>,
    embed_command: Option<Vec<String>>,
    timeout: Duration,
}

impl CommandProvider {
    /// # Errors
    ///
    /// Returns `LlmError::Other` if `chat_command` is empty.
    pub fn new(chat_command: Vec<String>, timeout: Duration) -> Result<Self, LlmError> {
        if chat_command.is_empty() {
            return Err(LlmError::Other("chat command must not be empty".into()));
        }
        Ok(Self {
            chat_command,
            embed_command: None,
            timeout,
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Other` if `embed_command` is empty.
    pub fn with_embed_command(mut self, embed_command: Vec<String>) -> Result<Self, LlmError> {
        if embed_command.is_empty() {
            return Err(LlmError::Other("embed command must not be empty".into()));
        }
        self.embed_command = Some(embed_command);
        Ok(self)
    }

    async fn run(&self, argv: &[String], input: String) -> Result<String, LlmError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| LlmError::Other("empty command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::debug!("failed to write command stdin: {e}");
                }
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| LlmError::Timeout {
                provider: program.clone(),
                timeout_secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(LlmError::Command {
                program: program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl LlmProvider for CommandProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let prompt = render_prompt(messages);
        tracing::debug!(
            program = %self.chat_command[0],
            prompt_len = prompt.len(),
            "running chat command"
        );
        let response = self.run(&self.chat_command, prompt).await?;
        let response = response.trim();
        if response.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.name().to_owned(),
            });
        }
        Ok(response.to_owned())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(argv) = &self.embed_command else {
            return Err(LlmError::EmbedUnsupported {
                provider: self.name().to_owned(),
            });
        };
        let raw = self.run(argv, text.to_owned()).await?;
        let vector: Vec<f32> = serde_json::from_str(raw.trim())?;
        if vector.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.name().to_owned(),
            });
        }
        Ok(vector)
    }

    fn supports_embeddings(&self) -> bool {
        self.embed_command.is_some()
    }

    fn name(&self) -> &str {
        &self.chat_command[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    fn provider(chat: &[&str]) -> CommandProvider {
        CommandProvider::new(argv(chat), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn empty_chat_command_rejected() {
        let err = CommandProvider::new(vec![], Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn name_is_program() {
        assert_eq!(provider(&["cat"]).name(), "cat");
    }

    #[tokio::test]
    async fn chat_pipes_prompt_through_stdin() {
        let p = provider(&["cat"]);
        let out = p.chat(&[Message::user("ping")]).await.unwrap();
        assert_eq!(out, "user:\nping");
    }

    #[tokio::test]
    async fn chat_nonzero_exit_is_command_error() {
        let p = provider(&["sh", "-c", "echo broken >&2; exit 3"]);
        let err = p.chat(&[Message::user("x")]).await.unwrap_err();
        match err {
            LlmError::Command { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_empty_output_is_error() {
        let p = provider(&["true"]);
        let err = p.chat(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn chat_times_out() {
        let p = CommandProvider::new(argv(&["sleep", "5"]), Duration::from_millis(100)).unwrap();
        let err = p.chat(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
    }

    #[tokio::test]
    async fn embed_parses_json_array() {
        let p = provider(&["cat"])
            .with_embed_command(argv(&["sh", "-c", "cat >/dev/null; echo '[0.5, 1.5]'"]))
            .unwrap();
        assert!(p.supports_embeddings());
        let v = p.embed("text").await.unwrap();
        assert_eq!(v, vec![0.5, 1.5]);
    }

    #[tokio::test]
    async fn embed_without_command_unsupported() {
        let p = provider(&["cat"]);
        assert!(!p.supports_embeddings());
        let err = p.embed("text").await.unwrap_err();
        assert!(matches!(err, LlmError::EmbedUnsupported { .. }));
    }

    #[tokio::test]
    async fn embed_invalid_json_is_error() {
        let p = provider(&["cat"])
            .with_embed_command(argv(&["sh", "-c", "cat >/dev/null; echo nope"]))
            .unwrap();
        let err = p.embed("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Json(_)));
    }
}
