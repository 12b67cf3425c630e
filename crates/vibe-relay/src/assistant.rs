use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use vibe_core::storage::AssistantSettings;

/// Programs tried, in order, when no assistant program is configured.
pub const KNOWN_ASSISTANTS: &[&str] = &["claude", "codex"];

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no assistant configured and none of {0:?} found in PATH")]
    NotConfigured(&'static [&'static str]),
    #[error("assistant program '{0}' not found")]
    ProgramNotFound(String),
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to hand prompt to {program}: {source}")]
    Stdin {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// An external text-generation assistant that accepts a query.
///
/// Whatever the assistant does with the query (typically editing the document
/// on disk) comes back through the file watcher, never as a return value.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn open_chat(&self, query: &str) -> Result<(), RelayError>;
}

/// Hands the query to a local agent CLI on stdin, running in the project folder.
#[derive(Debug, Clone)]
pub struct CommandAssistant {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandAssistant {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        CommandAssistant {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Resolve the configured program on PATH, or detect a known one.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Self, RelayError> {
        let program = match &settings.program {
            Some(name) => {
                which::which(name).map_err(|_| RelayError::ProgramNotFound(name.clone()))?
            }
            None => KNOWN_ASSISTANTS
                .iter()
                .find_map(|name| which::which(name).ok())
                .ok_or(RelayError::NotConfigured(KNOWN_ASSISTANTS))?,
        };
        debug!(program = %program.display(), "resolved assistant program");
        Ok(CommandAssistant::new(program, settings.args.clone()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Assistant for CommandAssistant {
    async fn open_chat(&self, query: &str) -> Result<(), RelayError> {
        let name = self.program.display().to_string();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| RelayError::Spawn {
            program: name.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(query.as_bytes()).await {
                // Don't leave the agent running without its prompt.
                if let Err(e) = child.kill().await {
                    warn!(program = %name, error = %e, "failed to stop assistant");
                }
                return Err(RelayError::Stdin {
                    program: name,
                    source,
                });
            }
            // Dropping stdin closes it so the agent sees end of input.
        }

        info!(program = %name, bytes = query.len(), "relayed query to assistant");
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!(program = %name, "assistant finished"),
                Ok(status) => warn!(program = %name, %status, "assistant exited with failure"),
                Err(e) => warn!(program = %name, error = %e, "assistant wait failed"),
            }
        });
        Ok(())
    }
}
