//! Installer trait and the external-command implementation

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::SetupConfig;

/// Setup failures. All of them degrade the page instead of failing it.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },

    #[error("Unexpected setup failure: {0}")]
    Unexpected(String),
}

/// Something that installs the headless browser runtime
#[async_trait]
pub trait Installer: Send + Sync {
    /// Perform the install. Must be safe to repeat.
    async fn install(&self) -> Result<(), SetupError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Runs an external command such as `playwright install chromium`
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &SetupConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self) -> Result<(), SetupError> {
        debug!("Running {}", self.describe());
        let status = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| SetupError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SetupError::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
