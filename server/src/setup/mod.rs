//! One-time browser automation setup
//!
//! This module provides:
//! - `Installer` trait for abstracting how the browser runtime gets installed
//! - `CommandInstaller` for running the external install command
//! - `BrowserSetup`, the process-wide init-once guard around an installer

mod installer;

pub use installer::{CommandInstaller, Installer, SetupError};

use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::SetupConfig;

/// Cached result of the one-time setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SetupOutcome {
    /// The runtime is installed
    Ready,
    /// Install failed; the app keeps running with reduced features
    Degraded { reason: String },
    /// Setup is turned off by configuration
    Disabled,
}

impl SetupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupOutcome::Ready => "ready",
            SetupOutcome::Degraded { .. } => "degraded",
            SetupOutcome::Disabled => "disabled",
        }
    }
}

/// Runs the installer at most once per process
///
/// Concurrent first callers wait on the same initialization; every later
/// caller gets the cached outcome.
pub struct BrowserSetup {
    installer: Option<Arc<dyn Installer>>,
    outcome: OnceCell<SetupOutcome>,
}

impl BrowserSetup {
    pub fn new(installer: Arc<dyn Installer>) -> Self {
        Self {
            installer: Some(installer),
            outcome: OnceCell::new(),
        }
    }

    /// A guard that never installs anything
    pub fn disabled() -> Self {
        Self {
            installer: None,
            outcome: OnceCell::new(),
        }
    }

    pub fn from_config(config: &SetupConfig) -> Self {
        if config.enabled {
            Self::new(Arc::new(CommandInstaller::from_config(config)))
        } else {
            info!("Browser setup disabled by configuration");
            Self::disabled()
        }
    }

    /// Run the install if it has not run yet and return the outcome
    pub async fn ensure(&self) -> &SetupOutcome {
        self.outcome.get_or_init(|| self.run()).await
    }

    /// Outcome so far, without triggering the install
    pub fn outcome(&self) -> Option<&SetupOutcome> {
        self.outcome.get()
    }

    async fn run(&self) -> SetupOutcome {
        let Some(installer) = self.installer.clone() else {
            return SetupOutcome::Disabled;
        };

        let description = installer.describe();
        info!("Setting up browser runtime: {}", description);
        let start = Instant::now();

        // A panicking installer surfaces as a JoinError instead of unwinding
        // through the page render.
        let result = match tokio::spawn(async move { installer.install().await }).await {
            Ok(result) => result,
            Err(e) => Err(SetupError::Unexpected(e.to_string())),
        };

        match result {
            Ok(()) => {
                info!(
                    "Browser runtime ready after {:.1}s",
                    start.elapsed().as_secs_f64()
                );
                counter!("patientsim_setup_runs_total", "outcome" => "ready").increment(1);
                SetupOutcome::Ready
            }
            Err(e) => {
                warn!("Browser setup failed ({}): {}", description, e);
                counter!("patientsim_setup_runs_total", "outcome" => "degraded").increment(1);
                SetupOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}
