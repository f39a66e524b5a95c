//! HTTP hosting layer
//!
//! Owns the per-browser session store and hands each request's session to
//! the gate by `&mut`.

pub mod routes;

pub use routes::{BROWSER_COOKIE, app_routes, browser_token_from_headers};

use crate::auth::AuthGate;
use crate::config::Config;
use crate::session::{SessionStateManager, SessionStore};
use crate::setup::BrowserSetup;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub gate: Arc<AuthGate>,
    pub setup: Arc<BrowserSetup>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let manager = SessionStateManager::with_timeout(config.session.timeout);
        Self {
            sessions: Arc::new(SessionStore::new()),
            gate: Arc::new(AuthGate::new(&config.auth, manager)),
            setup: Arc::new(BrowserSetup::from_config(&config.setup)),
            started_at: Instant::now(),
        }
    }

    pub fn with_gate(mut self, gate: AuthGate) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    pub fn with_setup(mut self, setup: BrowserSetup) -> Self {
        self.setup = Arc::new(setup);
        self
    }
}
