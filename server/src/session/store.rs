//! Per-browser session storage
//!
//! Each browser is identified by an opaque token carried in a cookie. The
//! store keeps one [`Session`] per token in memory only.

use crate::session::state::Session;
use dashmap::DashMap;
use metrics::gauge;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque token identifying one browser
pub type BrowserToken = String;

/// Generate a fresh browser token
pub fn generate_browser_token() -> BrowserToken {
    Uuid::new_v4().simple().to_string()
}

struct StoredSession {
    session: Session,
    /// Last time the browser sent any request (milliseconds)
    seen_at: u64,
}

/// In-memory map from browser token to session
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<BrowserToken, StoredSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the browser's session, creating an
    /// empty one on first use.
    ///
    /// Only this browser's entry is locked while `f` runs.
    pub fn with_session<R>(&self, token: &str, now: u64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut inserted = false;
        let result = {
            let mut entry = self
                .sessions
                .entry(token.to_string())
                .or_insert_with(|| {
                    debug!("New browser session {}", token);
                    inserted = true;
                    StoredSession {
                        session: Session::new(),
                        seen_at: now,
                    }
                });
            entry.seen_at = entry.seen_at.max(now);
            f(&mut entry.session)
        };
        if inserted {
            self.record_size();
        }
        result
    }

    /// Run `f` on a fresh session for a browser that has no token yet
    ///
    /// The session is only stored when `f` leaves something worth keeping
    /// (a login or an issued session id), so clients that drop cookies do
    /// not grow the map.
    pub fn start_session<R>(&self, token: &str, now: u64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = Session::new();
        let result = f(&mut session);
        if session.is_authenticated() || session.session_id.is_some() {
            debug!("New browser session {}", token);
            self.sessions.insert(
                token.to_string(),
                StoredSession {
                    session,
                    seen_at: now,
                },
            );
            self.record_size();
        }
        result
    }

    /// Snapshot of a browser's session, if any
    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.session.clone())
    }

    /// Forget browsers that have not been seen within `retention`
    pub fn cleanup_abandoned(&self, now: u64, retention: Duration) -> usize {
        let retention_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
        let before = self.sessions.len();
        self.sessions
            .retain(|_, stored| now.saturating_sub(stored.seen_at) <= retention_ms);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("Forgot {} abandoned browser sessions", removed);
        }
        self.record_size();
        removed
    }

    fn record_size(&self) {
        gauge!("patientsim_browser_sessions").set(self.sessions.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
