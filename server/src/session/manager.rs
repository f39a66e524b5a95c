use crate::session::state::{Session, SessionId, generate_session_id};
use metrics::counter;
use std::time::Duration;
use tracing::{debug, info};

/// Default sliding inactivity window
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Session state manager: identity and sliding-window timeout for a [`Session`]
///
/// The manager holds no session data itself; every operation works on the
/// session it is handed.
#[derive(Debug, Clone, Copy)]
pub struct SessionStateManager {
    timeout: Duration,
}

impl SessionStateManager {
    pub fn new() -> Self {
        Self {
            timeout: SESSION_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the session ID, generating one on first access
    pub fn get_session_id(&self, session: &mut Session) -> SessionId {
        session
            .session_id
            .get_or_insert_with(|| {
                let id = generate_session_id();
                debug!("Issued session id {}", id);
                id
            })
            .clone()
    }

    /// Validate and extend the sliding window
    ///
    /// Returns `false` and clears the session when more than the timeout has
    /// passed since the last recorded activity. Any other call records `now`
    /// as the latest activity.
    pub fn check_timeout(&self, session: &mut Session, now: u64) -> bool {
        let Some(last_activity) = session.last_activity else {
            session.touch(now);
            return true;
        };

        let elapsed = now.saturating_sub(last_activity);
        if elapsed > self.timeout_millis() {
            info!(
                "Session {} expired after {}s of inactivity",
                session.session_id.as_deref().unwrap_or("<unissued>"),
                elapsed / 1000
            );
            session.clear();
            counter!("patientsim_sessions_expired_total").increment(1);
            return false;
        }

        session.touch(now);
        true
    }

    /// Time left before the session expires, for display only
    pub fn remaining_time(&self, session: &Session, now: u64) -> Duration {
        let Some(last_activity) = session.last_activity else {
            return self.timeout;
        };
        let elapsed = Duration::from_millis(now.saturating_sub(last_activity));
        self.timeout.saturating_sub(elapsed)
    }

    fn timeout_millis(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new()
    }
}
