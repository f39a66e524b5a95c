use serde::Deserialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Session ID: UUID v4 in its hyphenated text form
pub type SessionId = String;

/// Name recorded for users who bring their own API key
pub const GUEST_NAME: &str = "Guest";

/// Generate a new opaque session ID
pub fn generate_session_id() -> SessionId {
    Uuid::new_v4().to_string()
}

/// Get current timestamp in milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A secret held only in memory. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the raw secret
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Authentication state derived from the session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Per-browser session data
#[derive(Debug, Clone, Default)]
pub struct Session {
    // Identity
    pub session_id: Option<SessionId>,

    // Timestamps (milliseconds since the Unix epoch)
    pub last_activity: Option<u64>,

    // Authentication
    pub authenticated_name: Option<String>,
    pub auth_confirmed: bool,
    pub credential: Option<Credential>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_state(&self) -> AuthState {
        if self.authenticated_name.is_some() && self.auth_confirmed {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state() == AuthState::Authenticated
    }

    /// Record a successful authentication. Any earlier name or credential is
    /// replaced.
    pub fn authenticate(&mut self, name: String, credential: Option<Credential>, now: u64) {
        self.authenticated_name = Some(name);
        self.auth_confirmed = true;
        self.credential = credential;
        self.touch(now);
    }

    /// Move `last_activity` forward to `now`; never backwards.
    pub fn touch(&mut self, now: u64) {
        self.last_activity = Some(self.last_activity.map_or(now, |last| last.max(now)));
    }

    /// Forget identity, authentication and activity
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("sk-secret");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("sk-secret"));
        assert_eq!(credential.expose(), "sk-secret");
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::new();
        assert_eq!(session.auth_state(), AuthState::Unauthenticated);
        assert!(session.session_id.is_none());
        assert!(session.last_activity.is_none());
    }

    #[test]
    fn test_authenticate_overwrites_previous_identity() {
        let mut session = Session::new();
        session.authenticate("alice".to_string(), Some(Credential::new("default")), 10);
        session.authenticate(GUEST_NAME.to_string(), Some(Credential::new("sk-user")), 20);

        assert_eq!(session.authenticated_name.as_deref(), Some(GUEST_NAME));
        assert_eq!(
            session.credential.as_ref().map(Credential::expose),
            Some("sk-user")
        );
        assert_eq!(session.last_activity, Some(20));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_name_without_confirmation_is_not_authenticated() {
        let session = Session {
            authenticated_name: Some("alice".to_string()),
            ..Session::default()
        };
        assert_eq!(session.auth_state(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut session = Session::new();
        session.touch(100);
        session.touch(50);
        assert_eq!(session.last_activity, Some(100));
        session.touch(150);
        assert_eq!(session.last_activity, Some(150));
    }
}
