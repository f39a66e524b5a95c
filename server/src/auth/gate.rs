use crate::config::AuthConfig;
use crate::session::{Credential, GUEST_NAME, Session, SessionStateManager};
use crate::view::Page;
use metrics::counter;
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const EXPIRED_MESSAGE: &str =
    "세션이 만료되었습니다. 다시 로그인해 주세요. (Session expired. Please log in again.)";
pub const LOGIN_KEY_LABEL: &str = "로그인 키를 입력하십시오. (Enter login key)";
pub const UNREGISTERED_MESSAGE: &str = "😕 등록되지 않은 이름입니다. (Unregistered login key.)";
pub const EXTERNAL_KEY_HINT: &str =
    "또는 OpenAI API 키를 직접 입력할 수 있습니다. (Or enter your OpenAI API key directly.)";
pub const EXTERNAL_KEY_LABEL: &str = "OpenAI API Key";
pub const KEY_SAVED_MESSAGE: &str = "✅ API 키가 저장되었습니다. (API key saved.)";

/// Form field carrying the login key
pub const LOGIN_KEY_FIELD: &str = "login_key";
/// Form field carrying the user's own API key
pub const EXTERNAL_KEY_FIELD: &str = "api_key";

/// Gate errors. Both are recovered by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Session has expired")]
    SessionExpired,

    #[error("Login key is not registered")]
    InvalidCredential,
}

impl AuthError {
    /// Bilingual text shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::SessionExpired => EXPIRED_MESSAGE,
            AuthError::InvalidCredential => UNREGISTERED_MESSAGE,
        }
    }
}

/// Values submitted through the credential prompts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub login_key: Option<String>,
    #[serde(default)]
    pub api_key: Option<Credential>,
}

impl Submission {
    pub fn login_key(key: impl Into<String>) -> Self {
        Self {
            login_key: Some(key.into()),
            api_key: None,
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            login_key: None,
            api_key: Some(Credential::new(key)),
        }
    }

    fn submitted_login_key(&self) -> Option<&str> {
        self.login_key.as_deref().filter(|k| !k.is_empty())
    }

    fn submitted_api_key(&self) -> Option<&Credential> {
        self.api_key.as_ref().filter(|k| !k.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.submitted_login_key().is_none() && self.submitted_api_key().is_none()
    }
}

/// Decides whether a session is authenticated and captures credentials
pub struct AuthGate {
    participants: BTreeSet<String>,
    default_credential: Option<Credential>,
    sessions: SessionStateManager,
}

impl AuthGate {
    pub fn new(config: &AuthConfig, sessions: SessionStateManager) -> Self {
        Self {
            participants: config.participants.clone(),
            default_credential: config.default_credential.clone(),
            sessions,
        }
    }

    pub fn session_manager(&self) -> &SessionStateManager {
        &self.sessions
    }

    /// Exact, case-sensitive allow-list membership
    pub fn is_registered(&self, key: &str) -> bool {
        self.participants.contains(key)
    }

    /// Authenticate with a pre-registered login key
    ///
    /// On a mismatch the session is left untouched.
    pub fn login_with_key(
        &self,
        session: &mut Session,
        key: &str,
        now: u64,
    ) -> Result<(), AuthError> {
        if !self.is_registered(key) {
            counter!("patientsim_logins_total", "method" => "login_key", "outcome" => "rejected")
                .increment(1);
            warn!("Rejected unregistered login key");
            return Err(AuthError::InvalidCredential);
        }

        session.authenticate(key.to_string(), self.default_credential.clone(), now);
        counter!("patientsim_logins_total", "method" => "login_key", "outcome" => "accepted")
            .increment(1);
        info!("Participant {} logged in with a registered key", key);
        Ok(())
    }

    /// Authenticate as a guest with the user's own API key
    pub fn login_with_external_key(&self, session: &mut Session, key: Credential, now: u64) {
        session.authenticate(GUEST_NAME.to_string(), Some(key), now);
        counter!("patientsim_logins_total", "method" => "external_key", "outcome" => "accepted")
            .increment(1);
        info!("Guest supplied an external API key");
    }

    /// Run the gate for one page pass
    ///
    /// Returns `true` only when the session was already authenticated at the
    /// time the state was evaluated, or a registered login key was just
    /// accepted. An external key submitted in this pass is stored but the
    /// caller sees `false` until the next pass.
    pub fn check_participant(
        &self,
        session: &mut Session,
        submission: &Submission,
        now: u64,
        page: &mut Page,
    ) -> bool {
        let was_authenticated = session.is_authenticated();

        // A login key is applied before the timeout check, so a correct key
        // typed after idling on the login form counts as fresh activity
        let mut rejected = None;
        if !was_authenticated
            && let Some(key) = submission.submitted_login_key()
            && let Err(e) = self.login_with_key(session, key, now)
        {
            rejected = Some(e);
        }

        if !self.sessions.check_timeout(session, now) {
            page.warning(AuthError::SessionExpired.user_message());
            return false;
        }

        if session.is_authenticated() {
            if was_authenticated && !submission.is_empty() {
                debug!("Ignoring credential submission from an authenticated session");
            }
            return true;
        }

        page.text_input(LOGIN_KEY_FIELD, LOGIN_KEY_LABEL, false);
        if let Some(e) = rejected {
            page.error(e.user_message());
        }

        page.markdown(EXTERNAL_KEY_HINT);
        page.text_input(EXTERNAL_KEY_FIELD, EXTERNAL_KEY_LABEL, true);

        if let Some(key) = submission.submitted_api_key() {
            self.login_with_external_key(session, key.clone(), now);
            page.success(KEY_SAVED_MESSAGE);
        }

        false
    }
}
