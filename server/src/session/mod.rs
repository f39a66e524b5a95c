pub mod manager;
pub mod state;
pub mod store;

pub use manager::{SESSION_TIMEOUT, SessionStateManager};
pub use state::{AuthState, Credential, GUEST_NAME, Session, SessionId, now_millis};
pub use store::{BrowserToken, SessionStore, generate_browser_token};
