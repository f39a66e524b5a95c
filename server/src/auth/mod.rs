//! Login gate
//!
//! Users get in either with a pre-registered login key or by supplying their
//! own API key. Failures only re-prompt; there is no lockout.

mod gate;

pub use gate::{
    AuthError, AuthGate, EXPIRED_MESSAGE, EXTERNAL_KEY_FIELD, KEY_SAVED_MESSAGE, LOGIN_KEY_FIELD,
    Submission, UNREGISTERED_MESSAGE,
};
