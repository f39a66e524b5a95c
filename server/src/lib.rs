//! Patient Simulation Server Library
//!
//! This module exports the server components for use in integration tests
//! and the `patientsim` binary.

pub mod auth;
pub mod config;
pub mod landing;
pub mod server;
pub mod session;
pub mod setup;
pub mod view;

// Re-export commonly used types
pub use auth::{AuthError, AuthGate, Submission};
pub use config::Config;
pub use server::{AppState, app_routes};
pub use session::{Session, SessionStateManager, SessionStore};
pub use setup::{BrowserSetup, Installer, SetupError, SetupOutcome};
pub use view::{Element, Page};
