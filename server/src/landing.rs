//! Landing page
//!
//! The gate runs first; only an authenticated session gets the welcome view,
//! the session info sidebar and the browser setup.

use crate::auth::{AuthGate, Submission};
use crate::session::{Session, SessionStateManager};
use crate::setup::{BrowserSetup, SetupOutcome};
use crate::view::{BannerKind, Element, Page};

pub const PAGE_TITLE: &str = "Patient Simulation";
pub const PAGE_ICON: &str = "🔥";

pub const SETUP_READY_MESSAGE: &str =
    "Playwright setup completed successfully. All browsers are installed.";
pub const SETUP_FAILED_MESSAGE: &str =
    "Playwright setup failed. Some features may not work properly.";
pub const SETUP_DISABLED_MESSAGE: &str = "Playwright setup is disabled on this server.";

/// Result of the synchronous part of a page pass
pub struct GatePass {
    pub page: Page,
    pub authenticated: bool,
}

/// Run the gate and, when it lets the user through, build the welcome view
///
/// This part needs exclusive access to the session and never awaits.
pub fn render_gate(
    gate: &AuthGate,
    session: &mut Session,
    submission: &Submission,
    now: u64,
) -> GatePass {
    let mut page = Page::new(PAGE_TITLE, PAGE_ICON);

    if !gate.check_participant(session, submission, now, &mut page) {
        return GatePass {
            page,
            authenticated: false,
        };
    }

    let name = session.authenticated_name.as_deref().unwrap_or_default();
    page.success(format!("Welcome, {}님!", name));
    page.title("Welcome to Patient Simulation");
    page.text("Please select a page from the sidebar to continue.");

    show_session_info(gate.session_manager(), session, now, &mut page);

    GatePass {
        page,
        authenticated: true,
    }
}

/// Sidebar with the session ID and the time left in the window
pub fn show_session_info(
    manager: &SessionStateManager,
    session: &mut Session,
    now: u64,
    page: &mut Page,
) {
    if session.last_activity.is_none() {
        return;
    }

    let remaining = manager.remaining_time(session, now).as_secs();
    let session_id = manager.get_session_id(session);

    page.push_sidebar(Element::Divider);
    page.push_sidebar(Element::Heading {
        text: "세션 정보".to_string(),
    });
    page.push_sidebar(Element::Banner {
        kind: BannerKind::Info,
        text: format!("Session ID: {}", session_id),
    });
    page.push_sidebar(Element::Banner {
        kind: BannerKind::Info,
        text: format!("Time remaining: {}분 {}초", remaining / 60, remaining % 60),
    });
}

/// Append the setup outcome, running the install on first use
pub async fn show_setup_status(setup: &BrowserSetup, page: &mut Page) {
    match setup.ensure().await {
        SetupOutcome::Ready => page.success(SETUP_READY_MESSAGE),
        SetupOutcome::Degraded { .. } => page.warning(SETUP_FAILED_MESSAGE),
        SetupOutcome::Disabled => page.info(SETUP_DISABLED_MESSAGE),
    }
}
