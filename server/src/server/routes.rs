//! HTTP route handlers for the landing page

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::AppState;
use crate::auth::Submission;
use crate::landing::{GatePass, render_gate, show_setup_status};
use crate::session::{BrowserToken, Session, generate_browser_token, now_millis};
use crate::view::{Page, render};

/// Cookie that ties a browser to its session
pub const BROWSER_COOKIE: &str = "psim_browser";

const BROWSER_TOKEN_LENGTH: usize = 32;

fn is_valid_browser_token(token: &str) -> bool {
    token.len() == BROWSER_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Extract a well-formed browser token from the `Cookie` header
pub fn browser_token_from_headers(headers: &HeaderMap) -> Option<BrowserToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(BROWSER_COOKIE)?.strip_prefix('='))
        .find(|token| is_valid_browser_token(token))
        .map(str::to_string)
}

/// One page pass for the browser behind `headers`
///
/// Returns the new token when the browser did not present one.
async fn page_pass(
    state: &AppState,
    headers: &HeaderMap,
    submission: Submission,
) -> (Option<BrowserToken>, Page) {
    let now = now_millis();
    let pass = |session: &mut Session| render_gate(&state.gate, session, &submission, now);

    // The session entry is only held for the synchronous gate pass
    let (token, issued, gate_pass) = match browser_token_from_headers(headers) {
        Some(token) => {
            let gate_pass = state.sessions.with_session(&token, now, pass);
            (token, false, gate_pass)
        }
        None => {
            let token = generate_browser_token();
            let gate_pass = state.sessions.start_session(&token, now, pass);
            (token, true, gate_pass)
        }
    };
    let GatePass {
        mut page,
        authenticated,
    } = gate_pass;

    if authenticated {
        show_setup_status(&state.setup, &mut page).await;
    }

    debug!(authenticated, "Rendered landing page");
    (issued.then_some(token), page)
}

fn with_browser_cookie(mut response: Response, token: Option<BrowserToken>) -> Response {
    if let Some(token) = token {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            BROWSER_COOKIE, token
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Failed to build browser cookie: {}", e),
        }
    }
    response
}

fn html_page(page: &Page) -> Response {
    match render(page) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render landing page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET / - Landing page
pub async fn landing_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (token, page) = page_pass(&state, &headers, Submission::default()).await;
    with_browser_cookie(html_page(&page), token)
}

/// POST / - Landing page with submitted credentials
pub async fn submit_landing_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(submission): Form<Submission>,
) -> Response {
    let (token, page) = page_pass(&state, &headers, submission).await;
    with_browser_cookie(html_page(&page), token)
}

/// GET /api/page - Landing page as JSON
pub async fn get_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (token, page) = page_pass(&state, &headers, Submission::default()).await;
    with_browser_cookie(Json(page).into_response(), token)
}

/// POST /api/page - Landing page as JSON with submitted credentials
pub async fn submit_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<Submission>,
) -> Response {
    let (token, page) = page_pass(&state, &headers, submission).await;
    with_browser_cookie(Json(page).into_response(), token)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    browser_setup: &'static str,
    browser_sessions: usize,
    uptime_seconds: u64,
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let browser_setup = state
        .setup
        .outcome()
        .map(|outcome| outcome.as_str())
        .unwrap_or("pending");

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            browser_setup,
            browser_sessions: state.sessions.len(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        }),
    )
}

/// Build the landing page and API routes
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page).post(submit_landing_page))
        .route("/api/page", get(get_page).post(submit_page))
        .route("/health", get(health))
        .with_state(state)
}
