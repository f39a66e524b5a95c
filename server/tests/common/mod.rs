//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use patientsim_server::config::{AuthConfig, Config};
use patientsim_server::session::{Credential, SessionStateManager};
use patientsim_server::{AppState, AuthGate, BrowserSetup, Installer, SetupError, app_routes};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::util::ServiceExt;

pub const DEFAULT_CREDENTIAL: &str = "sk-system-default";

/// Installer that records how often it ran
pub struct MockInstaller {
    calls: AtomicUsize,
    fail: bool,
}

impl MockInstaller {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Installer for MockInstaller {
    async fn install(&self) -> Result<(), SetupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SetupError::Exit {
                program: "playwright".to_string(),
                status: "exit status: 1".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn describe(&self) -> String {
        "mock install".to_string()
    }
}

/// Test application: router plus the pieces tests want to inspect
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub installer: Arc<MockInstaller>,
}

/// Allow-list = {"alice"}, 15 minute timeout, succeeding installer
pub fn create_test_app() -> TestApp {
    create_test_app_with(MockInstaller::succeeding(), SessionStateManager::new())
}

pub fn create_test_app_with(installer: Arc<MockInstaller>, manager: SessionStateManager) -> TestApp {
    let auth = AuthConfig {
        participants: ["alice".to_string()].into_iter().collect(),
        default_credential: Some(Credential::new(DEFAULT_CREDENTIAL)),
        ..AuthConfig::default()
    };
    let state = AppState::new(&Config::default())
        .with_gate(AuthGate::new(&auth, manager))
        .with_setup(BrowserSetup::new(installer.clone()));

    TestApp {
        router: app_routes(state.clone()),
        state,
        installer,
    }
}

/// App whose sessions expire after `timeout`
pub fn create_test_app_with_timeout(timeout: Duration) -> TestApp {
    create_test_app_with(
        MockInstaller::succeeding(),
        SessionStateManager::with_timeout(timeout),
    )
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Read a response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// `name=value` part of the Set-Cookie header, if any
pub fn issued_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// JSON request against /api/page carrying the browser cookie
pub fn page_request(cookie: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/page");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.method("GET").body(Body::empty()).unwrap(),
    }
}

/// Texts of the main-column banners of the given kind
pub fn banners(page: &serde_json::Value, kind: &str) -> Vec<String> {
    page["main"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == "banner" && e["kind"] == kind)
        .map(|e| e["text"].as_str().unwrap().to_string())
        .collect()
}

/// Names of the input fields on the page
pub fn inputs(page: &serde_json::Value) -> Vec<String> {
    page["main"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == "text_input")
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect()
}
