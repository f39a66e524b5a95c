//! Display boundary
//!
//! The gate and landing page decide *what* to show by appending [`Element`]s
//! to a [`Page`]. How the page looks is up to the renderer: [`html::render`]
//! for browsers, serde JSON for API clients.

pub mod html;

use serde::{Deserialize, Serialize};

pub use html::render;

/// Banner severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Info,
    Warning,
    Error,
}

/// A single displayable element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Title {
        text: String,
    },
    Heading {
        text: String,
    },
    Text {
        text: String,
    },
    Markdown {
        text: String,
    },
    Banner {
        kind: BannerKind,
        text: String,
    },
    TextInput {
        /// Form field name
        name: String,
        label: String,
        /// Render as a password field
        masked: bool,
    },
    Divider,
}

/// A rendered page: a main column and a sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub icon: String,
    pub main: Vec<Element>,
    pub sidebar: Vec<Element>,
}

impl Page {
    pub fn new(title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, element: Element) {
        self.main.push(element);
    }

    pub fn push_sidebar(&mut self, element: Element) {
        self.sidebar.push(element);
    }

    pub fn title(&mut self, text: impl Into<String>) {
        self.push(Element::Title { text: text.into() });
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.push(Element::Text { text: text.into() });
    }

    pub fn markdown(&mut self, text: impl Into<String>) {
        self.push(Element::Markdown { text: text.into() });
    }

    pub fn banner(&mut self, kind: BannerKind, text: impl Into<String>) {
        self.push(Element::Banner {
            kind,
            text: text.into(),
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.banner(BannerKind::Success, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.banner(BannerKind::Info, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.banner(BannerKind::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.banner(BannerKind::Error, text);
    }

    pub fn text_input(&mut self, name: &str, label: impl Into<String>, masked: bool) {
        self.push(Element::TextInput {
            name: name.to_string(),
            label: label.into(),
            masked,
        });
    }

    /// Banners of the given kind in the main column, in order
    pub fn banners(&self, kind: BannerKind) -> impl Iterator<Item = &str> {
        self.main.iter().filter_map(move |e| match e {
            Element::Banner { kind: k, text } if *k == kind => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.main
            .iter()
            .any(|e| matches!(e, Element::TextInput { name: n, .. } if n == name))
    }
}
