//! HTML rendering for [`Page`]
//!
//! The document lives in `templates/page.html`; askama escapes every
//! interpolated value.

use super::{BannerKind, Element, Page};
use askama::Template;

/// Full landing page document
#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    icon: &'a str,
    columns: Vec<Column<'a>>,
}

/// `<aside>` or `<main>` with its elements
struct Column<'a> {
    tag: &'static str,
    has_inputs: bool,
    elements: Vec<ElementView<'a>>,
}

/// One element flattened for the template
struct ElementView<'a> {
    kind: &'static str,
    class: &'static str,
    text: &'a str,
    name: &'a str,
    input_type: &'static str,
}

impl<'a> ElementView<'a> {
    fn new(kind: &'static str, text: &'a str) -> Self {
        Self {
            kind,
            class: "",
            text,
            name: "",
            input_type: "",
        }
    }
}

impl<'a> From<&'a Element> for ElementView<'a> {
    fn from(element: &'a Element) -> Self {
        match element {
            Element::Title { text } => Self::new("title", text),
            Element::Heading { text } => Self::new("heading", text),
            Element::Text { text } => Self::new("text", text),
            Element::Markdown { text } => Self::new("markdown", text),
            Element::Banner { kind, text } => Self {
                class: banner_class(*kind),
                ..Self::new("banner", text)
            },
            Element::TextInput {
                name,
                label,
                masked,
            } => Self {
                name,
                input_type: if *masked { "password" } else { "text" },
                ..Self::new("input", label)
            },
            Element::Divider => Self::new("divider", ""),
        }
    }
}

fn banner_class(kind: BannerKind) -> &'static str {
    match kind {
        BannerKind::Success => "success",
        BannerKind::Info => "info",
        BannerKind::Warning => "warning",
        BannerKind::Error => "error",
    }
}

impl<'a> Column<'a> {
    fn new(tag: &'static str, elements: &'a [Element]) -> Self {
        // Inputs are grouped into a single form posted back to the page
        Self {
            tag,
            has_inputs: elements
                .iter()
                .any(|e| matches!(e, Element::TextInput { .. })),
            elements: elements.iter().map(ElementView::from).collect(),
        }
    }
}

/// Render a full HTML document
pub fn render(page: &Page) -> Result<String, askama::Error> {
    let mut columns = Vec::with_capacity(2);
    if !page.sidebar.is_empty() {
        columns.push(Column::new("aside", &page.sidebar));
    }
    columns.push(Column::new("main", &page.main));

    PageTemplate {
        title: &page.title,
        icon: &page.icon,
        columns,
    }
    .render()
}
