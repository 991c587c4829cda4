//! HTML boilerplate stripping and Markdown conversion
//!
//! Tag and attribute stripping streams through `lol_html`; pruning blank and
//! navigation elements needs the whole tree, so that pass runs on `scraper`.

use lol_html::{element, rewrite_str, RewriteStrSettings};
use scout_core::{ErrorContext, MarkdownConverter, ScoutError, ScoutResult};
use scraper::{ElementRef, Html, Selector};

/// Tags removed together with their content
pub const STRIPPED_TAGS: &str = "script, style, link, meta, nav, header, footer, aside, img, \
     button, form, input, svg, canvas, figure, select, checkbox, label";

/// Attributes surviving the attribute pass
const KEPT_ATTRIBUTES: [&str; 2] = ["id", "class"];

/// Elements whose `id` contains one of these, or whose class list holds one exactly, are dropped
const NAVIGATION_MARKERS: [&str; 1] = ["nav"];

/// Keywords typical of bot-check and consent interstitials
const INTERSTITIAL_KEYWORDS: [&str; 7] =
    ["javascript", "cookie", "human", "enable", "verify", "err", "error"];

/// Below this length content is checked for interstitial keywords
const INTERSTITIAL_CHECK_CHARS: usize = 550;

/// Below this length content is discarded outright
const MIN_CONTENT_CHARS: usize = 400;

/// Strip non-content markup and return the cleaned `<body>` element
pub fn clean_html(html: &str) -> ScoutResult<String> {
    let stripped = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(STRIPPED_TAGS, |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let doomed: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| !KEPT_ATTRIBUTES.contains(&name.as_str()))
                        .collect();
                    for name in doomed {
                        el.remove_attribute(&name);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ScoutError::Internal {
        message: format!("HTML rewrite failed: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("html").with_operation("strip_tags"),
    })?;

    let mut document = Html::parse_document(&stripped);

    let doomed: Vec<_> = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let element = ElementRef::wrap(node)?;
            if matches!(element.value().name(), "html" | "head" | "body") {
                return None;
            }
            (is_blank(&element) || is_navigation(&element)).then(|| node.id())
        })
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let body = Selector::parse("body").map_err(|e| ScoutError::Internal {
        message: format!("Invalid selector: {:?}", e),
        source: None,
        context: ErrorContext::new("html").with_operation("select_body"),
    })?;

    Ok(document
        .select(&body)
        .next()
        .map(|element| element.html())
        .unwrap_or_default())
}

fn is_blank(element: &ElementRef<'_>) -> bool {
    element.text().all(|text| text.trim().is_empty())
}

fn is_navigation(element: &ElementRef<'_>) -> bool {
    let element = element.value();
    let id_matches = element
        .id()
        .is_some_and(|id| NAVIGATION_MARKERS.iter().any(|m| id.contains(m)));
    id_matches || element.classes().any(|class| NAVIGATION_MARKERS.contains(&class))
}

/// Collapse blank lines and runs of spaces until none remain
pub fn normalize_markdown(markdown: &str) -> String {
    let mut text = markdown.to_string();
    while text.contains("\n\n") {
        text = text.replace("\n\n", "\n");
    }
    while text.contains("  ") {
        text = text.replace("  ", " ");
    }
    text
}

/// Apply the interstitial and minimum-length gates, returning "" on rejection
pub fn quality_gate(content: String) -> String {
    let length = content.chars().count();

    if length < INTERSTITIAL_CHECK_CHARS {
        let lower = content.to_lowercase();
        if INTERSTITIAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return String::new();
        }
    }

    if length < MIN_CONTENT_CHARS {
        return String::new();
    }

    content
}

/// Truncate to at most `max_chars` characters
pub fn truncate_chars(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => content[..byte_index].to_string(),
        None => content,
    }
}

/// [`MarkdownConverter`] backed by `html2md-rs`
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2MdConverter;

impl MarkdownConverter for Html2MdConverter {
    fn convert(&self, html: &str) -> ScoutResult<String> {
        html2md_rs::to_md::safe_from_html_to_md(html.to_string()).map_err(|e| {
            ScoutError::Internal {
                message: format!("Markdown conversion failed: {:?}", e),
                source: None,
                context: ErrorContext::new("html").with_operation("to_markdown"),
            }
        })
    }
}
