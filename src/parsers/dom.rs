//! Model extraction from rendered page markup.
//!
//! Used when structured data is missing or incomplete: each card-like element
//! is reduced to its text, a handful of identifying attributes and the slugs
//! of its first links, and the model-shape patterns are applied to those.

use crate::normalizer::MODEL_PATTERNS;
use crate::results::{CandidateSource, ModelCandidate};
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

/// Selector for product-card-like elements
pub const CARD_SELECTOR: &str = "li.product-grid__item, .product-card, article.product, \
     .product-list__item, [data-model], [data-sku], [data-product-id], [data-modelcode]";

/// Maximum number of cards scanned per page
pub const MAX_CARDS: usize = 80;

/// Maximum number of elements per card whose attributes are read
const MAX_ATTRIBUTE_ELEMENTS: usize = 30;

/// Maximum number of links per card whose slug is read
const MAX_LINKS: usize = 10;

const IDENTIFYING_ATTRIBUTES: [&str; 8] = [
    "alt",
    "aria-label",
    "href",
    "src",
    "data-model",
    "data-modelcode",
    "data-sku",
    "data-product-id",
];

static CARDS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CARD_SELECTOR).expect("valid card selector"));
static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static TITLES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, h4, [class*='title'], [class*='name']").expect("valid title selector")
});
static NEXT_DATA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#__NEXT_DATA__").expect("valid next data selector"));
static JSON_LD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid json-ld selector")
});

/// Scans up to `max_cards` visible cards and returns one candidate per card at most
pub fn scan_cards(html: &str, max_cards: usize) -> Vec<ModelCandidate> {
    let doc = Html::parse_document(html);
    let cards: Vec<ElementRef> = doc
        .select(&CARDS)
        .filter(|card| !is_statically_hidden(card))
        .take(max_cards)
        .collect();

    ::log::debug!("DOM scanner found {} card-like elements", cards.len());

    cards.into_iter().filter_map(scan_card).collect()
}

/// Reads the identifying segments of one card and returns its first accepted model
fn scan_card(card: ElementRef) -> Option<ModelCandidate> {
    let segments = card_segments(card);
    let title = card_title(card);

    for pattern in MODEL_PATTERNS.iter() {
        for (source, segment) in &segments {
            for hit in pattern.find_iter(segment) {
                let raw = hit.as_str().to_uppercase();
                if let Some(candidate) = ModelCandidate::from_raw(&raw, &title, *source) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Text, attribute and link-slug segments of a card, in that order
pub fn card_segments(card: ElementRef) -> [(CandidateSource, String); 3] {
    [
        (CandidateSource::DomText, visible_text(card)),
        (CandidateSource::DomAttribute, attribute_text(card)),
        (CandidateSource::LinkSlug, link_slugs(card).join(" ")),
    ]
}

fn visible_text(card: ElementRef) -> String {
    let mut out = String::new();
    for node in card.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| matches!(parent.value().name(), "script" | "style" | "noscript"));
        if in_code {
            continue;
        }
        out.push_str(text);
        out.push(' ');
    }
    collapse_whitespace(&out)
}

fn attribute_text(card: ElementRef) -> String {
    card.descendants()
        .filter_map(ElementRef::wrap)
        .take(MAX_ATTRIBUTE_ELEMENTS)
        .flat_map(|el| {
            IDENTIFYING_ATTRIBUTES
                .iter()
                .filter_map(move |name| el.value().attr(name))
        })
        .filter(|value| !value.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last path segment of each of the card's first links
pub fn link_slugs(card: ElementRef) -> Vec<String> {
    card.select(&LINKS)
        .take(MAX_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(href_slug)
        .collect()
}

fn href_slug(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let slug = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

fn card_title(card: ElementRef) -> String {
    card.select(&TITLES)
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|title| !title.is_empty())
        .unwrap_or_default()
}

/// Whether markup alone says the element is not rendered
fn is_statically_hidden(el: &ElementRef) -> bool {
    let value = el.value();
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

/// Embedded state documents serialized into the markup.
///
/// Returns the parsed `__NEXT_DATA__` script followed by every JSON-LD block.
/// Blocks that fail to parse are skipped.
pub fn embedded_state_documents(html: &str) -> Vec<Value> {
    let doc = Html::parse_document(html);
    doc.select(&NEXT_DATA)
        .chain(doc.select(&JSON_LD))
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    ::log::debug!("Skipping unparseable embedded state block: {}", e);
                    None
                }
            }
        })
        .collect()
}
