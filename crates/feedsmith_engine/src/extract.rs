use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::types::{ExtractedItem, RawDocument, SourceConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("bad selector {rule:?}: {message}")]
    BadSelector { rule: String, message: String },
}

pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        document: &RawDocument,
        source: &SourceConfig,
    ) -> Result<Vec<ExtractedItem>, ExtractError>;
}

/// Selector-driven extractor:
/// - rules run in the order given, matches in document order within a rule
/// - element text is tag-stripped, whitespace-collapsed and trimmed;
///   elements left empty are dropped
/// - an anchor inside (or on) the match supplies the item URL, resolved
///   against the source URL; otherwise the source URL is used
/// - overlapping rules emit duplicate items on purpose
#[derive(Debug, Default)]
pub struct SelectorExtractor;

impl Extractor for SelectorExtractor {
    fn extract(
        &self,
        document: &RawDocument,
        source: &SourceConfig,
    ) -> Result<Vec<ExtractedItem>, ExtractError> {
        let doc = Html::parse_document(&document.html);
        let base = Url::parse(&source.url).ok();
        let anchor_sel = Selector::parse("a[href]").ok();

        let mut items = Vec::new();
        for rule in source.rules() {
            let selector = Selector::parse(rule).map_err(|err| ExtractError::BadSelector {
                rule: rule.to_string(),
                message: err.to_string(),
            })?;
            for element in doc.select(&selector) {
                let text = collapse_whitespace(element.text());
                if text.is_empty() {
                    continue;
                }
                let url = element_link(&element, anchor_sel.as_ref(), base.as_ref())
                    .unwrap_or_else(|| source.url.clone());
                items.push(ExtractedItem { text, url });
            }
        }
        Ok(items)
    }
}

/// Collapse every whitespace run (newlines included) to one space and trim.
fn collapse_whitespace<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for piece in pieces {
        for ch in piece.chars() {
            if ch.is_whitespace() {
                pending_space = !out.is_empty();
            } else {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(ch);
            }
        }
    }
    out
}

fn element_link(
    element: &ElementRef,
    anchor_sel: Option<&Selector>,
    base: Option<&Url>,
) -> Option<String> {
    let href = if element.value().name().eq_ignore_ascii_case("a") {
        element.value().attr("href")
    } else {
        anchor_sel.and_then(|sel| {
            element
                .select(sel)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
        })
    };
    resolve_url(href?.trim(), base)
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(reference) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(reference).ok())
        .map(String::from)
}
