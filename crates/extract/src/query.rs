// ABOUTME: Read-only DOM query adapter over a rendered-HTML snapshot.
// ABOUTME: Provides text, attribute, and background-image queries with a compiled-selector cache.

//! DOM queries against a snapshot of the rendered page.
//!
//! The pipeline takes the page HTML once and parses it into a `PageSnapshot`;
//! every field query runs against that snapshot, so results are stable across
//! repeated calls within one session.
//!
//! Key behaviors:
//! - Selectors are compiled once per process and cached.
//! - Text extraction joins inner text with spaces and normalizes whitespace.
//! - Queries on invalid selectors yield empty results instead of failing.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::text::collapse_whitespace;

/// Thread-safe cache of compiled CSS selectors.
///
/// Selector parsing is expensive relative to the actual matching, and the
/// profile table reuses the same handful of selectors for every article.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Matches the value inside a CSS `url(...)`; quotes are stripped afterwards.
static CSS_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"url\(([^)]+)\)").expect("css url regex"));

/// Looks up a compiled selector, parsing and caching it on first use.
///
/// Invalid selectors come back as `None` and are cached too, so a bad
/// selector string is only parsed once per process.
pub(crate) fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap();
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    let mut cache = SELECTOR_CACHE.write().unwrap();
    // Re-check under the write lock; another thread may have raced us here.
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// A parsed snapshot of the rendered page DOM.
pub struct PageSnapshot {
    doc: Html,
}

impl PageSnapshot {
    /// Parses rendered page HTML into a queryable snapshot.
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Returns the trimmed, whitespace-collapsed text of the first matching
    /// element that has any text; empty string when nothing matches.
    pub fn text_of(&self, selector: &str) -> String {
        let Some(sel) = get_or_compile(selector) else {
            return String::new();
        };
        self.doc
            .select(&sel)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Tries each selector in order and returns the first non-empty text.
    ///
    /// This is the fallback chain for sites whose markup varies by article
    /// type; empty string when no selector yields text.
    pub fn text_of_first_matching(&self, selectors: &[String]) -> String {
        for selector in selectors {
            let text = self.text_of(selector);
            if !text.is_empty() {
                return text;
            }
        }
        String::new()
    }

    /// Returns the first non-empty value of `attribute` among matching
    /// elements, trimmed; empty string when absent.
    pub fn attribute_of(&self, selector: &str, attribute: &str) -> String {
        let Some(sel) = get_or_compile(selector) else {
            return String::new();
        };
        self.doc
            .select(&sel)
            .filter_map(|el| el.value().attr(attribute))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    /// Returns the trimmed text of every matching element in document order,
    /// optionally capped to the first `limit` matching elements.
    ///
    /// The cap counts elements, not surviving texts; empty elements inside
    /// the cap are dropped from the output but still consume it.
    pub fn all_text_of(&self, selector: &str, limit: Option<usize>) -> Vec<String> {
        let Some(sel) = get_or_compile(selector) else {
            return Vec::new();
        };
        self.doc
            .select(&sel)
            .take(limit.unwrap_or(usize::MAX))
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Parses a CSS `url(...)` value out of the inline `style` attribute of
    /// the first matching element that carries one; empty string when absent
    /// or unparsable.
    pub fn background_image_url_of(&self, selector: &str) -> String {
        let Some(sel) = get_or_compile(selector) else {
            return String::new();
        };
        self.doc
            .select(&sel)
            .filter_map(|el| el.value().attr("style"))
            .filter_map(css_url_value)
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn css_url_value(style: &str) -> Option<String> {
    let captured = CSS_URL_RE.captures(style)?.get(1)?.as_str();
    let value = captured.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
