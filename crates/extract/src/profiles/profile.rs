// ABOUTME: SiteProfile data model describing how to pull an article out of one site's pages.
// ABOUTME: Covers selector chains, cleanup rules, wait policy, and registration-time validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::get_or_compile;

fn default_selector_timeout_ms() -> u64 {
    10_000
}

/// When navigation is considered finished for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitPolicy {
    /// Proceed as soon as the load event fires.
    #[default]
    Immediate,
    /// Let late script-driven content settle after the load event.
    NetworkIdle,
}

impl std::fmt::Display for WaitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitPolicy::Immediate => write!(f, "immediate"),
            WaitPolicy::NetworkIdle => write!(f, "network-idle"),
        }
    }
}

/// Body paragraph selection: an ordered selector chain plus an optional
/// cap on how many matched elements to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyExtractor {
    pub selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// One way to locate the lead image on a page.
///
/// Untagged: `{"selector": ..., "attribute": ...}` reads an element
/// attribute, `{"style_of": ...}` reads a CSS `background-image` url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    Attribute { selector: String, attribute: String },
    BackgroundStyle { style_of: String },
}

/// Everything the pipeline needs to know about one supported site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Stable kebab-case identifier callers select the site by.
    pub site_id: String,
    /// Ordered title selector chain; the first selector with a non-empty
    /// match wins.
    pub title_selectors: Vec<String>,
    pub body: BodyExtractor,
    /// Ordered image sources; empty when the site never exposes a usable
    /// lead image.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_sources: Vec<ImageSource>,
    /// Base joined onto relative image URLs. Pages that emit absolute URLs
    /// do not need one; the page URL is the fallback base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_prefix: Option<String>,
    /// Literal phrases removed from the body (first occurrence each).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boilerplate_phrases: Vec<String>,
    /// Markers that cut the body off; stored whitespace-collapsed so they
    /// can match the normalized paragraph text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cutoff_markers: Vec<String>,
    #[serde(default)]
    pub wait_policy: WaitPolicy,
    /// Selectors to await after navigation before reading the page content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_selectors: Vec<String>,
    /// Per-selector wait budget in milliseconds.
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,
}

impl SiteProfile {
    /// Per-selector wait budget as a [`Duration`].
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    /// Returns true if the profile configures at least one image source.
    pub fn wants_image(&self) -> bool {
        !self.image_sources.is_empty()
    }

    /// Check the profile for structural problems. Also compiles every
    /// selector into the process-wide cache, so lookups during extraction
    /// never pay the parse cost.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.site_id.trim().is_empty() {
            return Err(ProfileError::EmptySiteId);
        }
        if self.title_selectors.is_empty() {
            return Err(ProfileError::NoTitleSelectors(self.site_id.clone()));
        }
        if self.body.selectors.is_empty() {
            return Err(ProfileError::NoBodySelectors(self.site_id.clone()));
        }
        if self.body.limit == Some(0) {
            return Err(ProfileError::ZeroBodyLimit(self.site_id.clone()));
        }
        if self.selector_timeout_ms == 0 {
            return Err(ProfileError::ZeroTimeout(self.site_id.clone()));
        }

        let image_selectors = self.image_sources.iter().map(|source| match source {
            ImageSource::Attribute { selector, .. } => selector.as_str(),
            ImageSource::BackgroundStyle { style_of } => style_of.as_str(),
        });
        let all_selectors = self
            .title_selectors
            .iter()
            .chain(&self.body.selectors)
            .chain(&self.wait_selectors)
            .map(String::as_str)
            .chain(image_selectors);
        for selector in all_selectors {
            if selector.trim().is_empty() || get_or_compile(selector).is_none() {
                return Err(ProfileError::InvalidSelector {
                    site_id: self.site_id.clone(),
                    selector: selector.to_string(),
                });
            }
        }

        for source in &self.image_sources {
            if let ImageSource::Attribute { attribute, .. } = source {
                if attribute.trim().is_empty() {
                    return Err(ProfileError::InvalidSelector {
                        site_id: self.site_id.clone(),
                        selector: String::new(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Errors raised when registering a site profile.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("profile has an empty site id")]
    EmptySiteId,

    #[error("profile {0:?} has no title selectors")]
    NoTitleSelectors(String),

    #[error("profile {0:?} has no body selectors")]
    NoBodySelectors(String),

    #[error("profile {site_id:?} has an unparseable or empty selector {selector:?}")]
    InvalidSelector { site_id: String, selector: String },

    #[error("profile {0:?} has a zero selector timeout")]
    ZeroTimeout(String),

    #[error("profile {0:?} caps the body at zero paragraphs")]
    ZeroBodyLimit(String),

    #[error("a profile for site {0:?} is already registered")]
    DuplicateSite(String),
}
