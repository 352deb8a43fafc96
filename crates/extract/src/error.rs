// ABOUTME: Error types for article extraction including ErrorKind enum and ExtractError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error kinds representing the categories of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownSite,
    Launch,
    Timeout,
    Navigation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnknownSite => "unknown site",
            ErrorKind::Launch => "browser launch failed",
            ErrorKind::Timeout => "navigation timeout",
            ErrorKind::Navigation => "navigation failed",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for extraction operations.
///
/// Partial extractions are not errors; they are returned as `ArticleRecord`s
/// with a degraded `ExtractionStatus`. Only conditions that abort the whole
/// call surface as `ExtractError`.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub kind: ErrorKind,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prensa: {} {}: {}", self.op, self.url, self.kind)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    /// Create an UnknownSite error for an unrecognized site identifier.
    pub fn unknown_site(site_id: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnknownSite,
            url: site_id.into(),
            op: "lookup".to_string(),
            source: None,
        }
    }

    /// Create a Launch error.
    pub fn launch(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            kind: ErrorKind::Launch,
            url: String::new(),
            op: op.into(),
            source,
        }
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Navigation error.
    pub fn navigation(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            kind: ErrorKind::Navigation,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is an UnknownSite error.
    pub fn is_unknown_site(&self) -> bool {
        self.kind == ErrorKind::UnknownSite
    }

    /// Returns true if this is a Launch error.
    pub fn is_launch(&self) -> bool {
        self.kind == ErrorKind::Launch
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Returns true if this is a Navigation error.
    pub fn is_navigation(&self) -> bool {
        self.kind == ErrorKind::Navigation
    }
}
