// ABOUTME: ArticleRecord struct holding extracted article data plus the ExtractionStatus enum.
// ABOUTME: Serializes to the camelCase JSON shape handed to the persistence layer.

use serde::{Deserialize, Serialize};

/// How complete an extraction run was.
///
/// Partial values mean the run succeeded but one field could not be located
/// within the selector timeout; they are not errors. When several fields are
/// missing, the first in title > body > image order wins. `Failed` is the
/// shape callers use when persisting an attempt that returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionStatus {
    #[default]
    Ok,
    PartialMissingTitle,
    PartialMissingBody,
    PartialMissingImage,
    Failed,
}

/// The result of one extraction, containing the cleaned article fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Article headline; empty when no title selector matched.
    pub title: String,
    /// Normalized body text; may be empty.
    pub body_text: String,
    /// Absolute image URL, or empty when the page had none.
    pub image_url: String,
    pub extraction_status: ExtractionStatus,
}

impl ArticleRecord {
    /// A failure-shaped record for callers that persist failed attempts.
    pub fn failed() -> Self {
        Self {
            extraction_status: ExtractionStatus::Failed,
            ..Default::default()
        }
    }

    /// Returns true if every configured field was extracted.
    pub fn is_complete(&self) -> bool {
        self.extraction_status == ExtractionStatus::Ok
    }

    /// Returns true if the run succeeded with one field missing.
    pub fn is_partial(&self) -> bool {
        matches!(
            self.extraction_status,
            ExtractionStatus::PartialMissingTitle
                | ExtractionStatus::PartialMissingBody
                | ExtractionStatus::PartialMissingImage
        )
    }

    /// Returns true if the record carries an image URL.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Count of whitespace-separated words in the body text.
    pub fn word_count(&self) -> usize {
        self.body_text.split_whitespace().count()
    }
}
