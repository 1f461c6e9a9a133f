//! Values returned by the in-memory conversion path.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// One page of converter output.
///
/// The converter writes the page number under `page`; `page_number` and
/// `pageNumber` are accepted too. Page numbers are 1-indexed, so a zero or
/// negative value fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(alias = "page_number", alias = "pageNumber")]
    pub page: NonZeroU32,
    pub content: String,
}

impl PageRecord {
    pub fn page_number(&self) -> u32 {
        self.page.get()
    }
}

/// Result of [`crate::ConversionOrchestrator::convert_to_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionValue {
    /// Whole-document Markdown, exactly as the converter wrote it.
    Markdown(String),
    /// Per-page records, ascending by page number.
    Pages(Vec<PageRecord>),
}

impl ConversionValue {
    pub fn as_markdown(&self) -> Option<&str> {
        match self {
            ConversionValue::Markdown(md) => Some(md),
            ConversionValue::Pages(_) => None,
        }
    }

    pub fn into_pages(self) -> Option<Vec<PageRecord>> {
        match self {
            ConversionValue::Pages(pages) => Some(pages),
            ConversionValue::Markdown(_) => None,
        }
    }
}

/// Decode the converter's JSON output into page records.
///
/// Records are sorted by page number (stable, so duplicates keep their
/// order). Gaps are allowed: the converter omits pages with no text.
pub fn decode_pages(bytes: &[u8]) -> Result<Vec<PageRecord>, ConversionError> {
    let mut pages: Vec<PageRecord> =
        serde_json::from_slice(bytes).map_err(|e| ConversionError::DecodeFailure {
            detail: e.to_string(),
        })?;
    pages.sort_by_key(|p| p.page);
    Ok(pages)
}
