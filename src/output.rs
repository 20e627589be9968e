//! Result types returned by the conversion entry points.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Outcome of converting one page.
///
/// A failed page keeps its slot: `mdx` is empty and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Cleaned MDX for this page; empty for blank or failed pages.
    pub mdx: String,
    /// Positioned items extracted from the page.
    pub item_count: usize,
    /// Classified elements (lines) on the page.
    pub element_count: usize,
    pub duration_ms: u64,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for one conversion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages picked by the page selection.
    pub selected_pages: usize,
    /// Selected pages that converted.
    pub processed_pages: usize,
    /// Selected pages that failed and were skipped.
    pub failed_pages: usize,
    /// Pages left out by the page selection.
    pub skipped_pages: usize,
    pub total_duration_ms: u64,
}

/// Document-level facts available without converting any page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Everything one eager conversion produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled MDX document.
    pub mdx: String,
    /// Per-page results in page order, failed pages included.
    pub pages: Vec<PageResult>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}
