//! In-memory layout documents.
//!
//! A [`MemoryDocument`] holds already-extracted pages. It is what the test
//! suite drives the pipeline with, and what the CLI reads when given a JSON
//! layout dump instead of a PDF:
//!
//! ```json
//! {
//!   "title": "Release notes",
//!   "pages": [
//!     {
//!       "viewport": { "width": 600, "height": 800 },
//!       "items": [
//!         { "str": "Hello world", "transform": [12, 0, 0, 12, 50, 700],
//!           "width": 100, "height": 12, "fontName": "Times-Roman" }
//!       ],
//!       "links": [ { "rect": [50, 690, 150, 712], "url": "https://example.com" } ]
//!     }
//!   ]
//! }
//! ```
//!
//! `items` mirrors pdf.js `getTextContent().items`, so a dump produced in a
//! browser can be fed in unchanged.

use super::{Document, DocumentInfo, LinkRect, Page, TextRun, Viewport};
use crate::error::{ConversionError, PageError};
use serde::{Deserialize, Serialize};

/// A fully materialised document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub pages: Vec<MemoryPage>,
}

/// One page of a [`MemoryDocument`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default, alias = "runs")]
    pub items: Vec<TextRun>,
    #[serde(default)]
    pub links: Vec<LinkRect>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Parse a JSON layout dump.
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json).map_err(|e| ConversionError::DocumentOpen {
            detail: format!("invalid layout JSON: {e}"),
        })
    }

    /// Parse a JSON layout dump from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConversionError> {
        serde_json::from_slice(bytes).map_err(|e| ConversionError::DocumentOpen {
            detail: format!("invalid layout JSON: {e}"),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl MemoryPage {
    pub fn new(viewport: Viewport, items: Vec<TextRun>) -> Self {
        Self {
            viewport,
            items,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<LinkRect>) -> Self {
        self.links = links;
        self
    }
}

impl Document for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn info(&self) -> DocumentInfo {
        DocumentInfo {
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }

    fn page(&self, page_num: usize) -> Result<Box<dyn Page + '_>, PageError> {
        page_num
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .map(|p| Box::new(p) as Box<dyn Page + '_>)
            .ok_or_else(|| PageError::FetchFailed {
                page: page_num,
                detail: format!("document has {} pages", self.pages.len()),
            })
    }
}

impl Page for &MemoryPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn text_runs(&self) -> Result<Vec<TextRun>, PageError> {
        Ok(self.items.clone())
    }

    fn link_rects(&self) -> Result<Vec<LinkRect>, PageError> {
        Ok(self.links.clone())
    }
}
