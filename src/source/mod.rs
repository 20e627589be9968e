//! Document readers: the boundary between a concrete document format and
//! the layout pipeline.
//!
//! The pipeline never touches a PDF library directly. It consumes a
//! [`Document`] that hands out one [`Page`] at a time; each page reports
//! its viewport, raw [`TextRun`]s and optional [`LinkRect`]s in PDF space
//! (bottom-left origin). Page handles are boxed and released when dropped,
//! so the facade can scope exactly one live page per loop iteration.
//!
//! Two readers ship with the crate:
//!
//! * [`memory::MemoryDocument`] — an in-memory layout dump, deserialisable
//!   from JSON shaped like pdf.js `getTextContent()` output.
//! * `pdfium::PdfiumDocument` — real PDFs through `pdfium-render`
//!   (cargo feature `pdfium`).

use crate::error::PageError;
use serde::{Deserialize, Serialize};

pub mod memory;
#[cfg(feature = "pdfium")]
pub mod pdfium;

/// One contiguous styled fragment of text as reported by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// Text content. pdf.js calls this field `str`.
    #[serde(alias = "str")]
    pub text: String,
    /// Text matrix `[a, b, c, d, e, f]`; `(e, f)` is the run origin in PDF
    /// space and the scale of `(a, b)` is the font size.
    pub transform: [f32; 6],
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Internal font name, e.g. `"Helvetica-BoldOblique"`.
    #[serde(default)]
    pub font_name: String,
}

impl TextRun {
    /// Convenience constructor for an unrotated run at `(x, y)` in PDF space.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            transform: [font_size, 0.0, 0.0, font_size, x, y],
            width: 0.0,
            height: font_size,
            font_name: String::new(),
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }
}

/// Page dimensions in PDF units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    /// US Letter, the pdf.js default viewport at scale 1.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }
}

/// A link annotation: a rectangle `[x1, y1, x2, y2]` in PDF space and its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRect {
    pub rect: [f32; 4],
    pub url: String,
}

/// Document-level information available without converting any page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// An opened document.
pub trait Document {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Title/author metadata, when the format carries it.
    fn info(&self) -> DocumentInfo {
        DocumentInfo::default()
    }

    /// Fetch page `page_num` (1-indexed). The handle is released on drop.
    fn page(&self, page_num: usize) -> Result<Box<dyn Page + '_>, PageError>;
}

/// A fetched page.
pub trait Page {
    fn viewport(&self) -> Viewport;

    fn text_runs(&self) -> Result<Vec<TextRun>, PageError>;

    /// Link annotations on the page. Readers without link support return none.
    fn link_rects(&self) -> Result<Vec<LinkRect>, PageError> {
        Ok(Vec::new())
    }
}
