//! Configuration types for layout-to-MDX conversion.
//!
//! Every geometric threshold of the pipeline is a tuned constant rather than
//! a physical law, so all of them live in [`ConversionConfig`] with the
//! defaults documented on each field. Build one with
//! [`ConversionConfig::builder()`] or use [`ConversionConfig::default()`].

use crate::error::ConversionError;
use crate::progress::{ConversionProgressCallback, PercentCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a layout-to-MDX conversion.
///
/// # Example
/// ```rust
/// use pdf2mdx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .line_height_threshold(4.0)
///     .indentation_threshold(12.0)
///     .emphasis(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.indentation_threshold, 12.0);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Maximum vertical distance (layout units) between two consecutive
    /// items that still counts as the same line. Default: 5.0.
    pub line_height_threshold: f32,

    /// Horizontal tolerance used to decide whether a list item is nested,
    /// de-indented or a sibling of the previous one. Default: 10.0.
    pub indentation_threshold: f32,

    /// Width of one indentation level: `indent_level = floor(x / indent_unit)`.
    /// Default: 10.0.
    pub indent_unit: f32,

    /// Two paragraph lines are split into separate paragraphs when the gap
    /// between them exceeds `previous.height * paragraph_gap_ratio`.
    /// Default: 0.5.
    pub paragraph_gap_ratio: f32,

    /// Font-size thresholds for heading detection.
    pub headings: HeadingThresholds,

    /// When set, a line without a list marker that starts at least this far
    /// right of the page's left margin becomes a `*` list item. Measured in
    /// whole `indent_unit` levels, rounded up. Default: None.
    pub list_indent_fallback: Option<f32>,

    /// Wrap bold and italic runs in `**…**` / `_…_`. Default: true.
    pub emphasis: bool,

    /// Escape `{`, `}` and `<` in text so the output compiles as MDX.
    /// Default: true.
    pub escape_mdx: bool,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Page separator in assembled output. Default: None.
    pub page_separator: PageSeparator,

    /// Prepend YAML front-matter with document metadata. Default: false.
    pub include_metadata: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Observer notified once per page. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            line_height_threshold: 5.0,
            indentation_threshold: 10.0,
            indent_unit: 10.0,
            paragraph_gap_ratio: 0.5,
            headings: HeadingThresholds::default(),
            list_indent_fallback: None,
            emphasis: true,
            escape_mdx: true,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            include_metadata: false,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("line_height_threshold", &self.line_height_threshold)
            .field("indentation_threshold", &self.indentation_threshold)
            .field("indent_unit", &self.indent_unit)
            .field("paragraph_gap_ratio", &self.paragraph_gap_ratio)
            .field("headings", &self.headings)
            .field("list_indent_fallback", &self.list_indent_fallback)
            .field("emphasis", &self.emphasis)
            .field("escape_mdx", &self.escape_mdx)
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field("include_metadata", &self.include_metadata)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Font-size thresholds (layout units) for heading levels.
///
/// A line whose largest font size reaches `h1`, `h2` or `h3` becomes the
/// matching heading. A line that is bold throughout and reaches `bold_min`
/// is promoted to H3 even though it is below `h3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingThresholds {
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
    pub bold_min: f32,
}

impl Default for HeadingThresholds {
    fn default() -> Self {
        Self {
            h1: 22.0,
            h2: 18.0,
            h3: 15.0,
            bold_min: 13.0,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn line_height_threshold(mut self, units: f32) -> Self {
        self.config.line_height_threshold = units.max(0.0);
        self
    }

    pub fn indentation_threshold(mut self, units: f32) -> Self {
        self.config.indentation_threshold = units.max(0.0);
        self
    }

    pub fn indent_unit(mut self, units: f32) -> Self {
        self.config.indent_unit = units;
        self
    }

    pub fn paragraph_gap_ratio(mut self, ratio: f32) -> Self {
        self.config.paragraph_gap_ratio = ratio.max(0.0);
        self
    }

    pub fn headings(mut self, thresholds: HeadingThresholds) -> Self {
        self.config.headings = thresholds;
        self
    }

    pub fn list_indent_fallback(mut self, min_indent: Option<f32>) -> Self {
        self.config.list_indent_fallback = min_indent;
        self
    }

    pub fn emphasis(mut self, v: bool) -> Self {
        self.config.emphasis = v;
        self
    }

    pub fn escape_mdx(mut self, v: bool) -> Self {
        self.config.escape_mdx = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Report only the completed percentage through a closure.
    pub fn on_progress<F>(self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress_callback(Arc::new(PercentCallback(f)))
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConversionError> {
        let c = &self.config;
        if !(c.indent_unit.is_finite() && c.indent_unit > 0.0) {
            return Err(ConversionError::InvalidConfig(format!(
                "indent_unit must be > 0, got {}",
                c.indent_unit
            )));
        }
        let h = &c.headings;
        if !(h.h1 >= h.h2 && h.h2 >= h.h3 && h.h3 >= h.bold_min) {
            return Err(ConversionError::InvalidConfig(format!(
                "heading thresholds must satisfy h1 ≥ h2 ≥ h3 ≥ bold_min, got {}/{}/{}/{}",
                h.h1, h.h2, h.h3, h.bold_min
            )));
        }
        if let Some(min) = c.list_indent_fallback {
            if !(min.is_finite() && min > 0.0) {
                return Err(ConversionError::InvalidConfig(format!(
                    "list_indent_fallback must be > 0, got {min}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the document to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 1-indexed
    /// page numbers that exist in a document of `total_pages` pages.
    pub fn page_numbers(&self, total_pages: usize) -> Vec<usize> {
        let in_range = |p: &usize| (1..=total_pages).contains(p);
        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => Some(*p).filter(in_range).into_iter().collect(),
            PageSelection::Range(start, end) => ((*start).max(1)..=(*end).min(total_pages)).collect(),
            PageSelection::Set(pages) => pages.iter().copied().filter(in_range).collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

/// How to separate pages in the assembled MDX output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with a blank line. (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// MDX comment with page number: "{/* page N */}"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before page `page_num` (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n{{/* page {} */}}\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}
