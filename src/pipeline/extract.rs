//! Layout extraction: raw text runs → page-relative [`PositionedItem`]s.
//!
//! PDF space has its origin at the bottom-left corner; everything downstream
//! uses a top-left origin so that "further down the page" means "larger y".
//! The conversion happens exactly once, here: `y = viewport.height - f`,
//! where `f` is the run's baseline from its text matrix. An item therefore
//! sits on baseline `y` and its glyphs occupy `[y - height, y]`.
//!
//! Font size is not declared on a run; PDFs encode it as the scale of the
//! text matrix, so it is read back from `(a, b)` (or `(c, d)` for runs with
//! a degenerate x axis). Bold and italic come from the font name because
//! runs carry no reliable style field.

use crate::error::PageError;
use crate::source::{LinkRect, Page, TextRun};
use serde::Serialize;
use tracing::{debug, warn};

/// A text run positioned in top-left page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedItem {
    pub text: String,
    /// 1-indexed page the item was extracted from.
    pub page: usize,
    pub x: f32,
    /// Baseline, measured down from the top of the page.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub url: Option<String>,
}

impl PositionedItem {
    /// Glyph box: the run extends `height` above its baseline.
    pub fn bounds(&self) -> Rect {
        Rect {
            left: self.x,
            top: self.y - self.height,
            right: self.x + self.width,
            bottom: self.y,
        }
    }
}

/// Axis-aligned rectangle in top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Convert a PDF-space `[x1, y1, x2, y2]` rectangle (any corner order).
    pub fn from_pdf(rect: [f32; 4], viewport_height: f32) -> Self {
        let [x1, y1, x2, y2] = rect;
        Rect {
            left: x1.min(x2),
            top: viewport_height - y1.max(y2),
            right: x1.max(x2),
            bottom: viewport_height - y1.min(y2),
        }
    }

    /// True when the interiors overlap; boxes that merely touch do not.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Extract all items of one page.
///
/// Whitespace-only runs are dropped. A run with non-finite geometry makes
/// the whole page malformed; the caller skips such pages. Link rectangles
/// are optional: a reader failure there is logged and the page continues
/// without URLs.
pub fn extract_items(page: &dyn Page, page_num: usize) -> Result<Vec<PositionedItem>, PageError> {
    let viewport = page.viewport();
    let runs = page.text_runs()?;

    let links = page.link_rects().unwrap_or_else(|e| {
        warn!("Page {}: ignoring link annotations: {}", page_num, e);
        Vec::new()
    });
    let link_boxes: Vec<(Rect, &LinkRect)> = links
        .iter()
        .filter(|l| l.rect.iter().all(|v| v.is_finite()))
        .map(|l| (Rect::from_pdf(l.rect, viewport.height), l))
        .collect();

    let mut items = Vec::with_capacity(runs.len());
    for (index, run) in runs.iter().enumerate() {
        validate_run(run, page_num, index)?;
        if run.text.trim().is_empty() {
            continue;
        }
        items.push(position_run(run, page_num, viewport.height, &link_boxes));
    }

    debug!(
        "Page {}: {} runs → {} items ({} link rects)",
        page_num,
        runs.len(),
        items.len(),
        link_boxes.len()
    );
    Ok(items)
}

fn validate_run(run: &TextRun, page: usize, index: usize) -> Result<(), PageError> {
    let finite = run.transform.iter().all(|v| v.is_finite())
        && run.width.is_finite()
        && run.height.is_finite();
    if finite {
        Ok(())
    } else {
        Err(PageError::MalformedRun {
            page,
            index,
            detail: format!(
                "non-finite geometry (transform {:?}, {}×{})",
                run.transform, run.width, run.height
            ),
        })
    }
}

fn position_run(
    run: &TextRun,
    page: usize,
    viewport_height: f32,
    links: &[(Rect, &LinkRect)],
) -> PositionedItem {
    let font_size = font_size(&run.transform);
    let height = if run.height > 0.0 { run.height } else { font_size };
    let (is_bold, is_italic) = font_style(&run.font_name);

    let mut item = PositionedItem {
        text: run.text.clone(),
        page,
        x: run.transform[4],
        y: viewport_height - run.transform[5],
        width: run.width.max(0.0),
        height,
        font_size,
        font_name: run.font_name.clone(),
        is_bold,
        is_italic,
        url: None,
    };

    let bounds = item.bounds();
    item.url = links
        .iter()
        .find(|(rect, _)| rect.intersects(&bounds))
        .map(|(_, link)| link.url.clone());
    item
}

/// Scale of the text matrix's x axis, falling back to the y axis.
fn font_size(t: &[f32; 6]) -> f32 {
    let sx = t[0].hypot(t[1]);
    if sx > 0.0 {
        sx
    } else {
        t[2].hypot(t[3])
    }
}

fn font_style(font_name: &str) -> (bool, bool) {
    let lower = font_name.to_ascii_lowercase();
    (lower.contains("bold"), lower.contains("italic"))
}
