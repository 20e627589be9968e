//! Element classification: lines → headings, list items, links, paragraphs.
//!
//! Precedence, first match wins:
//!
//! 1. **Link**: every item on the line carries the same URL.
//! 2. **Heading**: the line's largest font size reaches a heading threshold.
//! 3. **List item**: the line starts with an ordered or bullet marker.
//! 4. **Bold heading**: an all-bold line at or above `headings.bold_min`.
//! 5. **Indented list item**: with `list_indent_fallback` set, a line
//!    whose indent level sits that far past the page margin's level
//!    becomes a `*` item. Levels are whole `indent_unit` steps, so jitter
//!    within one step does not flip a line in or out of a list.
//! 6. **Paragraph**: everything else.

use super::lines::Line;
use crate::config::ConversionConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Marker used when a line becomes a list item without an explicit marker.
pub const DEFAULT_BULLET: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    /// `1.`, `a)`, `iv.` …
    Ordered,
    /// `•`, `-`, `*` …
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElementKind {
    Heading { level: u8 },
    ListItem { marker: String, marker_kind: MarkerKind },
    Link { url: String },
    Paragraph,
}

/// A line together with its role in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedElement {
    pub line: Line,
    pub kind: ElementKind,
    /// Content text: list markers stripped, emphasis applied where enabled.
    pub text: String,
    /// Leftmost x of the line.
    pub indent_x: f32,
    /// `floor(indent_x / indent_unit)`; drives the indented-list fallback.
    pub indent_level: usize,
}

/// A list marker found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker {
    /// Marker exactly as written, e.g. `"5."` or `"•"`.
    pub marker: String,
    pub kind: MarkerKind,
    /// Bytes consumed from the line text, trailing whitespace included.
    pub len: usize,
}

static RE_ORDERED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,3}[.)]|[a-zA-Z][.)]|(?:[ivxlc]{2,7}|[IVXLC]{2,7})[.)])\s+").unwrap()
});

static RE_BULLET_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:([•◦▪▫‣⁃∙●○■□➢➤►▶✓✔\x{F0B7}])\s*|([-*+–—])\s+)").unwrap()
});

/// Detect a leading list marker.
///
/// A bullet match without a captured marker resolves to [`DEFAULT_BULLET`].
pub fn parse_list_marker(text: &str) -> Option<ListMarker> {
    if let Some(caps) = RE_ORDERED_MARKER.captures(text) {
        let whole = caps.get(0)?;
        return Some(ListMarker {
            marker: caps.get(1).map_or(DEFAULT_BULLET, |m| m.as_str()).to_string(),
            kind: MarkerKind::Ordered,
            len: whole.end(),
        });
    }
    let caps = RE_BULLET_MARKER.captures(text)?;
    let whole = caps.get(0)?;
    let marker = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or(DEFAULT_BULLET, |m| m.as_str());
    Some(ListMarker {
        marker: marker.to_string(),
        kind: MarkerKind::Bullet,
        len: whole.end(),
    })
}

/// Classify every line.
pub fn classify_lines(lines: Vec<Line>, config: &ConversionConfig) -> Vec<ClassifiedElement> {
    let margins = page_margins(&lines);
    let elements: Vec<ClassifiedElement> = lines
        .into_iter()
        .map(|line| {
            let margin = margins.get(&line.page).copied().unwrap_or(0.0);
            classify_line(line, margin, config)
        })
        .collect();

    debug!(
        "Classified {} lines: {} headings, {} list items, {} links",
        elements.len(),
        elements
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::Heading { .. }))
            .count(),
        elements
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::ListItem { .. }))
            .count(),
        elements
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::Link { .. }))
            .count(),
    );
    elements
}

fn page_margins(lines: &[Line]) -> BTreeMap<usize, f32> {
    let mut margins = BTreeMap::new();
    for line in lines {
        let left = line.left();
        margins
            .entry(line.page)
            .and_modify(|m: &mut f32| *m = m.min(left))
            .or_insert(left);
    }
    margins
}

fn classify_line(line: Line, margin: f32, config: &ConversionConfig) -> ClassifiedElement {
    let plain = line.text();
    let indent_x = line.left();
    let indent_level = indent_level_of(indent_x, config.indent_unit);
    let body = |skip: usize| -> String {
        if config.emphasis {
            line.markup_text(skip)
        } else {
            plain.get(skip..).unwrap_or("").trim().to_string()
        }
    };

    let (kind, text) = if let Some(url) = line.url() {
        (ElementKind::Link { url: url.to_string() }, plain.clone())
    } else if let Some(level) = size_heading_level(&line, config) {
        (ElementKind::Heading { level }, plain.clone())
    } else if let Some(m) = parse_list_marker(&plain) {
        let text = body(m.len);
        (
            ElementKind::ListItem {
                marker: m.marker,
                marker_kind: m.kind,
            },
            text,
        )
    } else if line.is_bold() && line.max_font_size() >= config.headings.bold_min {
        (ElementKind::Heading { level: 3 }, plain.clone())
    } else if config.list_indent_fallback.is_some_and(|min| {
        let steps = (min / config.indent_unit).ceil() as usize;
        indent_level >= indent_level_of(margin, config.indent_unit) + steps
    }) {
        (
            ElementKind::ListItem {
                marker: DEFAULT_BULLET.to_string(),
                marker_kind: MarkerKind::Bullet,
            },
            body(0),
        )
    } else {
        (ElementKind::Paragraph, body(0))
    };

    ClassifiedElement {
        line,
        kind,
        text,
        indent_x,
        indent_level,
    }
}

fn indent_level_of(x: f32, unit: f32) -> usize {
    (x / unit).floor().max(0.0) as usize
}

fn size_heading_level(line: &Line, config: &ConversionConfig) -> Option<u8> {
    let size = line.max_font_size();
    let h = &config.headings;
    if size >= h.h1 {
        Some(1)
    } else if size >= h.h2 {
        Some(2)
    } else if size >= h.h3 {
        Some(3)
    } else {
        None
    }
}
