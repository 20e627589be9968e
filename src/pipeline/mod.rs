//! Pipeline stages for layout-to-MDX conversion.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! Page ──▶ extract ──▶ lines ──▶ classify ──▶ structure ──▶ render
//!         (items)     (Line)   (elements)    (tree)        (MDX)
//! ```
//!
//! 1. [`extract`]   — text runs → [`extract::PositionedItem`]s in top-left coordinates
//! 2. [`lines`]     — items → baseline-grouped [`lines::Line`]s
//! 3. [`classify`]  — lines → headings, list items, links, paragraphs
//! 4. [`structure`] — elements → arena tree with nested lists
//! 5. [`render`]    — tree → MDX, finished by [`postprocess`]
//!
//! [`input`] sits in front of all of them and decides which reader opens
//! a user-supplied file.

pub mod classify;
pub mod extract;
pub mod input;
pub mod lines;
pub mod postprocess;
pub mod render;
pub mod structure;

use crate::config::ConversionConfig;
use crate::error::PageError;
use crate::source::Page;

/// What one page produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageMdx {
    pub mdx: String,
    pub item_count: usize,
    pub element_count: usize,
}

/// Run every stage on one page.
pub(crate) fn convert_page(
    page: &dyn Page,
    page_num: usize,
    config: &ConversionConfig,
) -> Result<PageMdx, PageError> {
    let items = extract::extract_items(page, page_num)?;
    let item_count = items.len();
    let lines = lines::group_lines(items, config.line_height_threshold);
    let elements = classify::classify_lines(lines, config);
    let element_count = elements.len();
    let tree = structure::build_structure(elements, config);
    Ok(PageMdx {
        mdx: render::render_mdx(&tree, config),
        item_count,
        element_count,
    })
}
