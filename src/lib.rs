//! # pdf2mdx
//!
//! Rebuild document structure from PDF text layout and emit MDX.
//!
//! A PDF text layer is a bag of positioned, styled runs: it knows where each
//! fragment of text sits and which font drew it, but not that three runs
//! form a heading or that an indented bullet belongs under the item above
//! it. This crate reconstructs that structure from geometry alone
//! (baselines, font sizes, indentation and vertical gaps) and renders it as
//! MDX with headings, paragraphs, nested ordered/unordered lists and links.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document
//!  │
//!  ├─ 1. Extract    text runs → positioned items (top-left origin, font size, style, URL)
//!  ├─ 2. Lines      items → baseline-grouped lines
//!  ├─ 3. Classify   lines → heading / list item / link / paragraph
//!  ├─ 4. Structure  elements → tree with nested lists
//!  ├─ 5. Render     tree → MDX, then deterministic clean-up
//!  └─ 6. Assemble   pages joined in order + per-page stats
//! ```
//!
//! Pages are processed strictly in order, one at a time. A page that cannot
//! be read is skipped and reported; it never aborts the document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2mdx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .on_progress(|pct| eprintln!("{pct:.0}%"))
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.mdx);
//!     Ok(())
//! }
//! ```
//!
//! Already have the text layout (for example a pdf.js `getTextContent()`
//! dump)? Skip the PDF reader entirely:
//!
//! ```rust
//! use pdf2mdx::{convert_document, ConversionConfig, MemoryDocument, MemoryPage, TextRun, Viewport};
//!
//! let doc = MemoryDocument::new(vec![MemoryPage::new(
//!     Viewport::default(),
//!     vec![
//!         TextRun::new("Main Title", 50.0, 740.0, 24.0),
//!         TextRun::new("Hello world", 50.0, 700.0, 12.0),
//!     ],
//! )]);
//! let out = convert_document(&doc, &ConversionConfig::default()).unwrap();
//! assert_eq!(out.mdx, "# Main Title\n\nHello world\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2mdx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `pdfium` | on      | Reads PDF files through `pdfium-render` |
//!
//! Without `pdfium` the crate still converts JSON layout dumps and any
//! custom [`Document`] implementation:
//! ```toml
//! pdf2mdx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, HeadingThresholds, PageSelection, PageSeparator,
};
pub use convert::{convert, convert_document, convert_from_bytes, convert_sync, convert_to_file, inspect};
pub use error::{ConversionError, PageError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, PercentCallback, ProgressCallback};
pub use source::memory::{MemoryDocument, MemoryPage};
pub use source::{Document, DocumentInfo, LinkRect, Page, TextRun, Viewport};
pub use stream::{convert_document_stream, convert_stream, convert_stream_from_bytes, PageStream};
