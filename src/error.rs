//! Error types for the pdf2mdx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConversionError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing file, unreadable document, wrong password, bad config).
//!   Returned as `Err(ConversionError)` from the top-level `convert*`
//!   functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be fetched or its
//!   text runs were malformed. Stored inside [`crate::output::PageResult`]
//!   and logged; the remaining pages still convert, so a bad page leaves a
//!   gap in the output instead of aborting the document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2mdx library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is neither a PDF nor a JSON layout dump.
    #[error("Unsupported input '{path}': expected a PDF or a JSON layout dump\nFirst bytes: {magic:?}")]
    UnsupportedInput { path: PathBuf, magic: Vec<u8> },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document reader rejected the input (corrupt PDF, invalid layout JSON).
    #[error("Failed to open document: {detail}")]
    DocumentOpen { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The input is a PDF but the crate was built without the `pdfium` feature.
    #[error("'{path}' is a PDF but pdf2mdx was built without PDF support.\nRebuild with --features pdfium, or pass a JSON layout dump.")]
    PdfSupportDisabled { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output MDX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The overall conversion always continues with the next page.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The reader could not hand out the page.
    #[error("Page {page}: fetch failed: {detail}")]
    FetchFailed { page: usize, detail: String },

    /// The page was fetched but its text runs could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// A text run carried non-finite geometry.
    #[error("Page {page}: text run {index} is malformed: {detail}")]
    MalformedRun {
        page: usize,
        index: usize,
        detail: String,
    },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::FetchFailed { page, .. }
            | PageError::ExtractionFailed { page, .. }
            | PageError::MalformedRun { page, .. } => *page,
        }
    }
}
