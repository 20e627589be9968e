//! Eager (full-document) conversion entry points.
//!
//! [`convert_document`] is the facade over the pipeline: it walks the
//! selected pages of any [`Document`] in order, runs every stage on each
//! page, reports progress, and assembles the final MDX. The remaining
//! functions resolve a file or buffer to a reader and call it from a
//! blocking worker thread.
//!
//! Use [`crate::stream::convert_stream`] instead when you want pages
//! progressively.

use crate::config::{ConversionConfig, PageSelection};
use crate::error::ConversionError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::input::{self, InputKind, ResolvedInput};
use crate::pipeline::{self, postprocess};
use crate::progress::{percent_complete, ConversionProgressCallback, NoopProgressCallback};
use crate::source::memory::MemoryDocument;
use crate::source::Document;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert an already-opened document to MDX.
///
/// Pages are processed strictly in order on the calling thread. A page
/// that cannot be fetched or extracted is logged, reported through
/// `on_page_error`, and left out of the output; it never fails the call.
///
/// # Errors
/// Only [`ConversionError::PageOutOfRange`], when the page selection picks
/// nothing from a non-empty document.
pub fn convert_document(
    doc: &dyn Document,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let total_start = Instant::now();
    let metadata = metadata_of(doc);
    let selected = select_pages(doc, config)?;
    debug!("Selected {} of {} pages", selected.len(), metadata.page_count);

    let cb = callback(config);
    cb.on_conversion_start(selected.len());

    let mut pages = Vec::with_capacity(selected.len());
    drive_pages(doc, &selected, config, |result| {
        pages.push(result);
        true
    });

    let mdx = assemble_document(&pages, config, &metadata);
    let processed = pages.iter().filter(|p| p.is_ok()).count();
    let stats = ConversionStats {
        total_pages: metadata.page_count,
        selected_pages: selected.len(),
        processed_pages: processed,
        failed_pages: selected.len() - processed,
        skipped_pages: metadata.page_count.saturating_sub(selected.len()),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        processed,
        selected.len(),
        stats.total_duration_ms
    );
    cb.on_conversion_complete(selected.len(), processed);

    Ok(ConversionOutput {
        mdx,
        pages,
        metadata,
        stats,
    })
}

/// Convert a PDF or JSON layout dump on disk to MDX.
///
/// The input kind is sniffed from the file's first bytes. Reader work runs
/// on tokio's blocking pool.
///
/// # Errors
/// Returns `Err(ConversionError)` only for fatal errors: missing or
/// unreadable input, unsupported format, a document the reader rejects,
/// or a page selection that picks nothing.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let source = InputSource::File(input::resolve_input(input_str)?);
    run_blocking(source, config, convert_document).await
}

/// Convert a PDF or JSON layout dump held in memory.
///
/// # Example
/// ```rust,no_run
/// use pdf2mdx::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("layout.json")?;
/// let output = convert_from_bytes(&bytes, &ConversionConfig::default()).await?;
/// println!("{}", output.mdx);
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let source = InputSource::from_bytes(bytes.to_vec())?;
    run_blocking(source, config, convert_document).await
}

/// Convert and write the MDX to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, ConversionError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();
    let write_err = |e: std::io::Error| ConversionError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("mdx.tmp");
    tokio::fs::write(&tmp_path, &output.mdx)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} bytes to {}", output.mdx.len(), path.display());
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConversionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Read page count, title and author without converting content.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, ConversionError> {
    let source = InputSource::File(input::resolve_input(input_str.as_ref())?);
    run_blocking(source, &ConversionConfig::default(), |doc, _| Ok(metadata_of(doc))).await
}

// ── Shared with the streaming API ────────────────────────────────────────

/// Where a document comes from, before a reader has opened it.
pub(crate) enum InputSource {
    File(ResolvedInput),
    Bytes { data: Vec<u8>, kind: InputKind },
}

impl InputSource {
    pub(crate) fn from_bytes(data: Vec<u8>) -> Result<Self, ConversionError> {
        match input::sniff(&data) {
            Some(kind) => Ok(Self::Bytes { data, kind }),
            None => Err(ConversionError::UnsupportedInput {
                path: PathBuf::from("<memory>"),
                magic: data.iter().copied().take(8).collect(),
            }),
        }
    }

    fn kind(&self) -> InputKind {
        match self {
            Self::File(r) => r.kind,
            Self::Bytes { kind, .. } => *kind,
        }
    }

    fn display_path(&self) -> PathBuf {
        match self {
            Self::File(r) => r.path.clone(),
            Self::Bytes { .. } => PathBuf::from("<memory>"),
        }
    }
}

/// Open `source` with the matching reader and hand the document to `f`.
///
/// The document (and for PDFs the pdfium binding) lives only for the
/// duration of `f`.
pub(crate) fn with_document<R>(
    source: &InputSource,
    password: Option<&str>,
    f: impl FnOnce(&dyn Document) -> Result<R, ConversionError>,
) -> Result<R, ConversionError> {
    match source.kind() {
        InputKind::Layout => {
            let doc = match source {
                InputSource::File(r) => {
                    let bytes = std::fs::read(&r.path).map_err(|e| ConversionError::DocumentOpen {
                        detail: format!("'{}': {}", r.path.display(), e),
                    })?;
                    MemoryDocument::from_slice(&bytes)?
                }
                InputSource::Bytes { data, .. } => MemoryDocument::from_slice(data)?,
            };
            info!("Layout dump loaded: {} pages", doc.page_count());
            f(&doc)
        }
        InputKind::Pdf => with_pdf(source, password, f),
    }
}

#[cfg(feature = "pdfium")]
fn with_pdf<R>(
    source: &InputSource,
    password: Option<&str>,
    f: impl FnOnce(&dyn Document) -> Result<R, ConversionError>,
) -> Result<R, ConversionError> {
    use crate::source::pdfium::{bind_pdfium, PdfiumDocument};

    let pdfium = bind_pdfium()?;
    let doc = match source {
        InputSource::File(r) => PdfiumDocument::open(&pdfium, &r.path, password)?,
        InputSource::Bytes { data, .. } => PdfiumDocument::from_bytes(&pdfium, data, password)?,
    };
    f(&doc)
}

#[cfg(not(feature = "pdfium"))]
fn with_pdf<R>(
    source: &InputSource,
    _password: Option<&str>,
    _f: impl FnOnce(&dyn Document) -> Result<R, ConversionError>,
) -> Result<R, ConversionError> {
    Err(ConversionError::PdfSupportDisabled {
        path: source.display_path(),
    })
}

/// Run `f` against the opened source on tokio's blocking pool.
async fn run_blocking<R, F>(
    source: InputSource,
    config: &ConversionConfig,
    f: F,
) -> Result<R, ConversionError>
where
    R: Send + 'static,
    F: FnOnce(&dyn Document, &ConversionConfig) -> Result<R, ConversionError> + Send + 'static,
{
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        debug!("Opening {}", source.display_path().display());
        with_document(&source, config.password.as_deref(), |doc| f(doc, &config))
    })
    .await
    .map_err(|e| ConversionError::Internal(format!("Conversion task panicked: {}", e)))?
}

pub(crate) fn callback(config: &ConversionConfig) -> &dyn ConversionProgressCallback {
    config
        .progress_callback
        .as_deref()
        .unwrap_or(&NoopProgressCallback)
}

pub(crate) fn metadata_of(doc: &dyn Document) -> DocumentMetadata {
    let info = doc.info();
    DocumentMetadata {
        page_count: doc.page_count(),
        title: info.title,
        author: info.author,
    }
}

/// Resolve the page selection against the document.
pub(crate) fn select_pages(
    doc: &dyn Document,
    config: &ConversionConfig,
) -> Result<Vec<usize>, ConversionError> {
    let total = doc.page_count();
    let pages = config.pages.page_numbers(total);
    if pages.is_empty() && total > 0 {
        let page = match &config.pages {
            PageSelection::All => 0,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(set) => set.first().copied().unwrap_or(0),
        };
        return Err(ConversionError::PageOutOfRange { page, total });
    }
    Ok(pages)
}

/// Convert `pages` in order, handing each result to `sink`.
///
/// `on_progress` fires once per page after the page's own callback; an
/// empty selection reports `100.0` once. Returning `false` from `sink`
/// stops the loop.
pub(crate) fn drive_pages(
    doc: &dyn Document,
    pages: &[usize],
    config: &ConversionConfig,
    mut sink: impl FnMut(PageResult) -> bool,
) {
    let cb = callback(config);
    let total = pages.len();
    if total == 0 {
        cb.on_progress(100.0);
        return;
    }

    for (i, &page_num) in pages.iter().enumerate() {
        let result = convert_one(doc, page_num, total, config);
        cb.on_progress(percent_complete(i + 1, total));
        if !sink(result) {
            debug!("Page consumer gone after page {}; stopping", page_num);
            break;
        }
    }
}

fn convert_one(
    doc: &dyn Document,
    page_num: usize,
    total: usize,
    config: &ConversionConfig,
) -> PageResult {
    let start = Instant::now();
    let cb = callback(config);
    cb.on_page_start(page_num, total);

    // The page handle is dropped at the end of this closure.
    let outcome = doc
        .page(page_num)
        .and_then(|page| pipeline::convert_page(&*page, page_num, config));
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(page) => {
            debug!(
                "Page {}: {} items, {} elements, {} bytes in {}ms",
                page_num,
                page.item_count,
                page.element_count,
                page.mdx.len(),
                duration_ms
            );
            cb.on_page_complete(page_num, total, page.mdx.len());
            PageResult {
                page_num,
                mdx: page.mdx,
                item_count: page.item_count,
                element_count: page.element_count,
                duration_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!("Skipping page {}: {}", page_num, e);
            cb.on_page_error(page_num, total, &e.to_string());
            PageResult {
                page_num,
                mdx: String::new(),
                item_count: 0,
                element_count: 0,
                duration_ms,
                error: Some(e),
            }
        }
    }
}

/// Assemble the final document from page results.
fn assemble_document(
    pages: &[PageResult],
    config: &ConversionConfig,
    metadata: &DocumentMetadata,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if config.include_metadata {
        parts.push(format_yaml_front_matter(metadata));
    }

    let bodies = pages
        .iter()
        .filter(|p| p.is_ok() && !p.mdx.trim().is_empty());
    for (i, page) in bodies.enumerate() {
        if i > 0 {
            parts.push(config.page_separator.render(page.page_num));
        }
        parts.push(page.mdx.trim_end().to_string());
    }

    postprocess::clean_mdx(&parts.join(""))
}

/// Format document metadata as YAML front matter.
fn format_yaml_front_matter(meta: &DocumentMetadata) -> String {
    let quote = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
    let mut yaml = String::from("---\n");
    if let Some(ref t) = meta.title {
        yaml.push_str(&format!("title: \"{}\"\n", quote(t)));
    }
    if let Some(ref a) = meta.author {
        yaml.push_str(&format!("author: \"{}\"\n", quote(a)));
    }
    yaml.push_str(&format!("pages: {}\n", meta.page_count));
    yaml.push_str("---\n\n");
    yaml
}
