//! End-to-end tests for pdf2mdx.
//!
//! Documents are built in memory (or written as JSON layout dumps), so no
//! PDF engine is needed. Coordinates in the helpers below are given with a
//! top-left origin and converted to PDF space for the default 612×792
//! viewport.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use futures::StreamExt;
use pdf2mdx::{
    convert, convert_document, convert_document_stream, convert_from_bytes, convert_to_file,
    inspect, ConversionConfig, ConversionError, ConversionProgressCallback, Document, LinkRect,
    MemoryDocument, MemoryPage, Page, PageError, PageSeparator, TextRun, Viewport,
};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

const PAGE_HEIGHT: f32 = 792.0;

/// A run whose baseline sits `top_y` units below the top of the page.
fn run(text: &str, x: f32, top_y: f32, font_size: f32) -> TextRun {
    TextRun::new(text, x, PAGE_HEIGHT - top_y, font_size)
}

fn page(runs: Vec<TextRun>) -> MemoryPage {
    MemoryPage::new(Viewport::default(), runs)
}

fn doc(pages: Vec<MemoryPage>) -> MemoryDocument {
    MemoryDocument::new(pages)
}

fn mdx_of(runs: Vec<TextRun>) -> String {
    convert_document(&doc(vec![page(runs)]), &ConversionConfig::default())
        .unwrap()
        .mdx
}

/// Wraps a [`MemoryDocument`] and refuses to hand out one page.
struct FlakyDocument {
    inner: MemoryDocument,
    bad_page: usize,
}

impl Document for FlakyDocument {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page(&self, page_num: usize) -> Result<Box<dyn Page + '_>, PageError> {
        if page_num == self.bad_page {
            return Err(PageError::FetchFailed {
                page: page_num,
                detail: "corrupt content stream".into(),
            });
        }
        self.inner.page(page_num)
    }
}

fn three_pages() -> MemoryDocument {
    doc(vec![
        page(vec![run("One", 50.0, 100.0, 12.0)]),
        page(vec![run("Two", 50.0, 100.0, 12.0)]),
        page(vec![run("Three", 50.0, 100.0, 12.0)]),
    ])
}

/// Records every callback as a short event string.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    percents: Mutex<Vec<f64>>,
}

impl Recorder {
    fn push(&self, e: String) {
        self.events.lock().unwrap().push(e);
    }
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, total_pages: usize) {
        self.push(format!("start {total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.push(format!("page {page_num}"));
    }
    fn on_page_complete(&self, page_num: usize, _total: usize, _mdx_len: usize) {
        self.push(format!("ok {page_num}"));
    }
    fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
        self.push(format!("err {page_num}"));
    }
    fn on_progress(&self, percent: f64) {
        self.percents.lock().unwrap().push(percent);
    }
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        self.push(format!("done {success_count}/{total_pages}"));
    }
}

fn recording_config() -> (Arc<Recorder>, ConversionConfig) {
    let rec = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(rec.clone() as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();
    (rec, config)
}

// ── Single-page conversions ──────────────────────────────────────────────────

#[test]
fn test_plain_text_is_a_paragraph() {
    assert_eq!(mdx_of(vec![run("Hello world", 50.0, 100.0, 12.0)]).trim(), "Hello world");
}

#[test]
fn test_large_text_is_a_title() {
    assert_eq!(mdx_of(vec![run("Main Title", 50.0, 100.0, 24.0)]).trim(), "# Main Title");
}

#[test]
fn test_heading_levels() {
    let mdx = mdx_of(vec![
        run("Chapter", 50.0, 100.0, 24.0),
        run("Section", 50.0, 140.0, 20.0),
        run("Subsection", 50.0, 180.0, 16.0),
        run("Body", 50.0, 220.0, 12.0),
    ]);
    assert_eq!(mdx, "# Chapter\n\n## Section\n\n### Subsection\n\nBody\n");
}

#[test]
fn test_bold_line_becomes_h3() {
    let mdx = mdx_of(vec![
        run("Overview", 50.0, 100.0, 13.0).with_font("Helvetica-Bold"),
        run("Body text", 50.0, 130.0, 12.0),
    ]);
    assert_eq!(mdx, "### Overview\n\nBody text\n");
}

#[test]
fn test_paragraph_gap_splits_and_merges() {
    // 100 → 114: gap 2, merged. 114 → 140: gap 14 > 6, new paragraph.
    let mdx = mdx_of(vec![
        run("Line one", 50.0, 100.0, 12.0),
        run("line two", 50.0, 114.0, 12.0),
        run("New paragraph", 50.0, 140.0, 12.0),
    ]);
    assert_eq!(mdx, "Line one line two\n\nNew paragraph\n");
}

#[test]
fn test_bullets_keep_markers_and_end_with_blank_line() {
    let mdx = mdx_of(vec![
        run("• Item 1", 50.0, 100.0, 12.0),
        run("* Item 2", 50.0, 114.0, 12.0),
        run("- Item 3", 50.0, 128.0, 12.0),
        run("After the list", 50.0, 160.0, 12.0),
    ]);
    assert_eq!(mdx, "• Item 1\n* Item 2\n- Item 3\n\nAfter the list\n");
}

#[test]
fn test_items_made_of_emphasis_characters_survive() {
    let mdx = mdx_of(vec![
        run("* _", 50.0, 100.0, 12.0),
        run("- **", 50.0, 114.0, 12.0),
    ]);
    assert_eq!(mdx, "* _\n- **\n");
}

#[test]
fn test_nested_list_and_de_indent() {
    let mdx = mdx_of(vec![
        run("• outer", 50.0, 100.0, 12.0),
        run("• inner", 70.0, 114.0, 12.0),
        run("• outer two", 50.0, 128.0, 12.0),
    ]);
    assert_eq!(mdx, "• outer\n  • inner\n• outer two\n");
}

#[test]
fn test_ordered_markers_are_renumbered() {
    let mdx = mdx_of(vec![
        run("5. five", 50.0, 100.0, 12.0),
        run("9. nine", 50.0, 114.0, 12.0),
    ]);
    assert_eq!(mdx, "1. five\n2. nine\n");
}

#[test]
fn test_split_link_is_merged() {
    let url = "https://docs.test";
    let p = page(vec![
        run("Read the", 50.0, 92.0, 12.0).with_width(60.0),
        run("docs", 50.0, 106.0, 12.0).with_width(30.0),
    ])
    .with_links(vec![LinkRect {
        rect: [40.0, PAGE_HEIGHT - 116.0, 160.0, PAGE_HEIGHT - 78.0],
        url: url.into(),
    }]);
    let out = convert_document(&doc(vec![p]), &ConversionConfig::default()).unwrap();
    assert_eq!(out.mdx, "[Read the docs](https://docs.test)\n");
}

#[test]
fn test_mdx_special_characters_are_escaped() {
    let mdx = mdx_of(vec![run("Use {props} in <Tag>", 50.0, 100.0, 12.0)]);
    assert_eq!(mdx, "Use \\{props\\} in \\<Tag>\n");
}

#[test]
fn test_empty_page_contributes_nothing() {
    let out = convert_document(&doc(vec![page(Vec::new())]), &ConversionConfig::default()).unwrap();
    assert_eq!(out.mdx, "");
    assert_eq!(out.pages.len(), 1);
    assert!(out.pages[0].is_ok());
    assert_eq!(out.pages[0].item_count, 0);
}

#[test]
fn test_conversion_is_deterministic() {
    let d = doc(vec![page(vec![
        run("Title", 50.0, 100.0, 24.0),
        run("1. first", 50.0, 140.0, 12.0),
        run("a. nested", 70.0, 154.0, 12.0),
        run("2. second", 50.0, 168.0, 12.0),
        run("Closing words", 50.0, 200.0, 12.0),
    ])]);
    let config = ConversionConfig::default();
    let a = convert_document(&d, &config).unwrap().mdx;
    let b = convert_document(&d, &config).unwrap().mdx;
    assert_eq!(a, b);
    assert!(!a.contains("\n\n\n"));
    assert!(a.ends_with('\n'));
}

// ── Multi-page behaviour ─────────────────────────────────────────────────────

#[test]
fn test_progress_for_three_pages() {
    let (rec, config) = recording_config();
    let out = convert_document(&three_pages(), &config).unwrap();
    assert_eq!(out.mdx, "One\n\nTwo\n\nThree\n");

    let percents = rec.percents.lock().unwrap().clone();
    let rounded: Vec<f64> = percents.iter().map(|p| (p * 100.0).round() / 100.0).collect();
    assert_eq!(rounded, vec![33.33, 66.67, 100.0]);
    assert_eq!(percents.last().copied(), Some(100.0));
}

#[test]
fn test_zero_pages_report_complete_once() {
    let (rec, config) = recording_config();
    let out = convert_document(&MemoryDocument::default(), &config).unwrap();
    assert_eq!(out.mdx, "");
    assert_eq!(*rec.percents.lock().unwrap(), vec![100.0]);
}

#[test]
fn test_bad_page_leaves_a_gap() {
    let (rec, config) = recording_config();
    let d = FlakyDocument {
        inner: three_pages(),
        bad_page: 2,
    };
    let out = convert_document(&d, &config).unwrap();

    assert_eq!(out.mdx, "One\n\nThree\n");
    assert_eq!(out.stats.processed_pages, 2);
    assert_eq!(out.stats.failed_pages, 1);
    assert!(matches!(
        out.pages[1].error,
        Some(PageError::FetchFailed { page: 2, .. })
    ));
    assert_eq!(
        *rec.events.lock().unwrap(),
        vec![
            "start 3", "page 1", "ok 1", "page 2", "err 2", "page 3", "ok 3", "done 2/3"
        ]
    );
    assert_eq!(rec.percents.lock().unwrap().len(), 3);
}

#[test]
fn test_malformed_run_skips_only_its_page() {
    let d = doc(vec![
        page(vec![run("Fine", 50.0, 100.0, 12.0)]),
        page(vec![TextRun::new("Broken", f32::NAN, 700.0, 12.0)]),
    ]);
    let out = convert_document(&d, &ConversionConfig::default()).unwrap();
    assert_eq!(out.mdx, "Fine\n");
    assert!(matches!(
        out.pages[1].error,
        Some(PageError::MalformedRun { page: 2, index: 0, .. })
    ));
}

#[test]
fn test_separator_between_pages() {
    let config = ConversionConfig::builder()
        .page_separator(PageSeparator::Comment)
        .build()
        .unwrap();
    let out = convert_document(&three_pages(), &config).unwrap();
    assert_eq!(
        out.mdx,
        "One\n\n{/* page 2 */}\n\nTwo\n\n{/* page 3 */}\n\nThree\n"
    );
}

// ── File and byte inputs ─────────────────────────────────────────────────────

fn layout_file(d: &MemoryDocument) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    std::fs::write(file.path(), serde_json::to_vec(d).unwrap()).unwrap();
    file
}

#[tokio::test]
async fn test_convert_layout_file() {
    let file = layout_file(&three_pages());
    let out = convert(file.path().to_str().unwrap(), &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.mdx, "One\n\nTwo\n\nThree\n");
    assert_eq!(out.metadata.page_count, 3);
}

#[tokio::test]
async fn test_convert_from_pdfjs_style_bytes() {
    let json = r#"{
        "pages": [{
            "viewport": { "width": 612, "height": 792 },
            "items": [
                { "str": "Main Title", "transform": [24, 0, 0, 24, 50, 700], "width": 120, "height": 24, "fontName": "g_d0_f1" },
                { "str": "Hello world", "transform": [12, 0, 0, 12, 50, 660], "width": 80, "height": 12, "fontName": "g_d0_f2" }
            ]
        }]
    }"#;
    let out = convert_from_bytes(json.as_bytes(), &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.mdx, "# Main Title\n\nHello world\n");
}

#[tokio::test]
async fn test_convert_to_file_writes_output() {
    let input = layout_file(&three_pages());
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("nested").join("doc.mdx");

    let stats = convert_to_file(
        input.path().to_str().unwrap(),
        &out_path,
        &ConversionConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(stats.processed_pages, 3);
    assert_eq!(
        std::fs::read_to_string(&out_path).unwrap(),
        "One\n\nTwo\n\nThree\n"
    );
    assert!(!out_path.with_extension("mdx.tmp").exists());
}

#[tokio::test]
async fn test_inspect_layout_file() {
    let file = layout_file(&three_pages().with_title("Release notes"));
    let meta = inspect(file.path().to_str().unwrap()).await.unwrap();
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.title.as_deref(), Some("Release notes"));
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let err = convert("/definitely/not/here.pdf", &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::FileNotFound { .. }));
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_reports_bad_page_in_order() {
    let d = FlakyDocument {
        inner: three_pages(),
        bad_page: 2,
    };
    let results: Vec<_> = convert_document_stream(d, &ConversionConfig::default())
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().mdx, "One\n");
    assert!(matches!(
        results[1],
        Err(PageError::FetchFailed { page: 2, .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().page_num, 3);
}
