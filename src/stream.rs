//! Streaming conversion API: emit pages as they complete.
//!
//! Unlike the eager [`crate::convert::convert`] which returns only after
//! the whole document is assembled, the functions here yield one
//! [`PageResult`] per selected page, in page order, while later pages are
//! still being processed. The page loop runs on tokio's blocking pool and
//! feeds a bounded channel; when the consumer drops the stream the loop
//! stops after the page it is working on.
//!
//! # Example
//! ```rust,no_run
//! use pdf2mdx::{convert_stream, ConversionConfig};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConversionConfig::default();
//! let mut stream = convert_stream("document.pdf", &config).await?;
//! while let Some(page) = stream.next().await {
//!     match page {
//!         Ok(p) => println!("Page {}: {} bytes", p.page_num, p.mdx.len()),
//!         Err(e) => eprintln!("Skipped: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ConversionConfig;
use crate::convert::{callback, drive_pages, select_pages, with_document, InputSource};
use crate::error::{ConversionError, PageError};
use crate::output::PageResult;
use crate::pipeline::input;
use crate::source::Document;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, PageError>> + Send>>;

/// Pages buffered ahead of a slow consumer.
const STREAM_BUFFER: usize = 4;

/// Convert a PDF or JSON layout dump, streaming pages as they are ready.
///
/// # Returns
/// - `Ok(PageStream)` — a stream of `Result<PageResult, PageError>`
/// - `Err(ConversionError)` — fatal error (file not found, unreadable
///   document, empty page selection, …), reported before any page is read
pub async fn convert_stream(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming conversion: {}", input_str);

    let source = InputSource::File(input::resolve_input(input_str)?);
    spawn_source_stream(source, config).await
}

/// Streaming equivalent of [`crate::convert::convert_from_bytes`].
pub async fn convert_stream_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError> {
    let source = InputSource::from_bytes(bytes.to_vec())?;
    spawn_source_stream(source, config).await
}

/// Stream the pages of an already-opened document.
///
/// Must be called from within a tokio runtime.
pub fn convert_document_stream<D>(
    doc: D,
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError>
where
    D: Document + Send + 'static,
{
    let pages = select_pages(&doc, config)?;
    let config = config.clone();
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || produce(&doc, &pages, &config, &tx));
    Ok(Box::pin(ReceiverStream::new(rx)))
}

/// Open `source` on the blocking pool and stream its pages.
///
/// Opening happens before this returns, so reader failures surface as
/// `Err` here rather than as a silently empty stream.
async fn spawn_source_stream(
    source: InputSource,
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError> {
    let config = config.clone();
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), ConversionError>>();

    tokio::task::spawn_blocking(move || {
        let mut ready = Some(ready_tx);
        let outcome = with_document(&source, config.password.as_deref(), |doc| {
            let pages = select_pages(doc, &config)?;
            if let Some(r) = ready.take() {
                let _ = r.send(Ok(()));
            }
            produce(doc, &pages, &config, &tx);
            Ok(())
        });
        if let (Err(e), Some(r)) = (outcome, ready.take()) {
            let _ = r.send(Err(e));
        }
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(Box::pin(ReceiverStream::new(rx))),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ConversionError::Internal(
            "Streaming task exited before opening the document".into(),
        )),
    }
}

/// Page loop feeding the channel; runs on a blocking thread.
fn produce(
    doc: &dyn Document,
    pages: &[usize],
    config: &ConversionConfig,
    tx: &mpsc::Sender<Result<PageResult, PageError>>,
) {
    let cb = callback(config);
    cb.on_conversion_start(pages.len());

    let mut succeeded = 0usize;
    drive_pages(doc, pages, config, |mut result| {
        let item = match result.error.take() {
            None => {
                succeeded += 1;
                Ok(result)
            }
            Some(e) => Err(e),
        };
        tx.blocking_send(item).is_ok()
    });

    debug!("Stream producer finished: {}/{} pages", succeeded, pages.len());
    cb.on_conversion_complete(pages.len(), succeeded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::{MemoryDocument, MemoryPage};
    use crate::source::{TextRun, Viewport};
    use crate::progress::ConversionProgressCallback;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn doc(pages: usize) -> MemoryDocument {
        MemoryDocument::new(
            (1..=pages)
                .map(|i| {
                    MemoryPage::new(
                        Viewport::default(),
                        vec![TextRun::new(format!("Page {i}"), 50.0, 700.0, 12.0)],
                    )
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn document_stream_yields_pages_in_order() {
        let stream = convert_document_stream(doc(3), &ConversionConfig::default()).unwrap();
        let pages: Vec<_> = stream.collect().await;
        let nums: Vec<usize> = pages
            .iter()
            .map(|r| r.as_ref().unwrap().page_num)
            .collect();
        assert_eq!(nums, vec![1, 2, 3]);
        assert_eq!(pages[1].as_ref().unwrap().mdx, "Page 2\n");
    }

    #[tokio::test]
    async fn stream_from_layout_bytes() {
        let json = serde_json::to_vec(&doc(2)).unwrap();
        let stream = convert_stream_from_bytes(&json, &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(stream.count().await, 2);
    }

    #[tokio::test]
    async fn invalid_layout_fails_before_streaming() {
        let err = convert_stream_from_bytes(b"{ nope", &ConversionConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConversionError::DocumentOpen { .. }));
    }

    struct StartCounter(AtomicUsize);

    impl ConversionProgressCallback for StartCounter {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_the_producer() {
        let counter = Arc::new(StartCounter(AtomicUsize::new(0)));
        let config = ConversionConfig::builder()
            .progress_callback(counter.clone() as Arc<dyn ConversionProgressCallback>)
            .build()
            .unwrap();
        let mut stream = convert_document_stream(doc(200), &config).unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.page_num, 1);
        drop(stream);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let started = counter.0.load(Ordering::SeqCst);
        assert!(started < 20, "producer kept going: {started} of 200 pages started");
    }
}
