//! PDF reader backed by `pdfium-render`.
//!
//! pdfium uses thread-local state and blocking FFI calls, so callers in
//! async code open and walk the document inside `spawn_blocking` (see
//! [`crate::convert`]). A [`PdfiumDocument`] borrows the bound [`Pdfium`]
//! instance; each [`Page`] it hands out owns one `PdfPage` and closes it
//! on drop.
//!
//! Text is read through pdfium's segment API: every segment becomes one
//! [`TextRun`] whose transform carries the scaled font size of its first
//! character and whose origin is the segment's bottom-left corner. Link
//! annotations whose action is a URI become [`LinkRect`]s; internal
//! (go-to-page) links are skipped.

use super::{Document, DocumentInfo, LinkRect, Page, TextRun, Viewport};
use crate::error::{ConversionError, PageError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH` (file or directory), the working
/// directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, ConversionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            if path.is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
            } else {
                Pdfium::bind_to_library(&path)
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConversionError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// An open PDF document.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    /// Open a PDF file.
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, ConversionError> {
        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| open_error(e, path, password))?;
        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Self { document })
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(
        pdfium: &'a Pdfium,
        bytes: &'a [u8],
        password: Option<&str>,
    ) -> Result<Self, ConversionError> {
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| open_error(e, Path::new("<memory>"), password))?;
        Ok(Self { document })
    }
}

fn open_error(e: PdfiumError, path: &Path, password: Option<&str>) -> ConversionError {
    let detail = format!("{e:?}");
    if detail.to_lowercase().contains("password") {
        if password.is_some() {
            ConversionError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ConversionError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ConversionError::DocumentOpen {
            detail: format!("'{}': {detail}", path.display()),
        }
    }
}

impl Document for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        usize::from(self.document.pages().len())
    }

    fn info(&self) -> DocumentInfo {
        let metadata = self.document.metadata();
        let get = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().to_string())
                .filter(|v| !v.is_empty())
        };
        DocumentInfo {
            title: get(PdfDocumentMetadataTagType::Title),
            author: get(PdfDocumentMetadataTagType::Author),
        }
    }

    fn page(&self, page_num: usize) -> Result<Box<dyn Page + '_>, PageError> {
        let index = page_num
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| PageError::FetchFailed {
                page: page_num,
                detail: "page number out of range".into(),
            })?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|e| PageError::FetchFailed {
                page: page_num,
                detail: format!("{e:?}"),
            })?;
        Ok(Box::new(PdfiumPage { page, page_num }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    page_num: usize,
}

impl Page for PdfiumPage<'_> {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.page.width().value,
            height: self.page.height().value,
        }
    }

    fn text_runs(&self) -> Result<Vec<TextRun>, PageError> {
        let text = self.page.text().map_err(|e| PageError::ExtractionFailed {
            page: self.page_num,
            detail: format!("{e:?}"),
        })?;

        let mut runs = Vec::new();
        for segment in text.segments().iter() {
            let content = segment.text();
            if content.trim().is_empty() {
                continue;
            }

            let bounds = segment.bounds();
            let left = bounds.left().value;
            let bottom = bounds.bottom().value;
            let width = bounds.right().value - left;
            let height = bounds.top().value - bottom;

            let (font_size, font_name) = match segment.chars() {
                Ok(chars) => chars
                    .iter()
                    .next()
                    .map(|c| (c.scaled_font_size().value, c.font_name()))
                    .unwrap_or((height, String::new())),
                Err(_) => (height, String::new()),
            };

            runs.push(TextRun {
                text: content,
                transform: [font_size, 0.0, 0.0, font_size, left, bottom],
                width,
                height,
                font_name,
            });
        }

        debug!("Page {}: {} text segments", self.page_num, runs.len());
        Ok(runs)
    }

    fn link_rects(&self) -> Result<Vec<LinkRect>, PageError> {
        let mut links = Vec::new();
        for link in self.page.links().iter() {
            let Some(PdfAction::Uri(action)) = link.action() else {
                continue;
            };
            let (Ok(url), Ok(rect)) = (action.uri(), link.rect()) else {
                continue;
            };
            if url.is_empty() {
                continue;
            }
            links.push(link_rect(rect, url));
        }
        debug!("Page {}: {} URI links", self.page_num, links.len());
        Ok(links)
    }
}

fn link_rect(rect: PdfRect, url: String) -> LinkRect {
    LinkRect {
        rect: [
            rect.left().value,
            rect.bottom().value,
            rect.right().value,
            rect.top().value,
        ],
        url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_rect_is_left_bottom_right_top() {
        let rect = PdfRect::new_from_values(690.0, 50.0, 712.0, 150.0);
        let link = link_rect(rect, "https://example.com".into());
        assert_eq!(link.rect, [50.0, 690.0, 150.0, 712.0]);
        assert_eq!(link.url, "https://example.com");
    }

    // Both tests below need a pdfium shared library and return early
    // when none can be bound.

    #[test]
    fn missing_file_fails_to_open() {
        let Ok(pdfium) = bind_pdfium() else {
            return;
        };
        let result = PdfiumDocument::open(&pdfium, Path::new("/definitely/not/here.pdf"), None);
        assert!(matches!(result, Err(ConversionError::DocumentOpen { .. })));
    }

    #[test]
    fn open_accepts_a_borrowed_password() {
        let Ok(pdfium) = bind_pdfium() else {
            return;
        };
        let password = String::from("secret");
        let result = PdfiumDocument::open(
            &pdfium,
            Path::new("/definitely/not/here.pdf"),
            Some(password.as_str()),
        );
        assert!(result.is_err());
    }
}
