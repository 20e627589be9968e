//! Input resolution: validate a user-supplied path and decide which reader
//! opens it.
//!
//! The decision is made from the first bytes, not the file extension: a
//! `%PDF` header selects the pdfium reader, a JSON object selects the
//! in-memory layout reader. Anything else is rejected up front with the
//! offending bytes in the error, rather than surfacing as a reader failure.

use crate::error::ConversionError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of leading bytes inspected when sniffing.
const SNIFF_LEN: usize = 64;

/// Which reader an input needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A PDF file (`%PDF` header).
    Pdf,
    /// A JSON layout dump (see [`crate::source::memory`]).
    Layout,
}

/// A validated local input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Classify a buffer by its leading bytes.
///
/// A UTF-8 BOM and leading whitespace are skipped before looking for `{`.
pub fn sniff(bytes: &[u8]) -> Option<InputKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(InputKind::Pdf);
    }
    let rest = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match rest.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Some(InputKind::Layout),
        _ => None,
    }
}

/// Resolve a local file path, validating existence, permissions and format.
pub fn resolve_input(path_str: &str) -> Result<ResolvedInput, ConversionError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ConversionError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .map_err(|e| ConversionError::Internal(format!("Failed to read input: {}", e)))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConversionError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ConversionError::FileNotFound { path });
        }
    }

    let kind = sniff(&head).ok_or_else(|| ConversionError::UnsupportedInput {
        path: path.clone(),
        magic: head.iter().copied().take(8).collect(),
    })?;

    debug!("Resolved local input: {} ({:?})", path.display(), kind);
    Ok(ResolvedInput { path, kind })
}
