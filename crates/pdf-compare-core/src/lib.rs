//! PDF Compare Core Library
//!
//! This library provides the core functionality for comparing two PDF documents:
//! - Stamping free-text notes onto a document as an overlay
//! - Merging two documents side by side (page over page) or stacked
//! - Validating which uploaded documents were chosen
//! - Configuration loading

pub mod config;
pub mod error;
pub mod pdf;
pub mod selection;
pub mod util;

pub use config::{
    AppConfig, MergeConfig, MergeMode, ModeOption, NoteGrowth, NoteScope, NoteStyle, TextColor,
    WebConfig, merge_modes, DEFAULT_DOWNLOAD_FILENAME,
};
pub use error::{Error, Result};
pub use pdf::{NoteOverlay, NoteStamper, PdfDocument, merge_pdfs};
pub use selection::UploadSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info};

use crate::util::non_blank;

/// Everything needed for one comparison.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub first: PdfDocument,
    pub second: PdfDocument,
    /// Notes stamped onto the first document (skipped when blank)
    pub first_notes: Option<String>,
    /// Notes stamped onto the second document (skipped when blank)
    pub second_notes: Option<String>,
    pub mode: MergeMode,
}

impl ComparisonRequest {
    pub fn new(first: PdfDocument, second: PdfDocument, mode: MergeMode) -> Self {
        Self {
            first,
            second,
            first_notes: None,
            second_notes: None,
            mode,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, first: Option<String>, second: Option<String>) -> Self {
        self.first_notes = first;
        self.second_notes = second;
        self
    }
}

/// Result of a comparison
#[derive(Clone)]
pub struct MergedDocument {
    /// Merged PDF bytes
    pub bytes: Vec<u8>,
    /// Number of pages in the merged PDF
    pub page_count: usize,
    /// Mode the documents were merged with
    pub mode: MergeMode,
}

impl MergedDocument {
    /// Base64 of the PDF bytes.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// `data:` URI suitable for an `<iframe src>` preview.
    pub fn preview_data_uri(&self) -> String {
        format!("data:application/pdf;base64,{}", self.to_base64())
    }
}

impl std::fmt::Debug for MergedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedDocument")
            .field("page_count", &self.page_count)
            .field("mode", &self.mode)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// High-level pipeline: optional note stamping on each side, then one merge.
#[derive(Debug, Clone, Default)]
pub struct PdfComparer {
    stamper: NoteStamper,
}

impl PdfComparer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            stamper: NoteStamper::new(config.notes.clone()),
        }
    }

    pub const fn stamper(&self) -> &NoteStamper {
        &self.stamper
    }

    /// Stamp a document with notes, if there are any.
    pub fn stamp(&self, document: &PdfDocument, notes: Option<&str>) -> Result<Vec<u8>> {
        match non_blank(notes) {
            Some(notes) => {
                debug!("Stamping notes onto {}", document.name());
                self.stamper.stamp(document.bytes(), notes)
            }
            None => Ok(document.bytes().to_vec()),
        }
    }

    /// Run the full pipeline for one request.
    pub fn compare(&self, request: &ComparisonRequest) -> Result<MergedDocument> {
        let first = self.stamp(&request.first, request.first_notes.as_deref())?;
        let second = self.stamp(&request.second, request.second_notes.as_deref())?;

        let bytes = merge_pdfs(&first, &second, request.mode)?;
        let page_count = lopdf::Document::load_mem(&bytes)
            .map_err(|e| Error::Lopdf(format!("Failed to reload merged PDF: {e}")))?
            .get_pages()
            .len();

        info!(
            "Merged {} ({} pages) and {} ({} pages) {} into {} pages",
            request.first.name(),
            request.first.page_count(),
            request.second.name(),
            request.second.page_count(),
            request.mode,
            page_count
        );

        Ok(MergedDocument {
            bytes,
            page_count,
            mode: request.mode,
        })
    }
}
