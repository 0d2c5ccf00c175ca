//! HTTP route handlers for the PDF compare web application.
//!
//! All routes return either HTML (for HTMX consumption) or the merged PDF.
//! HTML routes use Askama templates from the `templates` module.

mod download;
mod merge;
mod pages;
mod upload;

pub use download::download_pdf;
pub use merge::{merge_documents, second_choices};
pub use pages::{compare_page, index};
pub use upload::upload_pdfs;

use serde::Deserialize;

/// Query params for the second-document options.
#[derive(Deserialize)]
pub struct SecondChoicesQuery {
    /// Name currently selected as the first document
    #[serde(default)]
    pub first: String,
}

/// Form data for a merge request.
#[derive(Deserialize, Default)]
pub struct MergeForm {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub second: String,
    #[serde(default)]
    pub first_notes: Option<String>,
    #[serde(default)]
    pub second_notes: Option<String>,
    /// `side_by_side` or `stacked`; the configured default when absent
    #[serde(default)]
    pub mode: Option<String>,
}
