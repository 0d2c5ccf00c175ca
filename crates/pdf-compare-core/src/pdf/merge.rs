//! Combining two documents into one.

use tracing::debug;

use super::assemble::PageAssembler;
use crate::config::MergeMode;
use crate::error::Result;

/// Combine two PDFs according to `mode`.
///
/// - [`MergeMode::SideBySide`]: page `i` of `second` is flattened onto page
///   `i` of `first`. Pages past the shorter document are dropped.
/// - [`MergeMode::Stacked`]: every page of `first`, then every page of `second`.
pub fn merge_pdfs(first: &[u8], second: &[u8], mode: MergeMode) -> Result<Vec<u8>> {
    let mut assembler = PageAssembler::new();
    let first_pages = assembler.import(first, "first document")?;
    let second_pages = assembler.import(second, "second document")?;

    match mode {
        MergeMode::SideBySide => {
            let paired = first_pages.len().min(second_pages.len());
            let dropped = first_pages.len().max(second_pages.len()) - paired;
            if dropped > 0 {
                debug!(
                    "Page counts differ ({} vs {}), dropping {} unpaired pages",
                    first_pages.len(),
                    second_pages.len(),
                    dropped
                );
            }

            for (&base, &overlay) in first_pages.iter().zip(&second_pages) {
                let xobject = assembler.page_to_xobject(overlay)?;
                assembler.stamp(base, xobject)?;
                assembler.push_page(base);
            }
        }
        MergeMode::Stacked => {
            for &page_id in first_pages.iter().chain(&second_pages) {
                assembler.push_page(page_id);
            }
        }
    }

    debug!("Merged into {} pages ({})", assembler.page_count(), mode);
    assembler.finish()
}
