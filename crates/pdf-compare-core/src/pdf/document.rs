use std::path::Path;
use std::sync::Arc;

use lopdf::Document;

use crate::error::{Error, Result};

/// An uploaded PDF: immutable bytes plus the name it is shown under.
pub struct PdfDocument {
    /// Display name (usually the uploaded file name)
    name: String,
    /// The raw PDF bytes
    bytes: Arc<Vec<u8>>,
    /// Number of pages
    page_count: usize,
    /// Content-based ID (MD5 hex), computed once on load
    content_id: String,
}

impl PdfDocument {
    /// Open a PDF from bytes.
    ///
    /// The bytes are parsed once to validate them and count pages.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let name = name.into();
        let bytes = bytes.into();

        let doc = Document::load_mem(&bytes)
            .map_err(|e| Error::PdfOpen(format!("Failed to parse {name}: {e}")))?;
        let page_count = doc.get_pages().len();

        let content_id = format!("{:x}", md5::compute(&bytes));

        Ok(Self {
            name,
            bytes: Arc::new(bytes),
            page_count,
            content_id,
        })
    }

    /// Open a PDF from a file path, named after the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::PdfOpen(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_bytes(name, bytes)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MD5 of the PDF bytes, computed once on load.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Whether both documents hold byte-identical content.
    pub fn same_content(&self, other: &Self) -> bool {
        self.content_id == other.content_id && self.bytes.len() == other.bytes.len()
    }
}

impl Clone for PdfDocument {
    /// O(1): only the `Arc` around the bytes is cloned.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
            content_id: self.content_id.clone(),
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("name", &self.name)
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::testing::create_test_pdf;
    use std::io::Write;

    #[test]
    fn test_from_file_uses_file_name() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(&create_test_pdf(&["one", "two"])).unwrap();

        let doc = PdfDocument::from_file(file.path()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.name().ends_with(".pdf"));
        assert!(!doc.name().contains('/'));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PdfDocument::from_file("/nonexistent/missing.pdf"),
            Err(Error::PdfOpen(_))
        ));
    }

    #[test]
    fn test_same_content_ignores_name() {
        let pdf = create_test_pdf(&["same"]);
        let a = PdfDocument::from_bytes("a.pdf", pdf.clone()).unwrap();
        let b = PdfDocument::from_bytes("b.pdf", pdf).unwrap();
        let c = PdfDocument::from_bytes("c.pdf", create_test_pdf(&["other"])).unwrap();

        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
    }
}
