//! Uploaded documents and the choice of which two to compare.
//!
//! The checks here run before any PDF work: a comparison needs at least two
//! uploads and two *different* documents. Failures are meant to be shown as
//! warnings, not treated as fatal.

use tracing::warn;

use crate::error::{Error, Result};
use crate::pdf::PdfDocument;

/// Documents uploaded for one comparison, in upload order.
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    documents: Vec<PdfDocument>,
}

impl UploadSet {
    pub const fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    /// Add a document. Display names must be unique within the set.
    pub fn insert(&mut self, document: PdfDocument) -> Result<()> {
        if self.get(document.name()).is_some() {
            return Err(Error::DuplicateDocument(document.name().to_string()));
        }
        self.documents.push(document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether enough documents were uploaded to compare anything.
    pub fn can_compare(&self) -> bool {
        self.documents.len() >= 2
    }

    pub fn get(&self, name: &str) -> Option<&PdfDocument> {
        self.documents.iter().find(|d| d.name() == name)
    }

    pub fn documents(&self) -> &[PdfDocument] {
        &self.documents
    }

    /// Display names in upload order.
    pub fn names(&self) -> Vec<&str> {
        self.documents.iter().map(PdfDocument::name).collect()
    }

    /// Names offered for the second document once `first` is chosen.
    pub fn second_choices(&self, first: &str) -> Vec<&str> {
        self.names().into_iter().filter(|name| *name != first).collect()
    }

    /// Default pair: the first two uploads.
    pub fn default_pair(&self) -> Option<(&str, &str)> {
        match self.documents.as_slice() {
            [first, second, ..] => Some((first.name(), second.name())),
            _ => None,
        }
    }

    /// Resolve the chosen pair, rejecting anything that cannot be compared.
    pub fn select_pair(&self, first: &str, second: &str) -> Result<(&PdfDocument, &PdfDocument)> {
        if !self.can_compare() {
            return Err(Error::NotEnoughDocuments {
                count: self.documents.len(),
            });
        }

        if first == second {
            return Err(Error::SameDocument(first.to_string()));
        }

        let first_doc = self
            .get(first)
            .ok_or_else(|| Error::UnknownDocument(first.to_string()))?;
        let second_doc = self
            .get(second)
            .ok_or_else(|| Error::UnknownDocument(second.to_string()))?;

        if first_doc.same_content(second_doc) {
            warn!("'{}' and '{}' have identical content", first, second);
            return Err(Error::IdenticalDocuments {
                first: first.to_string(),
                second: second.to_string(),
            });
        }

        Ok((first_doc, second_doc))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::testing::create_test_pdf;

    fn doc(name: &str, text: &str) -> PdfDocument {
        PdfDocument::from_bytes(name, create_test_pdf(&[text])).unwrap()
    }

    fn two_docs() -> UploadSet {
        let mut set = UploadSet::new();
        set.insert(doc("a.pdf", "a")).unwrap();
        set.insert(doc("b.pdf", "b")).unwrap();
        set
    }

    #[test]
    fn test_fewer_than_two_uploads() {
        let mut set = UploadSet::new();
        assert!(!set.can_compare());
        assert!(matches!(
            set.select_pair("a.pdf", "b.pdf"),
            Err(Error::NotEnoughDocuments { count: 0 })
        ));

        set.insert(doc("a.pdf", "a")).unwrap();
        assert!(!set.can_compare());
        assert!(set.default_pair().is_none());
        assert!(matches!(
            set.select_pair("a.pdf", "a.pdf"),
            Err(Error::NotEnoughDocuments { count: 1 })
        ));
    }

    #[test]
    fn test_same_name_selected_twice() {
        let set = two_docs();
        assert!(matches!(
            set.select_pair("a.pdf", "a.pdf"),
            Err(Error::SameDocument(name)) if name == "a.pdf"
        ));
    }

    #[test]
    fn test_identical_content_under_two_names() {
        let mut set = UploadSet::new();
        set.insert(doc("a.pdf", "same")).unwrap();
        set.insert(doc("copy of a.pdf", "same")).unwrap();
        assert!(matches!(
            set.select_pair("a.pdf", "copy of a.pdf"),
            Err(Error::IdenticalDocuments { .. })
        ));
    }

    #[test]
    fn test_unknown_name() {
        let set = two_docs();
        assert!(matches!(
            set.select_pair("a.pdf", "missing.pdf"),
            Err(Error::UnknownDocument(name)) if name == "missing.pdf"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut set = two_docs();
        assert!(matches!(
            set.insert(doc("a.pdf", "other")),
            Err(Error::DuplicateDocument(_))
        ));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_second_choices_exclude_first() {
        let mut set = two_docs();
        set.insert(doc("c.pdf", "c")).unwrap();
        assert_eq!(set.second_choices("b.pdf"), vec!["a.pdf", "c.pdf"]);
        assert_eq!(set.default_pair(), Some(("a.pdf", "b.pdf")));
    }

    #[test]
    fn test_valid_pair() {
        let set = two_docs();
        let (first, second) = set.select_pair("b.pdf", "a.pdf").unwrap();
        assert_eq!(first.name(), "b.pdf");
        assert_eq!(second.name(), "a.pdf");
    }
}
