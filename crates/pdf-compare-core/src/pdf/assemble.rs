//! Page assembly shared by the note stamper and the merger.
//!
//! # Flattening
//!
//! "Merging page B onto page A" means drawing B's content on top of A's
//! content. B's page is turned into a **Form XObject** (its content stream,
//! resources and media box packed into one reusable object) and A's content
//! is extended with:
//! ```text
//! q <A's original content> Q q /StampN Do Q
//! ```
//! The extra `q`/`Q` pair keeps any graphics state left behind by A's
//! content (transforms, colors, clipping) from leaking into the overlay.
//!
//! # Output
//!
//! All sources are imported into one output document. Only pages passed to
//! [`PageAssembler::push_page`] end up in the final page tree, in push order;
//! everything unreachable from the new catalog is pruned on save.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page carries no media box at all.
pub const LETTER_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Builds one output PDF out of pages from any number of source PDFs.
pub struct PageAssembler {
    doc: Document,
    pages: Vec<ObjectId>,
    stamp_counter: usize,
}

impl PageAssembler {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            stamp_counter: 0,
        }
    }

    /// Import every object of a PDF into the output document.
    ///
    /// Returns the imported page IDs in page order. Inherited attributes are
    /// copied onto each page first, because the source page tree is dropped.
    pub fn import(&mut self, pdf_bytes: &[u8], label: &str) -> Result<Vec<ObjectId>> {
        let mut source = Document::load_mem(pdf_bytes)
            .map_err(|e| Error::Lopdf(format!("Failed to load {label}: {e}")))?;

        source.renumber_objects_with(self.doc.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &page_ids {
            materialize_inherited(&mut source, page_id)?;
        }

        let source_max_id = source.max_id;
        for (object_id, object) in std::mem::take(&mut source.objects) {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.doc.objects.insert(object_id, object);
                }
            }
        }
        self.doc.max_id = self.doc.max_id.max(source_max_id);

        debug!("Imported {} ({} pages)", label, page_ids.len());
        Ok(page_ids)
    }

    /// Pack an imported page into a Form XObject that can be drawn onto other pages.
    pub fn page_to_xobject(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to read page content: {e}")))?;

        let dict = {
            let page = self.page_dictionary(page_id)?;
            let bbox = media_box(page);

            let mut dict = Dictionary::from_iter([
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Form".to_vec())),
                ("BBox", Object::Array(bbox.iter().map(|v| Object::Real(*v)).collect())),
            ]);
            if let Ok(resources) = page.get(b"Resources") {
                dict.set("Resources", resources.clone());
            }
            dict
        };

        Ok(self.doc.add_object(Stream::new(dict, content)))
    }

    /// Draw a Form XObject on top of a page's existing content.
    pub fn stamp(&mut self, page_id: ObjectId, xobject_id: ObjectId) -> Result<()> {
        let name = self.register_xobject(page_id, xobject_id)?;

        let save_state = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let draw_overlay = self.doc.add_object(Stream::new(
            Dictionary::new(),
            format!("\nQ\nq /{name} Do Q\n").into_bytes(),
        ));

        self.wrap_contents(page_id, save_state, draw_overlay)
    }

    /// Append an imported page to the output, in order.
    pub fn push_page(&mut self, page_id: ObjectId) {
        self.pages.push(page_id);
    }

    /// Number of pages pushed so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the page tree and catalog, drop unreachable objects and serialize.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(Error::PdfEmpty);
        }

        let pages_id = self.doc.new_object_id();

        for &page_id in &self.pages {
            self.doc
                .get_dictionary_mut(page_id)
                .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?
                .set("Parent", Object::Reference(pages_id));
        }

        let kids: Vec<Object> = self.pages.iter().map(|&id| Object::Reference(id)).collect();
        let count = i64::try_from(self.pages.len()).unwrap_or(i64::MAX);

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let pruned = self.doc.prune_objects();
        debug!("Pruned {} unreachable objects", pruned.len());

        self.doc.renumber_objects();
        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }

    fn page_dictionary(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.doc
            .get_dictionary(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))
    }

    /// Add the XObject to the page's own resource dictionary under a fresh name.
    ///
    /// Resources are copied inline onto the page, so pages that shared a
    /// resource dictionary do not see each other's stamps.
    fn register_xobject(&mut self, page_id: ObjectId, xobject_id: ObjectId) -> Result<String> {
        let mut resources = match self.page_dictionary(page_id)?.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => self.resolve_dictionary(*id),
            _ => Dictionary::new(),
        };

        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => self.resolve_dictionary(*id),
            _ => Dictionary::new(),
        };

        let name = loop {
            self.stamp_counter += 1;
            let candidate = format!("Stamp{}", self.stamp_counter);
            if !xobjects.has(candidate.as_bytes()) {
                break candidate;
            }
        };

        xobjects.set(name.as_str(), Object::Reference(xobject_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        self.doc
            .get_dictionary_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?
            .set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    fn resolve_dictionary(&self, id: ObjectId) -> Dictionary {
        self.doc
            .get_dictionary(id)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new())
    }

    /// Surround the page's content streams with `before` and `after`.
    fn wrap_contents(&mut self, page_id: ObjectId, before: ObjectId, after: ObjectId) -> Result<()> {
        let existing = self.page_dictionary(page_id)?.get(b"Contents").ok().cloned();

        let mut contents = match existing {
            Some(Object::Reference(id)) => match self.doc.get_object(id) {
                // An indirect array of content streams
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(id)],
            },
            Some(Object::Array(arr)) => arr,
            _ => Vec::new(),
        };

        contents.insert(0, Object::Reference(before));
        contents.push(Object::Reference(after));

        self.doc
            .get_dictionary_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?
            .set("Contents", Object::Array(contents));

        Ok(())
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy inherited attributes from the page's ancestors onto the page itself.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let inherited: Vec<(&[u8], Object)> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

        INHERITABLE_ATTRIBUTES
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| find_inherited(doc, page, key).map(|value| (key, value.clone())))
            .collect()
    };

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    for (key, value) in inherited {
        page.set(key, value);
    }

    if !page.has(b"MediaBox") {
        page.set(
            "MediaBox",
            Object::Array(LETTER_MEDIA_BOX.iter().map(|v| Object::Real(*v)).collect()),
        );
    }

    Ok(())
}

/// Walk up the `Parent` chain looking for `key`.
fn find_inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Get the media box of a page whose inherited attributes were materialized.
pub fn media_box(page: &Dictionary) -> [f32; 4] {
    if let Ok(Object::Array(arr)) = page.get(b"MediaBox")
        && arr.len() == 4
    {
        let values: Vec<f32> = arr
            .iter()
            .filter_map(|o| match o {
                #[allow(clippy::cast_precision_loss)]
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r),
                _ => None,
            })
            .collect();

        if values.len() == 4 {
            return [values[0], values[1], values[2], values[3]];
        }
    }

    LETTER_MEDIA_BOX
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::testing::{content_of, create_test_pdf, create_test_pdf_with_inherited_resources};

    #[test]
    fn test_finish_without_pages_fails() {
        let assembler = PageAssembler::new();
        assert!(matches!(assembler.finish(), Err(Error::PdfEmpty)));
    }

    #[test]
    fn test_import_keeps_page_order() {
        let pdf = create_test_pdf(&["one", "two", "three"]);
        let mut assembler = PageAssembler::new();
        let pages = assembler.import(&pdf, "test").unwrap();
        assert_eq!(pages.len(), 3);

        for &page in pages.iter().rev() {
            assembler.push_page(page);
        }
        let output = assembler.finish().unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let texts: Vec<String> = doc.get_pages().values().map(|&id| content_of(&doc, id)).collect();
        assert!(texts[0].contains("(three)"));
        assert!(texts[1].contains("(two)"));
        assert!(texts[2].contains("(one)"));
    }

    #[test]
    fn test_inherited_attributes_survive_import() {
        let pdf = create_test_pdf_with_inherited_resources(&["inherited"]);
        let mut assembler = PageAssembler::new();
        let pages = assembler.import(&pdf, "test").unwrap();
        assembler.push_page(pages[0]);
        let output = assembler.finish().unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn test_stamp_wraps_original_content() {
        let base = create_test_pdf(&["base"]);
        let overlay = create_test_pdf(&["overlay"]);

        let mut assembler = PageAssembler::new();
        let base_pages = assembler.import(&base, "base").unwrap();
        let overlay_pages = assembler.import(&overlay, "overlay").unwrap();

        let xobject = assembler.page_to_xobject(overlay_pages[0]).unwrap();
        assembler.stamp(base_pages[0], xobject).unwrap();
        assembler.push_page(base_pages[0]);
        let output = assembler.finish().unwrap();

        let doc = Document::load_mem(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let page_id = *doc.get_pages().values().next().unwrap();
        let content = content_of(&doc, page_id);
        assert!(content.trim_start().starts_with('q'));
        assert!(content.contains("(base)"));
        assert!(content.contains("/Stamp1 Do"));
    }

    #[test]
    fn test_media_box_fallback() {
        let dict = Dictionary::new();
        assert_eq!(media_box(&dict), LETTER_MEDIA_BOX);
    }
}
