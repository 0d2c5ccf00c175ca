//! Fixture PDFs for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// One Letter-sized page per entry, each showing its text in Helvetica.
pub fn create_test_pdf(page_texts: &[&str]) -> Vec<u8> {
    build(page_texts, false)
}

/// Like [`create_test_pdf`], but Resources and MediaBox live on the page tree
/// root instead of on each page.
pub fn create_test_pdf_with_inherited_resources(page_texts: &[&str]) -> Vec<u8> {
    build(page_texts, true)
}

/// Decoded content of a page as text.
pub fn content_of(doc: &Document, page_id: ObjectId) -> String {
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap_or_default()).into_owned()
}

fn build(page_texts: &[&str], inherited: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let media_box = || Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]);

    let mut kids = Vec::with_capacity(page_texts.len());
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap_or_default(),
        ));

        let mut page = Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !inherited {
            page.set("Resources", Object::Reference(resources_id));
            page.set("MediaBox", media_box());
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut page_tree = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(i64::try_from(kids.len()).unwrap_or(0))),
        ("Kids", Object::Array(kids)),
    ]);
    if inherited {
        page_tree.set("Resources", Object::Reference(resources_id));
        page_tree.set("MediaBox", media_box());
    }
    doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap_or_default();
    output
}
