//! Note overlays: free text rendered onto a single page and flattened onto documents.
//!
//! # Layout
//!
//! PDF uses a bottom-left origin. The note block is anchored at
//! `(origin_x, origin_y)` (40, 40 by default): the first line's baseline
//! sits on `origin_y` and each following line steps down by one leading.
//! With [`NoteGrowth::Up`] the last line sits on `origin_y` instead and
//! earlier lines stack upward.
//!
//! Text is set in the standard Helvetica font with WinAnsiEncoding, which
//! needs no embedding. Characters outside that encoding are drawn as `?`.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use tracing::{debug, warn};

use super::assemble::{LETTER_MEDIA_BOX, PageAssembler};
use crate::config::{NoteGrowth, NoteScope, NoteStyle};
use crate::error::{Error, Result};
use crate::util::non_blank;

/// Average Helvetica glyph width as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

/// Right margin from page edge for text wrapping (in points).
const PAGE_RIGHT_MARGIN: f32 = 40.0;

/// Wrap width never drops below this many characters.
const MIN_LINE_CHARS: usize = 10;

/// Resource name of the note font inside the overlay page.
const FONT_NAME: &str = "FNote";

/// A laid-out note, ready to be rendered as a one-page PDF.
#[derive(Debug, Clone)]
pub struct NoteOverlay {
    lines: Vec<String>,
    style: NoteStyle,
}

impl NoteOverlay {
    /// Break note text into lines: explicit newlines first, then word wrap.
    pub fn layout(text: &str, style: &NoteStyle) -> Self {
        let page_width = LETTER_MEDIA_BOX[2] - LETTER_MEDIA_BOX[0];
        let max_width = (page_width - style.origin_x - PAGE_RIGHT_MARGIN).max(0.0);

        let char_width = style.font_size * CHAR_WIDTH_FACTOR;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_chars = ((max_width / char_width).floor() as usize).max(MIN_LINE_CHARS);

        let lines = text
            .lines()
            .flat_map(|line| word_wrap(&line.replace('\t', "    "), max_chars))
            .collect();

        Self {
            lines,
            style: style.clone(),
        }
    }

    /// Lines as they will be drawn, top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Baseline of the first (topmost) line.
    pub fn top_baseline(&self) -> f32 {
        match self.style.growth {
            NoteGrowth::Down => self.style.origin_y,
            NoteGrowth::Up => self.style.origin_y + self.extra_lines_height(),
        }
    }

    /// Baseline of the last (bottom) line.
    pub fn bottom_baseline(&self) -> f32 {
        match self.style.growth {
            NoteGrowth::Down => self.style.origin_y - self.extra_lines_height(),
            NoteGrowth::Up => self.style.origin_y,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn extra_lines_height(&self) -> f32 {
        self.lines.len().saturating_sub(1) as f32 * self.style.leading()
    }

    /// Render the note as a single Letter-sized page containing only the text.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        if self.top_baseline() + self.style.font_size > LETTER_MEDIA_BOX[3] {
            warn!(
                "Note has {} lines; the top of the block runs off the page",
                self.lines.len()
            );
        }
        if self.bottom_baseline() < LETTER_MEDIA_BOX[1] {
            warn!(
                "Note has {} lines; the bottom of the block runs off the page",
                self.lines.len()
            );
        }

        let mut doc = Document::with_version("1.5");
        let page_tree_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([(FONT_NAME, Object::Reference(font_id))])),
        )]));

        let content = self
            .content()
            .encode()
            .map_err(|e| Error::PdfOverlay(format!("Failed to encode note content: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(LETTER_MEDIA_BOX.iter().map(|v| Object::Real(*v)).collect()),
            ),
        ]));

        let page_tree = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ]);
        doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(page_tree_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save note overlay: {e}")))?;

        Ok(output)
    }

    fn content(&self) -> Content {
        let color = self.style.color;
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), self.style.font_size.into()]),
            Operation::new("TL", vec![self.style.leading().into()]),
            Operation::new("Td", vec![self.style.origin_x.into(), self.top_baseline().into()]),
        ];

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(to_win_ansi(line), StringFormat::Literal)],
            ));
        }

        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("Q", vec![]));

        Content { operations }
    }
}

/// Stamps note text onto every page (or the first page) of a document.
#[derive(Debug, Clone, Default)]
pub struct NoteStamper {
    style: NoteStyle,
}

impl NoteStamper {
    pub const fn new(style: NoteStyle) -> Self {
        Self { style }
    }

    pub const fn style(&self) -> &NoteStyle {
        &self.style
    }

    /// Flatten a note overlay onto the document.
    ///
    /// Blank notes return the input bytes untouched. Otherwise the output has
    /// the same page count as the input.
    pub fn stamp(&self, pdf_bytes: &[u8], notes: &str) -> Result<Vec<u8>> {
        let Some(notes) = non_blank(Some(notes)) else {
            debug!("Empty note, document left unchanged");
            return Ok(pdf_bytes.to_vec());
        };

        let overlay = NoteOverlay::layout(notes, &self.style);
        let overlay_pdf = overlay.to_pdf()?;

        let mut assembler = PageAssembler::new();
        let pages = assembler.import(pdf_bytes, "document")?;
        let overlay_pages = assembler.import(&overlay_pdf, "note overlay")?;
        let overlay_page = *overlay_pages
            .first()
            .ok_or_else(|| Error::PdfOverlay("Note overlay has no page".to_string()))?;
        let xobject = assembler.page_to_xobject(overlay_page)?;

        for (i, &page_id) in pages.iter().enumerate() {
            if i == 0 || self.style.scope == NoteScope::AllPages {
                assembler.stamp(page_id, xobject)?;
            }
            assembler.push_page(page_id);
        }

        debug!(
            "Stamped {} note lines onto {} pages ({:?})",
            overlay.lines().len(),
            pages.len(),
            self.style.scope
        );

        assembler.finish()
    }
}

/// Word wrap text to fit within max_chars per line.
///
/// Lines that already fit are kept verbatim (including inner spacing). Words
/// longer than a whole line are split.
fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.trim_end().to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();

        while word.chars().count() > max_chars {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(idx, _)| idx);
            let rest = word.split_off(split_at);
            lines.push(word);
            word = rest;
        }

        if current_line.is_empty() {
            current_line = word;
        } else if current_line.chars().count() + 1 + word.chars().count() <= max_chars {
            current_line.push(' ');
            current_line.push_str(&word);
        } else {
            lines.push(current_line);
            current_line = word;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Encode text for a simple font using WinAnsiEncoding.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).unwrap_or(b'?'),
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::testing::{content_of, create_test_pdf};

    fn xobject_contents(doc: &Document, page_id: lopdf::ObjectId) -> Vec<String> {
        let page = doc.get_dictionary(page_id).unwrap();
        let Ok(Object::Dictionary(resources)) = page.get(b"Resources") else {
            return Vec::new();
        };
        let Ok(Object::Dictionary(xobjects)) = resources.get(b"XObject") else {
            return Vec::new();
        };
        xobjects
            .iter()
            .filter_map(|(_, obj)| obj.as_reference().ok())
            .filter_map(|id| doc.get_object(id).ok())
            .filter_map(|obj| obj.as_stream().ok())
            .map(|stream| {
                let bytes = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
                String::from_utf8_lossy(&bytes).into_owned()
            })
            .collect()
    }

    /// Strings drawn with `Tj`, in order.
    fn shown_text(content: &[u8]) -> Vec<String> {
        Content::decode(content)
            .unwrap()
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|obj| obj.as_str().ok())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    #[test]
    fn test_word_wrap_basic() {
        let lines = word_wrap("Hello world this is a test", 10);
        assert_eq!(lines, vec!["Hello", "world this", "is a test"]);
    }

    #[test]
    fn test_word_wrap_keeps_short_lines_verbatim() {
        assert_eq!(word_wrap("a  b", 10), vec!["a  b"]);
        assert_eq!(word_wrap("", 10), vec![""]);
    }

    #[test]
    fn test_word_wrap_splits_long_words() {
        let lines = word_wrap("abcdefghijklmnopqrstuvwxyz", 10);
        assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn test_layout_respects_newlines() {
        let overlay = NoteOverlay::layout("first\n\nthird", &NoteStyle::default());
        assert_eq!(overlay.lines(), ["first", "", "third"]);
    }

    #[test]
    fn test_layout_wraps_to_page_width() {
        let text = "word ".repeat(100);
        let overlay = NoteOverlay::layout(&text, &NoteStyle::default());
        assert!(overlay.lines().len() > 1);
        // (612 - 40 - 40) / (10 * 0.5) = 106 characters per line
        assert!(overlay.lines().iter().all(|l| l.chars().count() <= 106));
    }

    fn first_td_y(overlay: &NoteOverlay) -> f32 {
        let ops = overlay.content().operations;
        let td = ops.iter().find(|op| op.operator == "Td").unwrap();
        td.operands[1].as_float().unwrap()
    }

    #[test]
    fn test_first_line_sits_on_anchor() {
        let style = NoteStyle::default();
        let three = NoteOverlay::layout("a\nb\nc", &style);
        assert_eq!(three.lines().len(), 3);
        assert!((first_td_y(&three) - 40.0).abs() < f32::EPSILON);
        assert!((three.bottom_baseline() - 16.0).abs() < 1e-3);

        let ops = three.content().operations;
        assert_eq!(ops.iter().filter(|op| op.operator == "T*").count(), 2);
        let tl = ops.iter().find(|op| op.operator == "TL").unwrap();
        assert!((tl.operands[0].as_float().unwrap() - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_upward_growth_keeps_last_line_on_anchor() {
        let style = NoteStyle {
            growth: NoteGrowth::Up,
            ..NoteStyle::default()
        };
        let single = NoteOverlay::layout("one line", &style);
        assert!((first_td_y(&single) - 40.0).abs() < f32::EPSILON);

        let three = NoteOverlay::layout("a\nb\nc", &style);
        assert!((first_td_y(&three) - 64.0).abs() < 1e-3);
        assert!((three.bottom_baseline() - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(to_win_ansi("Abc"), b"Abc".to_vec());
        assert_eq!(to_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(to_win_ansi("€ “x”"), vec![0x80, b' ', 0x93, b'x', 0x94]);
        assert_eq!(to_win_ansi("ş"), b"?".to_vec());
    }

    #[test]
    fn test_overlay_is_single_page_with_text() {
        let overlay = NoteOverlay::layout("Check dimensions", &NoteStyle::default());
        let pdf = overlay.to_pdf().unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let content = doc.get_page_content(*pages.values().next().unwrap()).unwrap();
        let ops = Content::decode(&content).unwrap().operations;

        let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
        assert_eq!(tf.operands[0].as_name().unwrap(), FONT_NAME.as_bytes());
        assert!((tf.operands[1].as_float().unwrap() - 10.0).abs() < f32::EPSILON);

        let td = ops.iter().find(|op| op.operator == "Td").unwrap();
        assert!((td.operands[0].as_float().unwrap() - 40.0).abs() < f32::EPSILON);
        assert!((td.operands[1].as_float().unwrap() - 40.0).abs() < f32::EPSILON);

        assert_eq!(shown_text(&content), vec!["Check dimensions"]);
    }

    #[test]
    fn test_stamp_blank_notes_returns_input() {
        let pdf = create_test_pdf(&["one", "two"]);
        let stamper = NoteStamper::default();
        assert_eq!(stamper.stamp(&pdf, "").unwrap(), pdf);
        assert_eq!(stamper.stamp(&pdf, " \n\t").unwrap(), pdf);
    }

    #[test]
    fn test_stamp_every_page() {
        let pdf = create_test_pdf(&["one", "two", "three"]);
        let stamped = NoteStamper::default().stamp(&pdf, "reviewed").unwrap();

        let doc = Document::load_mem(&stamped).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);

        for &page_id in pages.values() {
            let overlays = xobject_contents(&doc, page_id);
            assert_eq!(overlays.len(), 1);
            assert_eq!(shown_text(overlays[0].as_bytes()), vec!["reviewed"]);
            assert!(content_of(&doc, page_id).contains("Do"));
        }
    }

    #[test]
    fn test_stamp_first_page_only() {
        let pdf = create_test_pdf(&["one", "two"]);
        let style = NoteStyle {
            scope: NoteScope::FirstPage,
            ..Default::default()
        };
        let stamped = NoteStamper::new(style).stamp(&pdf, "only here").unwrap();

        let doc = Document::load_mem(&stamped).unwrap();
        let page_ids: Vec<_> = doc.get_pages().values().copied().collect();
        assert_eq!(page_ids.len(), 2);
        assert_eq!(xobject_contents(&doc, page_ids[0]).len(), 1);
        assert!(xobject_contents(&doc, page_ids[1]).is_empty());
    }

    #[test]
    fn test_stamp_invalid_pdf_fails() {
        let result = NoteStamper::default().stamp(b"not a pdf", "note");
        assert!(result.is_err());
    }
}
