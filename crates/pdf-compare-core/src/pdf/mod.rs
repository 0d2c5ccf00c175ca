mod assemble;
mod document;
mod merge;
pub mod notes;

#[cfg(test)]
pub(crate) mod testing;

pub use assemble::{LETTER_MEDIA_BOX, PageAssembler};
pub use document::PdfDocument;
pub use merge::merge_pdfs;
pub use notes::{NoteOverlay, NoteStamper};
