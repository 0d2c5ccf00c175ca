use thiserror::Error;

/// Unified error type for pdf-compare-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - PDF operations (parsing, stamping, merging, saving)
/// - Document selection (too few uploads, same document chosen twice)
/// - Configuration operations (loading, validation)
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Failed to render the note overlay page
    #[error("failed to create note overlay: {0}")]
    PdfOverlay(String),

    /// The assembled output would contain no pages
    #[error("merged document has no pages")]
    PdfEmpty,

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Selection Errors
    // ==========================================================================
    /// Fewer than two documents were uploaded
    #[error("at least two PDF files are needed for a comparison ({count} uploaded)")]
    NotEnoughDocuments { count: usize },

    /// A document with this display name is already part of the upload set
    #[error("a document named '{0}' was already uploaded")]
    DuplicateDocument(String),

    /// No uploaded document has this display name
    #[error("no uploaded document named '{0}'")]
    UnknownDocument(String),

    /// The same document was chosen as both first and second
    #[error("'{0}' was selected twice; choose two different documents")]
    SameDocument(String),

    /// Two differently named uploads hold byte-identical content
    #[error("'{first}' and '{second}' are the same document")]
    IdenticalDocuments { first: String, second: String },

    /// Unrecognized merge mode string
    #[error("unknown merge mode '{0}' (expected 'side_by_side' or 'stacked')")]
    UnknownMergeMode(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Problems with what the user picked rather than with the PDFs.
    ///
    /// Front ends show these as warnings and simply stop the action.
    pub const fn is_selection_problem(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughDocuments { .. }
                | Self::DuplicateDocument(_)
                | Self::UnknownDocument(_)
                | Self::SameDocument(_)
                | Self::IdenticalDocuments { .. }
                | Self::UnknownMergeMode(_)
        )
    }
}
