//! Askama templates for HTMX responses.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with the multi-file upload form
//! - `compare.html` - Document selection, notes and merge mode
//! - `partials/` - Fragments swapped in by HTMX (second-document options, merge result)
//!
//! Selected/checked state is computed here so templates only test booleans.

use askama::Template;
use askama_web::WebTemplate;
use pdf_compare_core::{MergeMode, UploadSet, merge_modes};

// =============================================================================
// Form Controls
// =============================================================================

/// One `<option>` of a document select.
pub struct SelectOption {
    pub name: String,
    pub selected: bool,
}

impl SelectOption {
    fn list<'a>(names: impl IntoIterator<Item = &'a str>, selected: &str) -> Vec<Self> {
        names
            .into_iter()
            .map(|name| Self {
                name: name.to_string(),
                selected: name == selected,
            })
            .collect()
    }
}

/// One merge mode radio button.
pub struct ModeChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

fn mode_choices(default: MergeMode) -> Vec<ModeChoice> {
    merge_modes()
        .into_iter()
        .map(|mode| ModeChoice {
            value: mode.value,
            label: mode.label,
            checked: mode.value == default.as_str(),
        })
        .collect()
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Landing page with upload form.
#[derive(Template, WebTemplate, Default)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Shown above the form when an upload was rejected
    pub warning: Option<String>,
}

impl IndexTemplate {
    pub fn with_warning(warning: impl Into<String>) -> Self {
        Self {
            warning: Some(warning.into()),
        }
    }
}

/// Comparison form after upload.
#[derive(Template, WebTemplate)]
#[template(path = "compare.html")]
pub struct CompareTemplate {
    pub session_id: String,
    pub document_count: usize,
    pub first_options: Vec<SelectOption>,
    pub second_options: Vec<SelectOption>,
    pub modes: Vec<ModeChoice>,
}

impl CompareTemplate {
    /// Preselect the first two uploads.
    pub fn new(session_id: String, uploads: &UploadSet, default_mode: MergeMode) -> Self {
        let (first, second) = uploads.default_pair().unwrap_or_default();

        Self {
            session_id,
            document_count: uploads.len(),
            first_options: SelectOption::list(uploads.names(), first),
            second_options: SelectOption::list(uploads.second_choices(first), second),
            modes: mode_choices(default_mode),
        }
    }
}

// =============================================================================
// Partial Templates
// =============================================================================

/// Options for the second select once the first document is chosen.
#[derive(Template, WebTemplate)]
#[template(path = "partials/second_choices.html")]
pub struct SecondChoicesTemplate {
    pub options: Vec<SelectOption>,
}

impl SecondChoicesTemplate {
    /// Every document except `first`; the first remaining one is preselected.
    pub fn new(uploads: &UploadSet, first: &str) -> Self {
        let choices = uploads.second_choices(first);
        let selected = choices.first().copied().unwrap_or_default();

        Self {
            options: SelectOption::list(choices, selected),
        }
    }
}

/// Outcome of a merge request, swapped into `#result`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/result.html")]
pub struct MergeResultTemplate {
    pub outcome: Outcome,
}

/// What a successful merge produced.
pub struct MergeSummary {
    pub session_id: String,
    pub page_count: usize,
    pub mode_label: &'static str,
    pub download_name: String,
    /// `data:` URI of the merged PDF for the inline preview
    pub preview_uri: String,
}

pub enum Outcome {
    Success(MergeSummary),
    /// Selection problem; nothing was merged
    Warning(String),
    /// The PDFs could not be processed
    Error(String),
}

impl MergeResultTemplate {
    pub const fn success(summary: MergeSummary) -> Self {
        Self {
            outcome: Outcome::Success(summary),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Warning(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error(message.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_index_warning_is_rendered() {
        let html = IndexTemplate::with_warning("Upload at least two PDF files")
            .render()
            .unwrap();
        assert!(html.contains("Upload at least two PDF files"));
        assert!(html.contains(r#"name="files""#));
    }

    #[test]
    fn test_mode_choices_check_default() {
        let choices = mode_choices(MergeMode::Stacked);
        assert_eq!(choices.len(), 2);
        assert!(!choices[0].checked);
        assert!(choices[1].checked);
        assert_eq!(choices[1].value, "stacked");
    }

    #[test]
    fn test_select_option_list() {
        let options = SelectOption::list(["a.pdf", "b.pdf"], "b.pdf");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn test_result_fragments() {
        let html = MergeResultTemplate::warning("'a.pdf' was selected twice")
            .render()
            .unwrap();
        assert!(html.contains("warning"));
        assert!(html.contains("selected twice"));

        let html = MergeResultTemplate::success(MergeSummary {
            session_id: "abc".to_string(),
            page_count: 3,
            mode_label: "Side by side",
            download_name: "merged.pdf".to_string(),
            preview_uri: "data:application/pdf;base64,JVBERi0xLjU=".to_string(),
        })
        .render()
        .unwrap();
        assert!(html.contains("/api/download/abc"));
        assert!(html.contains("data:application/pdf;base64,JVBERi0xLjU="));
        assert!(html.contains("merged.pdf"));
    }
}
