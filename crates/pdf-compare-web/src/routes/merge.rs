//! Merge routes - document selection and the comparison pipeline.

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use pdf_compare_core::{ComparisonRequest, MergeMode};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{MergeForm, SecondChoicesQuery};
use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{MergeResultTemplate, MergeSummary, SecondChoicesTemplate};

/// Options for the second select, excluding the document chosen first.
///
/// HTMX: Replaces the children of `#second` when the first select changes.
pub async fn second_choices(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<SecondChoicesQuery>,
) -> RouteResult<SecondChoicesTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    session
        .with_session(|s| SecondChoicesTemplate::new(&s.uploads, &query.first))
        .await
        .or_not_found("Session not found")
}

/// Stamp notes and merge the selected pair - returns a result fragment.
///
/// HTMX: Replaces `#result`. Selection problems and PDF failures are
/// rendered as warning/error fragments with status 200 so HTMX swaps them.
pub async fn merge_documents(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Form(form): Form<MergeForm>,
) -> RouteResult<MergeResultTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let mode = match form.mode.as_deref() {
        Some(mode) => match mode.parse::<MergeMode>() {
            Ok(mode) => mode,
            Err(e) => return Ok(MergeResultTemplate::warning(e.to_string())),
        },
        None => state.config.merge.default_mode,
    };

    // Clone the chosen documents out of the lock (bytes are shared, not copied)
    let selected = session
        .with_session(|s| {
            s.uploads
                .select_pair(&form.first, &form.second)
                .map(|(first, second)| (first.clone(), second.clone()))
        })
        .await
        .or_not_found("Session not found")?;

    let (first, second) = match selected {
        Ok(pair) => pair,
        Err(e) if e.is_selection_problem() => {
            warn!("Merge rejected for session {}: {}", session_id, e);
            return Ok(MergeResultTemplate::warning(e.to_string()));
        }
        Err(e) => return Ok(MergeResultTemplate::error(e.to_string())),
    };

    debug!(
        "Merging {} and {} ({}) for session {}",
        first.name(),
        second.name(),
        mode,
        session_id
    );

    let request =
        ComparisonRequest::new(first, second, mode).with_notes(form.first_notes, form.second_notes);

    // Stamping and merging are CPU-bound
    let comparer = state.comparer.clone();
    let merged = tokio::task::spawn_blocking(move || comparer.compare(&request))
        .await
        .map_err(|e| {
            error!("Merge task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Merge failed".to_string(),
            )
        })?;

    let merged = match merged {
        Ok(merged) => merged,
        Err(e) => {
            error!("Merge failed for session {}: {}", session_id, e);
            return Ok(MergeResultTemplate::error(e.to_string()));
        }
    };

    let summary = MergeSummary {
        session_id: session_id.clone(),
        page_count: merged.page_count,
        mode_label: merged.mode.label(),
        download_name: state.config.merge.download_filename.clone(),
        preview_uri: merged.preview_data_uri(),
    };

    session
        .with_session_mut(|s| s.result = Some(merged))
        .await
        .or_not_found("Session not found")?;

    info!(
        "Session {}: merged {} pages ({})",
        session_id, summary.page_count, summary.mode_label
    );

    Ok(MergeResultTemplate::success(summary))
}
