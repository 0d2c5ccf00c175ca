//! Page routes - full HTML pages.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{CompareTemplate, IndexTemplate};

/// Landing page with upload form.
pub async fn index() -> IndexTemplate {
    IndexTemplate::default()
}

/// Comparison form for an upload session.
pub async fn compare_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<CompareTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let default_mode = state.config.merge.default_mode;
    session
        .with_session(|s| CompareTemplate::new(session_id.clone(), &s.uploads, default_mode))
        .await
        .or_not_found("Session not found")
}
