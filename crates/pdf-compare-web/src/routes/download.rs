//! Download route - merged PDF download.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Download the most recent merge of a session under the configured file name.
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let bytes = session
        .with_session(|s| s.result.as_ref().map(|merged| merged.bytes.clone()))
        .await
        .or_not_found("Session not found")?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Nothing merged yet".to_string()))?;

    let download_name = &state.config.merge.download_filename;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        )
        .body(Body::from(bytes))
        .or_internal_error()
}
