//! Upload route - multi-file PDF upload handling.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use pdf_compare_core::{PdfDocument, UploadSet};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::helpers::{ResultExt, RouteResult, redirect};
use crate::state::AppState;
use crate::templates::IndexTemplate;

/// Upload two or more PDF files - redirects to the comparison page (POST-Redirect-GET).
///
/// Fewer than two files re-renders the upload page with a warning.
pub async fn upload_pdfs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some("files") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.or_bad_request()?;

        // Browsers send an empty part when no file was chosen
        if filename.is_empty() && data.is_empty() {
            continue;
        }

        let filename = if filename.is_empty() {
            format!("document-{}.pdf", files.len() + 1)
        } else {
            filename
        };
        files.push((filename, data.to_vec()));
    }

    if files.len() < 2 {
        warn!("Upload rejected: {} file(s)", files.len());
        return Ok(IndexTemplate::with_warning(format!(
            "Please upload at least two PDF files to compare ({} received).",
            files.len()
        ))
        .into_response());
    }

    // Parse PDFs in a blocking task to avoid blocking the async runtime
    let documents = tokio::task::spawn_blocking(move || {
        files
            .into_iter()
            .map(|(name, bytes)| PdfDocument::from_bytes(name, bytes))
            .collect::<pdf_compare_core::Result<Vec<_>>>()
    })
    .await
    .map_err(|e| {
        error!("PDF parsing task panicked: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "PDF parsing failed".to_string(),
        )
    })?
    .map_err(|e| {
        error!("Failed to parse PDF: {}", e);
        (StatusCode::BAD_REQUEST, format!("Invalid PDF: {e}"))
    })?;

    let mut uploads = UploadSet::new();
    for document in documents {
        if let Err(e) = uploads.insert(document) {
            warn!("Upload rejected: {}", e);
            return Ok(IndexTemplate::with_warning(e.to_string()).into_response());
        }
    }

    let names = uploads.names().join(", ");
    let session_id = state.create_session(uploads).await;
    info!("Created session {} for {}", session_id, names);

    redirect(&headers, &format!("/compare/{session_id}"))
}
