//! Upload form and multipart upload handling
//!
//! A rejected extension re-renders the form with no file written, matching the
//! original behavior, kept user-facing-silent on purpose. Everything else
//! redirects to the content page, whose rescan picks the new file up.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::error::{PortalError, PortalResult};
use crate::metrics;
use crate::shared_state::AppState;
use crate::views;

pub async fn upload_form(State(state): State<AppState>) -> PortalResult<Html<String>> {
    let tree = state.library.tree.scan()?;
    Ok(Html(views::upload_form(&tree)))
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> PortalResult<Response> {
    let mut filename: Option<String> = None;
    let mut data: Option<bytes::Bytes> = None;
    let mut chapter: Option<String> = None;
    let mut section: Option<String> = None;
    let mut resource_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| anyhow::anyhow!("Malformed multipart request: {}", e))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(ToString::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| anyhow::anyhow!("Failed to read upload body: {}", e))?,
                );
            }
            Some("chapter") => chapter = field.text().await.ok(),
            Some("section") => section = field.text().await.ok(),
            Some("resource_type") => resource_type = field.text().await.ok(),
            _ => {}
        }
    }

    let (Some(filename), Some(data), Some(chapter), Some(section), Some(resource_type)) =
        (filename, data, chapter, section, resource_type)
    else {
        return Ok((StatusCode::BAD_REQUEST, "Missing upload field").into_response());
    };

    match state
        .library
        .uploads
        .store(&chapter, &section, &resource_type, &filename, &data)
    {
        Ok(()) => {
            let total = state.counters.inc_files_uploaded();
            info!("Upload #{} accepted: {}", total, filename);
            metrics::inc_uploads();
            Ok(Redirect::to("/course_content").into_response())
        }
        Err(PortalError::InvalidFile(name)) => {
            // No file was written; silently show the form again
            warn!("Rejected upload with disallowed extension: {}", name);
            let tree = state.library.tree.scan()?;
            Ok(Html(views::upload_form(&tree)).into_response())
        }
        Err(e) => Err(e),
    }
}
