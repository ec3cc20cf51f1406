//! Direct file routes: serve, download, delete, rename
//!
//! All four take storage-root-relative paths; `CourseLibrary::resolve`
//! rejects traversal before any filesystem access. Content types come from
//! the extension; upload already gated the extension set, so the map here
//! is short by construction.

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::content::allowed_file;
use crate::error::{PortalError, PortalResult};
use crate::shared_state::AppState;
use crate::views;

fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "txt" => "text/plain; charset=utf-8",
        "pdf" => "application/pdf",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// GET /static/*path: serve a stored file or a plain 404.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PortalResult<Response> {
    let full = state.library.resolve(&path)?;
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|_| PortalError::NotFound(path.clone()))?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&path))],
        bytes,
    )
        .into_response())
}

/// GET /download/*path: same as serve, but forces attachment disposition.
pub async fn download_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PortalResult<Response> {
    let full = state.library.resolve(&path)?;
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|_| PortalError::NotFound(path.clone()))?;

    let filename = path.rsplit('/').next().unwrap_or(&path);
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /delete/*path: remove a stored file, then back to the content page.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PortalResult<Redirect> {
    let full = state.library.resolve(&path)?;
    tokio::fs::remove_file(&full)
        .await
        .map_err(|_| PortalError::NotFound(path.clone()))?;

    info!("Deleted {}", path);
    Ok(Redirect::to("/course_content"))
}

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    pub new_name: String,
}

/// GET /rename/*path: render the rename form.
pub async fn rename_form(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PortalResult<Html<String>> {
    let full = state.library.resolve(&path)?;
    if !full.is_file() {
        return Err(PortalError::NotFound(path));
    }
    Ok(Html(views::rename_form(&path)))
}

/// POST /rename/*path: rename within the same directory. The new name has
/// to pass the same extension gate as an upload.
pub async fn rename_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Form(form): Form<RenameForm>,
) -> PortalResult<Redirect> {
    let full = state.library.resolve(&path)?;
    if !full.is_file() {
        return Err(PortalError::NotFound(path));
    }

    let new_name = form.new_name.trim();
    if new_name.contains('/') || new_name.contains('\\') || !allowed_file(new_name) {
        return Err(PortalError::InvalidFile(new_name.to_string()));
    }

    let target = full
        .parent()
        .ok_or_else(|| PortalError::NotFound(path.clone()))?
        .join(new_name);
    tokio::fs::rename(&full, &target).await?;

    info!("Renamed {} -> {}", path, new_name);
    Ok(Redirect::to("/course_content"))
}
