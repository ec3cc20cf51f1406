//! Discussion submission endpoint

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::error::PortalResult;
use crate::metrics;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscussionForm {
    pub discussion_content: String,
}

/// POST /submit_discussion/:chapter/:section: append one post, then send
/// the browser back to the content page (which rescans and shows it).
pub async fn submit_discussion(
    State(state): State<AppState>,
    Path((chapter, section)): Path<(String, String)>,
    Form(form): Form<DiscussionForm>,
) -> PortalResult<Redirect> {
    state
        .library
        .discussions
        .append(&chapter, &section, &form.discussion_content)?;

    let total = state.counters.inc_posts_submitted();
    info!("Discussion post #{} appended to {}/{}", total, chapter, section);
    metrics::inc_request("/submit_discussion", "303");

    Ok(Redirect::to("/course_content"))
}
