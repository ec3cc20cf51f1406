//! Page routes: landing, informational views, and the content hierarchy
//!
//! `/course_content` rebuilds the resource tree from disk on every request;
//! the tree is a derived view, so there is no cache to invalidate and no
//! staleness to manage. Discussions and answer/question slots are gathered
//! per section while the view-model is assembled.

use axum::{extract::State, response::Html};
use std::collections::BTreeMap;
use tracing::info;

use crate::content::scanner::Category;
use crate::error::PortalResult;
use crate::metrics;
use crate::shared_state::AppState;
use crate::views::{self, ContentView, SectionView};

pub async fn index() -> Html<String> {
    Html(views::index())
}

pub async fn course_description() -> Html<String> {
    Html(views::course_description())
}

pub async fn additional_resources() -> Html<String> {
    Html(views::additional_resources())
}

pub async fn teaching_staff() -> Html<String> {
    Html(views::teaching_staff())
}

pub async fn course_content(State(state): State<AppState>) -> PortalResult<Html<String>> {
    state.counters.inc_total_requests();

    let tree = state.library.tree.scan()?;
    let mut view = ContentView::new();

    for (chapter, sections) in tree {
        let mut section_views = BTreeMap::new();

        for (section, resources) in sections {
            let discussions = state.library.discussions.read(&chapter, &section);

            // A DecodeFailure here is deliberately fatal to the page: graded
            // content must not be dropped silently.
            let mut answers = Vec::new();
            for n in state.library.slots.answer_indexes(&chapter, &section) {
                answers.push((n, state.library.slots.read_answer(&chapter, &section, n)?));
            }

            let mut questions = BTreeMap::new();
            for category in Category::ALL {
                let part = category.dir_name();
                let indexes = state.library.slots.question_indexes(&chapter, &section, part);
                if indexes.is_empty() {
                    continue;
                }
                let mut slots = Vec::new();
                for n in indexes {
                    slots.push((n, state.library.slots.read_question(&chapter, &section, part, n)?));
                }
                questions.insert(part, slots);
            }

            section_views.insert(
                section,
                SectionView {
                    resources,
                    discussions,
                    answers,
                    questions,
                },
            );
        }

        view.insert(chapter, section_views);
    }

    info!("Rendered course content: {} chapter(s)", view.len());
    metrics::inc_request("/course_content", "200");
    Ok(Html(views::course_content(&view)))
}
