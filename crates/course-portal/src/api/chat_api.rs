//! Streaming chat relay endpoint
//!
//! POST /receive takes an OpenAI-style message list and answers with a
//! `text/event-stream` body. When the model has registry instances the
//! least-loaded one is picked and its active counter is held by a guard for
//! the life of the stream; otherwise the request passes through to the
//! configured default backend.

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::Response,
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::info;

use crate::metrics;
use crate::relay::llm_worker::RelayRequest;
use crate::relay::ChatMessage;
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

pub async fn receive(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let request_num = state.counters.inc_total_requests();
    let model = req
        .model
        .unwrap_or_else(|| state.config.default_model.clone());
    info!(
        "Chat relay request #{} for model '{}' ({} message(s))",
        request_num,
        model,
        req.messages.len()
    );

    // Counter bookkeeping is optimistic: the guard increments before the
    // connection attempt and its drop runs on every exit path.
    let (base_url, guard) = match state.registry.select(&model) {
        Some(instance) => {
            let base_url = instance.base_url.clone();
            let guard = state.registry.begin_request(instance);
            info!("Selected instance '{}' for model '{}'", guard.instance_name(), model);
            (base_url, Some(guard))
        }
        None => (state.relay.default_base_url().to_string(), None),
    };

    let relay_request = RelayRequest {
        base_url,
        model,
        messages: req.messages,
        temperature: req.temperature,
    };

    let stream = state
        .relay
        .clone()
        .relay_stream(relay_request, guard)
        .map(Ok::<_, Infallible>);

    metrics::inc_request("/receive", "200");
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .unwrap()
}
