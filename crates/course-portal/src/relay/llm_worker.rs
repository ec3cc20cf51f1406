//! Relay worker
//!
//! Forwards a chat request to the inference backend and streams the answer
//! back as client-ready SSE bytes. Two backend wire shapes are supported:
//! chat-completions responses are already SSE deltas and pass through
//! byte-for-byte; generate responses are JSON lines that get reformatted
//! through `sse::LineBuffer` + `sse::delta_event`. Connection failures
//! surface as one terminal in-band error event, never as an HTTP failure.

use async_stream::stream;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::BackendWire;
use crate::relay::registry::ActiveRequestGuard;
use crate::relay::sse::{delta_event, error_event, parse_generate_line, LineBuffer};
use crate::relay::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Everything one relay call needs, resolved by the handler beforehand.
pub struct RelayRequest {
    pub base_url: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

/// Keeps the active-streams gauge honest on every exit path, including a
/// client that walks away mid-stream.
struct OpenStream;

impl OpenStream {
    fn begin() -> Self {
        crate::metrics::inc_streams();
        OpenStream
    }
}

impl Drop for OpenStream {
    fn drop(&mut self) {
        crate::metrics::dec_streams();
    }
}

pub struct RelayWorker {
    http_client: reqwest::Client,
    wire: BackendWire,
    default_base_url: String,
    chat_path: String,
    generate_path: String,
}

impl RelayWorker {
    pub fn new(
        default_base_url: String,
        wire: BackendWire,
        chat_path: String,
        generate_path: String,
    ) -> Self {
        info!("Relay worker initialized with backend: {} ({:?})", default_base_url, wire);
        Self {
            // No request timeout: an unresponsive backend holds its stream
            // open, matching the baseline behavior this replaces.
            http_client: reqwest::Client::new(),
            wire,
            default_base_url,
            chat_path,
            generate_path,
        }
    }

    pub fn default_base_url(&self) -> &str {
        &self.default_base_url
    }

    /// Open the backend call and return the client-ready event stream. The
    /// optional registry guard rides inside the stream so its bookkeeping
    /// fires when the stream ends, errors, or is dropped by a disconnect.
    pub fn relay_stream(
        self: Arc<Self>,
        request: RelayRequest,
        guard: Option<ActiveRequestGuard>,
    ) -> impl Stream<Item = Bytes> + Send + 'static {
        stream! {
            let _guard = guard;
            let _open = OpenStream::begin();

            match self.wire {
                BackendWire::ChatCompletions => {
                    let url = format!("{}{}", request.base_url, self.chat_path);
                    let body = ChatCompletionRequest {
                        model: &request.model,
                        messages: &request.messages,
                        stream: true,
                        temperature: request.temperature,
                    };

                    let response = match self.post(&url, &body).await {
                        Ok(response) => response,
                        Err(event) => {
                            yield event;
                            return;
                        }
                    };

                    // Already the client's wire format: forward verbatim
                    let mut chunks = response.bytes_stream();
                    while let Some(chunk) = chunks.next().await {
                        match chunk {
                            Ok(bytes) => yield bytes,
                            Err(e) => {
                                error!("Backend stream read failed: {}", e);
                                yield error_event(&format!("Failed to connect to AI service: {}", e));
                                return;
                            }
                        }
                    }
                }
                BackendWire::Generate => {
                    let url = format!("{}{}", request.base_url, self.generate_path);
                    // Single-turn by design in this mode: only the last
                    // message becomes the prompt.
                    let prompt = request
                        .messages
                        .last()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    let body = GenerateRequest {
                        model: &request.model,
                        prompt: &prompt,
                        stream: true,
                    };

                    let response = match self.post(&url, &body).await {
                        Ok(response) => response,
                        Err(event) => {
                            yield event;
                            return;
                        }
                    };

                    let mut buffer = LineBuffer::new();
                    let mut chunks = response.bytes_stream();
                    while let Some(chunk) = chunks.next().await {
                        let bytes = match chunk {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                error!("Backend stream read failed: {}", e);
                                yield error_event(&format!("Failed to connect to AI service: {}", e));
                                return;
                            }
                        };

                        for line in buffer.push(&bytes) {
                            match parse_generate_line(&line) {
                                Some(fragment) => yield delta_event(&fragment),
                                None => debug!("Skipping malformed backend line: {}", line),
                            }
                        }
                    }

                    if let Some(line) = buffer.finish() {
                        if let Some(fragment) = parse_generate_line(&line) {
                            yield delta_event(&fragment);
                        }
                    }
                }
            }
        }
    }

    async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<reqwest::Response, Bytes> {
        let result = self.http_client.post(url).json(body).send().await;
        match result.and_then(|response| response.error_for_status()) {
            Ok(response) => Ok(response),
            Err(e) => {
                error!("Error forwarding request to backend at {}: {}", url, e);
                Err(error_event(&format!("Failed to connect to AI service: {}", e)))
            }
        }
    }
}
