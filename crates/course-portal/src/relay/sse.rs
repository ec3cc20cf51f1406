//! Transform between backend stream formats and client-facing SSE
//!
//! The generate-wire backend emits one JSON object per line; the client
//! expects OpenAI-style delta events. This module keeps the two halves
//! apart: a stateful newline buffer that turns raw chunks into complete
//! lines, a line parser, and the client event serializers. None of it
//! touches a socket, so the whole reformatting path tests in isolation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct DeltaEvent<'a> {
    choices: [DeltaChoice<'a>; 1],
}

#[derive(Debug, Serialize)]
struct DeltaChoice<'a> {
    delta: Delta<'a>,
}

#[derive(Debug, Serialize)]
struct Delta<'a> {
    content: &'a str,
}

/// One line of the generate-wire response stream.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
}

/// Wrap an incremental text fragment as an OpenAI-style delta event:
/// `data: {"choices":[{"delta":{"content":"<fragment>"}}]}\n\n`.
pub fn delta_event(fragment: &str) -> Bytes {
    let event = DeltaEvent {
        choices: [DeltaChoice {
            delta: Delta { content: fragment },
        }],
    };
    let body = serde_json::to_string(&event).unwrap();
    Bytes::from(format!("data: {}\n\n", body))
}

/// Terminal in-band error event. Once streaming has begun the HTTP status is
/// already committed, so failures travel as one last data event.
pub fn error_event(message: &str) -> Bytes {
    let body = serde_json::json!({ "error": message });
    Bytes::from(format!("data: {}\n\n", body))
}

/// Extract the incremental fragment from one backend line. `None` marks a
/// malformed line the relay skips silently.
pub fn parse_generate_line(line: &str) -> Option<String> {
    serde_json::from_str::<GenerateChunk>(line)
        .ok()
        .map(|chunk| chunk.response)
}

/// Accumulates raw chunks and yields complete, trimmed, non-empty lines.
#[derive(Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim().to_string();
            self.buffer.drain(..=pos);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Drain whatever remains once the backend closes without a final
    /// newline.
    pub fn finish(self) -> Option<String> {
        let line = self.buffer.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}
