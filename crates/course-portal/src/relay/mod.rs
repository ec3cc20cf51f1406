//! Model relay - instance selection and the streaming proxy to the backend

pub mod llm_worker;
pub mod registry;
pub mod sse;

pub use llm_worker::RelayWorker;
pub use registry::{ActiveRequestGuard, InstanceRegistry, ModelInstance};

use serde::{Deserialize, Serialize};

/// One chat turn, as sent by the client and forwarded to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}
