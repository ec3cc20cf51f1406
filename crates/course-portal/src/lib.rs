// course-portal/crates/course-portal/src/lib.rs

pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod shared_state;
pub mod telemetry;
pub mod utils;
pub mod views;

// Public API exports
pub use config::Config;
pub use error::{PortalError, PortalResult};
pub use server::{build_router, run_server};
pub use shared_state::AppState;

// Component exports
pub use content::{
    library::CourseLibrary,
    scanner::{Category, CourseTree, SectionResources},
};
pub use relay::{
    llm_worker::RelayWorker,
    registry::{InstanceRegistry, ModelInstance},
    ChatMessage,
};
