// course-portal/crates/course-portal/src/shared_state.rs
//! Shared application state
//!
//! Everything the route handlers need travels through one `AppState` held in
//! `Arc`s: the course library (filesystem-owned), the explicitly constructed
//! instance registry, and the relay worker. The registry is the only
//! concurrency-sensitive piece; its mutation goes through atomic counters and
//! a bounded latency deque, never through handler-local state.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing::info;

use crate::{
    config::Config,
    content::library::CourseLibrary,
    relay::{llm_worker::RelayWorker, registry::InstanceRegistry},
};

/// Lock-free counters for request accounting
pub struct AtomicCounters {
    pub total_requests: AtomicUsize,
    pub files_uploaded: AtomicUsize,
    pub posts_submitted: AtomicUsize,
}

impl AtomicCounters {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicUsize::new(0),
            files_uploaded: AtomicUsize::new(0),
            posts_submitted: AtomicUsize::new(0),
        }
    }

    pub fn inc_total_requests(&self) -> usize {
        self.total_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn inc_files_uploaded(&self) -> usize {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn inc_posts_submitted(&self) -> usize {
        self.posts_submitted.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for AtomicCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified application state for all API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub library: Arc<CourseLibrary>,
    pub registry: Arc<InstanceRegistry>,
    pub relay: Arc<RelayWorker>,
    pub counters: Arc<AtomicCounters>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        info!("Initializing application state");

        let library = Arc::new(CourseLibrary::new(
            config.storage_root.clone(),
            config.scan_strict,
        ));

        let registry = Arc::new(InstanceRegistry::from_file(
            &config.instances_path,
            config.weight_busy,
            config.weight_latency,
            config.latency_window,
        )?);

        let relay = Arc::new(RelayWorker::new(
            config.backend_url.clone(),
            config.backend_wire,
            config.chat_path.clone(),
            config.generate_path.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            library,
            registry,
            relay,
            counters: Arc::new(AtomicCounters::new()),
        })
    }
}
