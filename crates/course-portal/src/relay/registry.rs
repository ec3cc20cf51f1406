//! Model instance registry and load-score selection
//!
//! A static, process-lifetime mapping from model name to configured backend
//! instances. Per-instance state is an atomic active-request counter and a
//! bounded recent-latency history; both are mutated only through this module
//! so concurrent relay invocations cannot lose updates. Nothing here
//! persists: the registry resets with the process.

use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

/// One configured backend address able to serve a model.
pub struct ModelInstance {
    pub name: String,
    pub base_url: String,
    active: AtomicUsize,
    latencies: Mutex<VecDeque<f64>>,
}

impl ModelInstance {
    fn new(name: String, base_url: String) -> Self {
        Self {
            name,
            base_url,
            active: AtomicUsize::new(0),
            latencies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn active_requests(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Mean of the recorded response times; an empty history averages to 0.
    pub fn mean_latency(&self) -> f64 {
        let latencies = self.latencies.lock().unwrap();
        if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        }
    }

    fn record_latency(&self, seconds: f64, window: usize) {
        let mut latencies = self.latencies.lock().unwrap();
        while latencies.len() >= window {
            latencies.pop_front();
        }
        latencies.push_back(seconds);
    }
}

/// On-disk instance descriptor: `{"model": [{"name": ..., "url": ...}]}`.
#[derive(Debug, Deserialize)]
struct InstanceSpec {
    name: String,
    url: String,
}

pub struct InstanceRegistry {
    models: DashMap<String, Vec<Arc<ModelInstance>>>,
    weight_busy: f64,
    weight_latency: f64,
    latency_window: usize,
}

impl InstanceRegistry {
    pub fn new(weight_busy: f64, weight_latency: f64, latency_window: usize) -> Self {
        Self {
            models: DashMap::new(),
            weight_busy,
            weight_latency,
            latency_window,
        }
    }

    /// Load the registry from a JSON file. An absent file is not an error:
    /// the registry stays empty and every model relays to the configured
    /// passthrough backend.
    pub fn from_file(
        path: &Path,
        weight_busy: f64,
        weight_latency: f64,
        latency_window: usize,
    ) -> anyhow::Result<Self> {
        let registry = Self::new(weight_busy, weight_latency, latency_window);

        if !path.exists() {
            info!(
                "No instance registry at {}; all models relay to the default backend",
                path.display()
            );
            return Ok(registry);
        }

        let content = std::fs::read_to_string(path)?;
        let specs: HashMap<String, Vec<InstanceSpec>> = serde_json::from_str(&content)?;
        for (model, instances) in specs {
            registry.insert(
                &model,
                instances.into_iter().map(|spec| (spec.name, spec.url)),
            );
        }

        info!(
            "Instance registry loaded from {}: {} model(s)",
            path.display(),
            registry.models.len()
        );
        Ok(registry)
    }

    pub fn insert(&self, model: &str, instances: impl IntoIterator<Item = (String, String)>) {
        let instances: Vec<Arc<ModelInstance>> = instances
            .into_iter()
            .map(|(name, url)| Arc::new(ModelInstance::new(name, url)))
            .collect();
        self.models.insert(model.to_string(), instances);
    }

    /// `active * weight_busy + mean_latency * weight_latency`. With the
    /// default weights (2, 0) this is pure active-request minimization; the
    /// latency term is a tunable.
    pub fn load_score(&self, instance: &ModelInstance) -> f64 {
        instance.active_requests() as f64 * self.weight_busy
            + instance.mean_latency() * self.weight_latency
    }

    /// Least-loaded instance for `model`, ties broken by configured order.
    /// `None` means the model is unknown and the caller should pass the
    /// request through to the default backend unchanged.
    pub fn select(&self, model: &str) -> Option<Arc<ModelInstance>> {
        let instances = self.models.get(model)?;

        let mut best: Option<(f64, Arc<ModelInstance>)> = None;
        for instance in instances.iter() {
            let score = self.load_score(instance);
            match &best {
                Some((best_score, _)) if score >= *best_score => {}
                _ => best = Some((score, instance.clone())),
            }
        }
        best.map(|(_, instance)| instance)
    }

    /// Increment the instance's active counter and hand back a guard whose
    /// drop decrements it and records the elapsed wall-clock time. The
    /// increment happens before the connection attempt, so the guard fires
    /// on every exit path: completion, backend failure, client disconnect.
    pub fn begin_request(&self, instance: Arc<ModelInstance>) -> ActiveRequestGuard {
        instance.active.fetch_add(1, Ordering::SeqCst);
        ActiveRequestGuard {
            instance,
            started: Instant::now(),
            window: self.latency_window,
        }
    }
}

pub struct ActiveRequestGuard {
    instance: Arc<ModelInstance>,
    started: Instant,
    window: usize,
}

impl ActiveRequestGuard {
    pub fn instance_name(&self) -> &str {
        &self.instance.name
    }
}

impl Drop for ActiveRequestGuard {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.instance.active.fetch_sub(1, Ordering::SeqCst);
        self.instance.record_latency(elapsed, self.window);
        crate::metrics::observe_relay_latency(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(actives: &[usize]) -> (InstanceRegistry, Vec<ActiveRequestGuard>) {
        let registry = InstanceRegistry::new(2.0, 0.0, 8);
        registry.insert(
            "deepseek-math",
            actives
                .iter()
                .enumerate()
                .map(|(i, _)| (format!("inst{}", i), format!("http://127.0.0.1:{}", 9000 + i))),
        );

        let mut guards = Vec::new();
        for (i, &count) in actives.iter().enumerate() {
            let instances = registry.models.get("deepseek-math").unwrap().clone();
            for _ in 0..count {
                guards.push(registry.begin_request(instances[i].clone()));
            }
        }
        (registry, guards)
    }

    #[test]
    fn test_select_prefers_least_active() {
        let (registry, _guards) = registry_with(&[3, 1, 5]);
        let chosen = registry.select("deepseek-math").unwrap();
        assert_eq!(chosen.name, "inst1");
    }

    #[test]
    fn test_ties_break_first_encountered() {
        let (registry, _guards) = registry_with(&[2, 2, 2]);
        let chosen = registry.select("deepseek-math").unwrap();
        assert_eq!(chosen.name, "inst0");
    }

    #[test]
    fn test_unknown_model_is_passthrough() {
        let registry = InstanceRegistry::new(2.0, 0.0, 8);
        assert!(registry.select("mystery-model").is_none());
    }

    #[test]
    fn test_guard_restores_counter_and_records_latency() {
        let registry = InstanceRegistry::new(2.0, 0.0, 8);
        registry.insert("m", [("only".to_string(), "http://127.0.0.1:9000".to_string())]);
        let instance = registry.select("m").unwrap();

        let guard = registry.begin_request(instance.clone());
        assert_eq!(instance.active_requests(), 1);
        drop(guard);

        assert_eq!(instance.active_requests(), 0);
        assert_eq!(instance.latencies.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_latency_history_is_bounded() {
        let registry = InstanceRegistry::new(2.0, 0.0, 3);
        registry.insert("m", [("only".to_string(), "http://127.0.0.1:9000".to_string())]);
        let instance = registry.select("m").unwrap();

        for _ in 0..10 {
            drop(registry.begin_request(instance.clone()));
        }
        assert_eq!(instance.latencies.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_history_scores_zero_latency() {
        let registry = InstanceRegistry::new(0.0, 1.0, 8);
        registry.insert("m", [("only".to_string(), "http://127.0.0.1:9000".to_string())]);
        let instance = registry.select("m").unwrap();
        assert_eq!(registry.load_score(&instance), 0.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_guards_never_lose_a_decrement() {
        let registry = Arc::new(InstanceRegistry::new(2.0, 0.0, 64));
        registry.insert("m", [("only".to_string(), "http://127.0.0.1:9000".to_string())]);
        let instance = registry.select("m").unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            let instance = instance.clone();
            handles.push(tokio::spawn(async move {
                let _guard = registry.begin_request(instance);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(instance.active_requests(), 0);
    }
}
