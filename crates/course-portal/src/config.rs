// course-portal/crates/course-portal/src/config.rs

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Wire shape spoken to the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendWire {
    /// OpenAI-style `/v1/chat/completions` streaming; chunks are already SSE
    /// deltas and are forwarded to the client byte-for-byte.
    ChatCompletions,
    /// Ollama-style `/api/generate` streaming JSON lines; each line is
    /// reformatted into an SSE delta event before reaching the client.
    Generate,
}

impl FromStr for BackendWire {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chat" | "chat_completions" => Ok(BackendWire::ChatCompletions),
            "generate" | "ollama" => Ok(BackendWire::Generate),
            other => Err(anyhow::anyhow!(
                "BACKEND_WIRE must be 'chat' or 'generate', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the on-disk course hierarchy.
    pub storage_root: PathBuf,
    pub api_host: String,
    pub api_port: u16,
    /// Base URL of the inference backend used when the requested model has
    /// no registry entry.
    pub backend_url: String,
    pub backend_wire: BackendWire,
    pub chat_path: String,
    pub generate_path: String,
    /// Model name substituted when a chat request omits one.
    pub default_model: String,
    /// Optional JSON file mapping model name to instance descriptors.
    pub instances_path: PathBuf,
    pub weight_busy: f64,
    pub weight_latency: f64,
    /// Capacity of each instance's response-time history.
    pub latency_window: usize,
    /// When true, permission errors during a tree rescan are propagated
    /// instead of skipping the unreadable directory.
    pub scan_strict: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file loaded: {}. Using system environment variables.", e);
        }

        let storage_root = PathBuf::from(env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage".into()));

        let backend_host = env::var("BACKEND_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let backend_port: u16 = env::var("BACKEND_PORT").unwrap_or_else(|_| "11434".into()).parse()?;
        let backend_url = format!("http://{}:{}", backend_host, backend_port);

        let backend_wire: BackendWire = env::var("BACKEND_WIRE")
            .unwrap_or_else(|_| "generate".into())
            .parse()?;

        let cfg = Self {
            storage_root,
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "5000".into()).parse()?,
            backend_url,
            backend_wire,
            chat_path: env::var("BACKEND_CHAT_PATH").unwrap_or_else(|_| "/v1/chat/completions".into()),
            generate_path: env::var("BACKEND_GENERATE_PATH").unwrap_or_else(|_| "/api/generate".into()),
            default_model: env::var("DEFAULT_MODEL").unwrap_or_else(|_| "deepseek-math".into()),
            instances_path: PathBuf::from(
                env::var("INSTANCES_PATH").unwrap_or_else(|_| "instances.json".into()),
            ),
            weight_busy: env::var("WEIGHT_BUSY").unwrap_or_else(|_| "2".into()).parse()?,
            weight_latency: env::var("WEIGHT_LATENCY").unwrap_or_else(|_| "0".into()).parse()?,
            latency_window: env::var("LATENCY_WINDOW").unwrap_or_else(|_| "32".into()).parse()?,
            scan_strict: env::var("SCAN_STRICT")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        info!(
            "Configuration: storage={}, api={}:{}, backend={} ({:?})",
            cfg.storage_root.display(),
            cfg.api_host,
            cfg.api_port,
            cfg.backend_url,
            cfg.backend_wire
        );

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build a Config without touching the process environment
    pub(crate) fn create_test_config(storage_root: PathBuf) -> Config {
        Config {
            storage_root,
            api_host: "127.0.0.1".to_string(),
            api_port: 5000,
            backend_url: "http://127.0.0.1:11434".to_string(),
            backend_wire: BackendWire::Generate,
            chat_path: "/v1/chat/completions".to_string(),
            generate_path: "/api/generate".to_string(),
            default_model: "deepseek-math".to_string(),
            instances_path: PathBuf::from("instances.json"),
            weight_busy: 2.0,
            weight_latency: 0.0,
            latency_window: 32,
            scan_strict: false,
        }
    }

    #[test]
    fn test_backend_wire_parse() {
        assert_eq!("chat".parse::<BackendWire>().unwrap(), BackendWire::ChatCompletions);
        assert_eq!("generate".parse::<BackendWire>().unwrap(), BackendWire::Generate);
        assert_eq!("ollama".parse::<BackendWire>().unwrap(), BackendWire::Generate);
        assert!("grpc".parse::<BackendWire>().is_err());
    }

    #[test]
    fn test_test_config_defaults() {
        let cfg = create_test_config(PathBuf::from("/tmp/storage"));
        assert_eq!(cfg.weight_busy, 2.0);
        assert_eq!(cfg.weight_latency, 0.0);
        assert!(!cfg.scan_strict);
    }
}
