//! Server configuration.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the listener binds to.
    pub listen_addr: String,
    /// Document root served to clients.
    pub root_dir: PathBuf,
    /// Hard ceiling on concurrent connections.
    pub max_connections: usize,
    /// Worker pool thread count.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            root_dir: PathBuf::from("."),
            max_connections: 1024,
            workers: 8,
        }
    }
}

impl Config {
    /// Loads configuration from the YAML file named by `CITADEL_CONFIG`,
    /// falling back to individual environment variables over the defaults.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("CITADEL_CONFIG") {
            return Self::from_file(&path);
        }

        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("LISTEN") {
            cfg.listen_addr = v;
        }
        if let Ok(v) = std::env::var("DOC_ROOT") {
            cfg.root_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MAX_CONNECTIONS") {
            cfg.max_connections = v.parse()?;
        }
        if let Ok(v) = std::env::var("WORKERS") {
            cfg.workers = v.parse()?;
        }
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}
