use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Which storage backend the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum StorageBackend {
    #[default]
    #[serde(rename = "in-memory")]
    InMemory,
    #[serde(rename = "disk")]
    Disk,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::InMemory => "in-memory",
            StorageBackend::Disk => "disk",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "in-memory" => Ok(StorageBackend::InMemory),
            "disk" => Ok(StorageBackend::Disk),
            other => Err(anyhow!("unknown storage backend `{other}`: use `in-memory` or `disk`")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), root_dir: default_root_dir() }
    }
}

fn default_root_dir() -> String { "storage".to_string() }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Build a config from defaults overridden by `SERVER_HOST`, `SERVER_PORT`,
/// `STORAGE_BACKEND` and `STORAGE_DIR`.
pub fn from_env() -> Result<AppConfig> {
    let mut cfg = AppConfig::default();
    if let Ok(host) = std::env::var("SERVER_HOST") {
        cfg.server.host = host;
    }
    if let Ok(port) = std::env::var("SERVER_PORT") {
        cfg.server.port = port
            .parse()
            .map_err(|e| anyhow!("SERVER_PORT `{port}` is not a valid port: {e}"))?;
    }
    if let Ok(threads) = std::env::var("TOKIO_WORKER_THREADS") {
        cfg.server.worker_threads = threads.parse().ok();
    }
    if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
        cfg.storage.backend = backend.parse()?;
    }
    if let Ok(dir) = std::env::var("STORAGE_DIR") {
        cfg.storage.root_dir = dir;
    }
    Ok(cfg)
}

/// Load from `explicit_path` when given; a missing explicit file is an error.
/// Without one, a missing `default_path` falls back to [`from_env`].
pub fn load_or_env(explicit_path: Option<&str>, default_path: &str) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        return load_from_file(path).map_err(|e| anyhow!("cannot load config from CONFIG_PATH={path}: {e}"));
    }
    match load_from_file(default_path) {
        Ok(cfg) => Ok(cfg),
        Err(e) if is_missing_file(&e) => {
            warn!(path = default_path, "config file not found; using environment variables");
            from_env()
        }
        Err(e) => Err(e),
    }
}

impl AppConfig {
    /// 优先读取 CONFIG_PATH / config.toml；仅默认文件缺失时回退到环境变量
    pub fn load_and_validate() -> Result<Self> {
        let explicit = std::env::var("CONFIG_PATH").ok();
        let mut cfg = load_or_env(explicit.as_deref(), DEFAULT_CONFIG_PATH)?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::Disk && self.root_dir.trim().is_empty() {
            return Err(anyhow!("storage.root_dir must not be empty for the disk backend"));
        }
        Ok(())
    }
}
