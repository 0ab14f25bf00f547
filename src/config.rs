use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Overrides `storage.postgres_url`
pub const ENV_POSTGRES_CONN: &str = "POSTGRES_CONN_BALANCE";
/// Overrides `gateway.host` / `gateway.port`, formatted `host:port`
pub const ENV_BALANCE_ADDRESS: &str = "BALANCE_ADDRESS";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Deadline for each ledger call, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Not durable; for local runs and tests
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            postgres_url: None,
            max_connections: 10,
            acquire_timeout_ms: 5000,
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment overrides
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;

        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `POSTGRES_CONN_BALANCE` and `BALANCE_ADDRESS` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_POSTGRES_CONN).filter(|v| !v.is_empty()) {
            self.storage.postgres_url = Some(url);
        }

        if let Some(addr) = lookup(ENV_BALANCE_ADDRESS).filter(|v| !v.is_empty()) {
            let (host, port) = addr
                .rsplit_once(':')
                .with_context(|| format!("{} must be host:port, got '{}'", ENV_BALANCE_ADDRESS, addr))?;
            self.gateway.port = port
                .parse()
                .with_context(|| format!("Invalid port in {}: '{}'", ENV_BALANCE_ADDRESS, port))?;
            if !host.is_empty() {
                self.gateway.host = host.to_string();
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.postgres_url.is_none() {
            bail!(
                "storage.backend is postgres but no postgres_url is set (config or {})",
                ENV_POSTGRES_CONN
            );
        }
        if self.operation_timeout_ms == 0 {
            bail!("operation_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
