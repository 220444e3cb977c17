//! Server configuration from the environment

use anyhow::{Context, Result};
use label_layout::{LayoutConfig, StrategyKind};

pub const DEFAULT_PORT: u16 = 3000;

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Strategy used when a request does not pick one
    pub strategy: StrategyKind,
    pub max_upload_bytes: usize,
    pub layout: LayoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            strategy: StrategyKind::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            layout: LayoutConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `LABEL_STRATEGY` and `MAX_UPLOAD_BYTES`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }

        if let Some(strategy) = lookup("LABEL_STRATEGY") {
            config.strategy = strategy
                .parse()
                .with_context(|| format!("LABEL_STRATEGY is not usable: {}", strategy))?;
        }

        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a byte count: {}", limit))?;
        }

        Ok(config)
    }
}
