use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_script_extension() -> String {
    "ps1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub max_file_size: usize,
    pub bind_addr: SocketAddr,
    /// Extension (without dot) the encoding tools look for.
    pub script_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            bind_addr: default_bind_addr(),
            script_extension: default_script_extension(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("SHEET_ANALYZER_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid SHEET_ANALYZER_ADDR: {}", addr))?;
        }

        if let Some(size) = lookup("SHEET_ANALYZER_MAX_FILE_SIZE") {
            config.max_file_size = size
                .parse()
                .with_context(|| format!("Invalid SHEET_ANALYZER_MAX_FILE_SIZE: {}", size))?;
        }

        if let Some(ext) = lookup("SHEET_ANALYZER_SCRIPT_EXT") {
            let ext = ext.trim().trim_start_matches('.').to_string();
            if ext.is_empty() {
                anyhow::bail!("SHEET_ANALYZER_SCRIPT_EXT must not be empty");
            }
            config.script_extension = ext;
        }

        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    Config::new()
}
