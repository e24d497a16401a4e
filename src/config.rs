// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct CrtShConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_rate_delay")]
    pub rate_delay_secs: u64,
}

fn default_endpoint() -> String {
    "https://crt.sh/".to_string()
}
fn default_timeout() -> u64 { 20 }
fn default_max_retries() -> u32 { 3 }
fn default_rate_delay() -> u64 { 1 }

impl Default for CrtShConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            rate_delay_secs: default_rate_delay(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnumerationConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_skip_done")]
    pub skip_done: bool,
    #[serde(default)]
    pub max_queries_per_domain: Option<usize>,  // None = unbounded traversal
}

fn default_workers() -> usize { 1 }
fn default_skip_done() -> bool { true }

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            skip_done: default_skip_done(),
            max_queries_per_domain: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

fn default_output_directory() -> String {
    ".".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub crtsh: CrtShConfig,
    #[serde(default)]
    pub enumeration: EnumerationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Runtime settings shared by the fetcher, enumerator and dispatcher.
///
/// Built once from [`Config`] and handed to each constructor; nothing in the
/// library reads configuration from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConfig {
    pub endpoint: String,
    pub workers: usize,
    pub rate_delay: Duration,
    pub max_retries: u32,
    pub timeout: Duration,
    pub skip_done: bool,
    pub max_queries: Option<usize>,
}

impl Default for EnumConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            workers: default_workers(),
            rate_delay: Duration::from_secs(default_rate_delay()),
            max_retries: default_max_retries(),
            timeout: Duration::from_secs(default_timeout()),
            skip_done: default_skip_done(),
            max_queries: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Validate and convert into the runtime configuration
    pub fn enum_config(&self) -> anyhow::Result<EnumConfig> {
        if self.enumeration.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.crtsh.max_retries == 0 {
            anyhow::bail!("max_retries must be at least 1");
        }
        if self.crtsh.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }
        if self.enumeration.max_queries_per_domain == Some(0) {
            anyhow::bail!("max_queries_per_domain must be greater than 0 when set");
        }
        url::Url::parse(&self.crtsh.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid endpoint '{}': {}", self.crtsh.endpoint, e))?;

        Ok(EnumConfig {
            endpoint: self.crtsh.endpoint.clone(),
            workers: self.enumeration.workers,
            rate_delay: Duration::from_secs(self.crtsh.rate_delay_secs),
            max_retries: self.crtsh.max_retries,
            timeout: Duration::from_secs(self.crtsh.timeout_secs),
            skip_done: self.enumeration.skip_done,
            max_queries: self.enumeration.max_queries_per_domain,
        })
    }

    pub fn output_directory(&self) -> PathBuf {
        PathBuf::from(&self.output.directory)
    }
}
