//! Configuration loading for airq.
//! Reads airq.toml from the current directory or path in AIRQ_CONFIG env var.
//! Every field has a default, so a missing file or section is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub eda: EdaConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 8501 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

fn default_csv_path() -> PathBuf { PathBuf::from("data/cleaned_air_quality.csv") }

impl Default for DataConfig {
    fn default() -> Self {
        Self { csv_path: default_csv_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_regressor_path")]
    pub regressor_path: PathBuf,
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,
}

fn default_regressor_path()  -> PathBuf { PathBuf::from("models/aqi_regressor.json") }
fn default_classifier_path() -> PathBuf { PathBuf::from("models/aqi_classifier.json") }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            regressor_path: default_regressor_path(),
            classifier_path: default_classifier_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaConfig {
    #[serde(default = "default_city_count")]
    pub default_city_count: usize,
    #[serde(default = "default_pollutant_count")]
    pub default_pollutant_count: usize,
}

fn default_city_count()      -> usize { 3 }
fn default_pollutant_count() -> usize { 2 }

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            default_city_count: default_city_count(),
            default_pollutant_count: default_pollutant_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewConfig {
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_heatmap_max_rows")]
    pub heatmap_max_rows: usize,
}

fn default_preview_rows()     -> usize { 100 }
fn default_heatmap_max_rows() -> usize { 200 }

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            heatmap_max_rows: default_heatmap_max_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf { PathBuf::from("crates/airq-web/static") }

impl Default for WebConfig {
    fn default() -> Self {
        Self { static_dir: default_static_dir() }
    }
}

mod tests;

impl Config {
    /// Path of the config file: AIRQ_CONFIG env var, else airq.toml in the current directory.
    pub fn path() -> PathBuf {
        std::env::var("AIRQ_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("airq.toml"))
    }

    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.overview.heatmap_max_rows == 0 {
            anyhow::bail!("overview.heatmap_max_rows must be at least 1");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
