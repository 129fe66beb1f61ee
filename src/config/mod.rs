//! Configuration layer: typed settings with layered precedence (defaults →
//! file → environment).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "codetocrack";
const ENV_PREFIX: &str = "CODETOCRACK";

const DEFAULT_SITE_NAME: &str = "Code to Crack";
const DEFAULT_BASE_URL: &str = "https://www.codetocrack.dev";
const DEFAULT_DESCRIPTION: &str =
    "Master programming concepts with tutorials, tips, and best practices.";
const DEFAULT_IMAGE_PATH: &str = "/images/logo.png";
const DEFAULT_AUTHOR: &str = "Code to Crack Team";
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Site identity and publishing defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    /// Absolute origin used for every absolute URL the system emits.
    pub base_url: String,
    pub description: String,
    /// Path (relative to the origin) of the fallback social image.
    pub default_image: String,
    pub default_author: String,
    pub page_size: usize,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            default_image: DEFAULT_IMAGE_PATH.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SiteSettings {
    /// Absolute URL of the fallback social image.
    pub fn default_image_url(&self) -> String {
        crate::domain::urls::absolute_url(&self.base_url, &self.default_image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub site: SiteSettings,
    pub logging: LoggingSettings,
}

/// Load settings from an optional file and the `CODETOCRACK_*` environment.
///
/// Without an explicit path, a `codetocrack.{toml,yaml,json}` file next to
/// the process is picked up when present.
pub fn load(config_file: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = match config_file {
        Some(path) => builder.add_source(File::from(path)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
    };
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    Ok(builder.build()?.try_deserialize()?)
}
