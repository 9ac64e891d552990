//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.finreport.toml` files.

use crate::charts::ChartFormat;
use crate::narrator::ChatConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".finreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Text-generation endpoint settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Directory for CSV/JSON exports. No exports when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            export_dir: None,
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "financial_report.md".to_string()
}

/// Remote model settings. The API key is never read from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    ChatConfig::default().model
}

fn default_api_url() -> String {
    ChatConfig::default().api_url
}

fn default_timeout() -> u64 {
    ChatConfig::default().timeout_seconds
}

/// Report content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Column used to rank top performers.
    #[serde(default = "default_metric")]
    pub ranking_metric: String,

    /// Number of top performers.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Include the sector analysis when the data has a Sector column.
    #[serde(default = "default_true")]
    pub include_sectors: bool,

    /// Include the risk assessment.
    #[serde(default = "default_true")]
    pub include_risk: bool,

    /// Include the commentary section.
    #[serde(default = "default_true")]
    pub include_narrative: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ranking_metric: default_metric(),
            top_n: default_top_n(),
            include_sectors: true,
            include_risk: true,
            include_narrative: true,
        }
    }
}

fn default_metric() -> String {
    crate::models::NET_INCOME.to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

/// Chart settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Render charts into the report.
    #[serde(default)]
    pub enabled: bool,

    /// Preferred renderer; falls back to text when unavailable.
    #[serde(default)]
    pub format: ChartFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only values
    /// the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref dir) = args.export_dir {
            self.general.export_dir = Some(dir.display().to_string());
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.api_url {
            self.model.api_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref metric) = args.metric {
            self.report.ranking_metric = metric.trim().to_string();
        }
        if let Some(top_n) = args.top_n {
            self.report.top_n = top_n;
        }
        if args.no_sectors {
            self.report.include_sectors = false;
        }
        if args.no_risk {
            self.report.include_risk = false;
        }
        if args.no_narrative {
            self.report.include_narrative = false;
        }

        if args.charts {
            self.charts.enabled = true;
        }
        if let Some(format) = args.chart_format {
            self.charts.enabled = true;
            self.charts.format = format;
        }
    }

    /// Chat client settings for the given credential.
    pub fn chat_config(&self, api_key: &str) -> ChatConfig {
        ChatConfig {
            api_url: self.model.api_url.clone(),
            api_key: api_key.to_string(),
            model: self.model.name.clone(),
            timeout_seconds: self.model.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
