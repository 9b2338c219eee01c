use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::{AttributionError, AttributionResult};
use crate::types::StageKey;

/// Root application configuration. Loaded from environment variables
/// with the prefix `FUNNEL_ATTRIBUTION__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Defaults for a rendered attribution table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Stage selected when the table is first shown.
    #[serde(default)]
    pub default_stage: StageKey,
    #[serde(default = "default_show_total_row")]
    pub show_total_row: bool,
    #[serde(default = "default_show_cost_columns")]
    pub show_cost_columns: bool,
    /// Attribution model name, only used in header tooltips.
    #[serde(default = "default_attribution_model")]
    pub attribution_model: String,
    /// What a row represents ("Channel", "Campaign", ...).
    #[serde(default = "default_data_nickname")]
    pub data_nickname: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub min_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_include_footer")]
    pub include_footer: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AttributionError::UnknownExportFormat(other.to_string())),
        }
    }
}

// Default functions
fn default_show_total_row() -> bool {
    true
}
fn default_show_cost_columns() -> bool {
    true
}
fn default_attribution_model() -> String {
    "full journey".to_string()
}
fn default_data_nickname() -> String {
    "Channel".to_string()
}
fn default_height() -> u32 {
    440
}
fn default_include_footer() -> bool {
    true
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_stage: StageKey::default(),
            show_total_row: default_show_total_row(),
            show_cost_columns: default_show_cost_columns(),
            attribution_model: default_attribution_model(),
            data_nickname: default_data_nickname(),
            title: None,
            height: default_height(),
            min_rows: 0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            include_footer: default_include_footer(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> AttributionResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, overridden by
    /// environment variables.
    pub fn load_from(path: Option<&Path>) -> AttributionResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Reading config file");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix("FUNNEL_ATTRIBUTION")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        debug!(
            stage = %config.table.default_stage,
            format = ?config.export.format,
            "Config loaded"
        );
        Ok(config)
    }
}
