use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::filters::FilterLimits;
use crate::domain::sanitize::SanitizeOptions;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config Sections
// =============================================================================

/// Filters configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub max_json_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
    pub allowed_fields: Option<Vec<String>>,
}

/// Sanitizer configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SanitizeFileConfig {
    pub blocked_tags: Option<Vec<String>>,
    pub allow_data_images: Option<bool>,
}

/// Output configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputFileConfig {
    pub pretty: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filters: Option<FiltersFileConfig>,
    pub sanitize: Option<SanitizeFileConfig>,
    pub output: Option<OutputFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Unknown top-level keys, which are most likely typos
    fn unknown_fields(&self) -> Vec<String> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.max_json_bytes.is_some() {
                tracing::trace!(max_json_bytes = ?filters.max_json_bytes, "Merging filters.max_json_bytes");
                current.max_json_bytes = filters.max_json_bytes;
            }
            if filters.max_depth.is_some() {
                tracing::trace!(max_depth = ?filters.max_depth, "Merging filters.max_depth");
                current.max_depth = filters.max_depth;
            }
            if filters.max_conditions.is_some() {
                tracing::trace!(max_conditions = ?filters.max_conditions, "Merging filters.max_conditions");
                current.max_conditions = filters.max_conditions;
            }
            if filters.allowed_fields.is_some() {
                tracing::trace!(allowed_fields = ?filters.allowed_fields, "Merging filters.allowed_fields");
                current.allowed_fields = filters.allowed_fields;
            }
        }

        if let Some(sanitize) = other.sanitize {
            let current = self.sanitize.get_or_insert_with(SanitizeFileConfig::default);
            if sanitize.blocked_tags.is_some() {
                tracing::trace!(blocked_tags = ?sanitize.blocked_tags, "Merging sanitize.blocked_tags");
                current.blocked_tags = sanitize.blocked_tags;
            }
            if sanitize.allow_data_images.is_some() {
                current.allow_data_images = sanitize.allow_data_images;
            }
        }

        if let Some(output) = other.output {
            let current = self.output.get_or_insert_with(OutputFileConfig::default);
            if output.pretty.is_some() {
                current.pretty = output.pretty;
            }
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub pretty: bool,
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub filters: FilterLimits,
    pub sanitize: SanitizeOptions,
    pub output: OutputConfig,
    pub debug: bool,
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.sieve/sieve.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layers(cli, get_profile_config_path(), PathBuf::from(CONFIG_FILE_NAME))
    }

    fn load_layers(cli: &CliConfig, profile_path: Option<PathBuf>, local_path: PathBuf) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else if local_path.exists() {
            Some(local_path)
        } else {
            None
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_filters = file_config.filters.unwrap_or_default();
        let file_sanitize = file_config.sanitize.unwrap_or_default();
        let file_output = file_config.output.unwrap_or_default();

        let default_limits = FilterLimits::default();
        let filters = FilterLimits {
            max_json_bytes: cli
                .max_filter_bytes
                .or(file_filters.max_json_bytes)
                .unwrap_or(default_limits.max_json_bytes),
            max_depth: cli
                .max_depth
                .or(file_filters.max_depth)
                .unwrap_or(default_limits.max_depth),
            max_conditions: cli
                .max_conditions
                .or(file_filters.max_conditions)
                .unwrap_or(default_limits.max_conditions),
            allowed_fields: cli
                .allowed_fields
                .clone()
                .or(file_filters.allowed_fields)
                .filter(|fields| !fields.is_empty()),
        };

        let default_sanitize = SanitizeOptions::default();
        let sanitize = SanitizeOptions {
            blocked_tags: file_sanitize
                .blocked_tags
                .unwrap_or(default_sanitize.blocked_tags),
            allow_data_images: cli
                .allow_data_images
                .or(file_sanitize.allow_data_images)
                .unwrap_or(default_sanitize.allow_data_images),
        };

        // Flags can only switch these on
        let output = OutputConfig {
            pretty: cli.pretty || file_output.pretty.unwrap_or(false),
        };
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        let config = Self {
            filters,
            sanitize,
            output,
            debug,
        };
        tracing::debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }
}
