// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::util::color::is_hex_color;
use crate::util::log_level_changer::parse_level_filter;
use crate::workspace::{DEFAULT_SETTINGS_FOLDER, validate_path_segment};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "annotations.yaml";

const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnnotationsConfig {
    #[serde(default = "default_settings_folder")]
    pub settings_folder: String,
    #[serde(default = "default_tags_file")]
    pub tags_file: String,
    #[serde(default = "default_groups_file")]
    pub groups_file: String,
    #[serde(default = "default_tag_color")]
    pub default_tag_color: String,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            settings_folder: default_settings_folder(),
            tags_file: default_tags_file(),
            groups_file: default_groups_file(),
            default_tag_color: default_tag_color(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_settings_folder() -> String {
    DEFAULT_SETTINGS_FOLDER.to_string()
}

fn default_tags_file() -> String {
    "metadata-tags.yaml".to_string()
}

fn default_groups_file() -> String {
    "groups.yaml".to_string()
}

fn default_tag_color() -> String {
    crate::model::DEFAULT_TAG_COLOR.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_watch_enabled")]
    pub enabled: bool,
    #[serde(default = "default_watch_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_watch_enabled(),
            debounce_ms: default_watch_debounce_ms(),
        }
    }
}

fn default_watch_enabled() -> bool {
    true
}

fn default_watch_debounce_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AnnotationsConfig {
    /// Load `annotations.yaml` from the workspace root. A missing file yields
    /// the defaults; a present file must parse and validate.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        let config: AnnotationsConfig = if config_content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&config_content).map_err(|e| {
                ConfigError::LoadError(format!(
                    "Failed to parse config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_file_names(self)?;

        if !is_hex_color(&self.default_tag_color) {
            return Err(ConfigError::ValidationError(format!(
                "default_tag_color must be a #RRGGBB color, got: {}",
                self.default_tag_color
            )));
        }

        if self.watch.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::ValidationError(format!(
                "watch.debounce_ms must be at most {}, got: {}",
                MAX_DEBOUNCE_MS, self.watch.debounce_ms
            )));
        }

        if parse_level_filter(&self.logging.level).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of off, error, warn, info, debug, trace, got: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    fn validate_file_names(&self) -> Result<(), ConfigError> {
        let names = [
            (&self.settings_folder, "settings_folder"),
            (&self.tags_file, "tags_file"),
            (&self.groups_file, "groups_file"),
        ];
        for (value, field) in names {
            validate_path_segment(value, field).map_err(ConfigError::ValidationError)?;
        }
        if self.tags_file == self.groups_file {
            return Err(ConfigError::ValidationError(format!(
                "tags_file and groups_file must differ, both are: {}",
                self.tags_file
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> LevelFilter {
        parse_level_filter(&self.logging.level).unwrap_or(LevelFilter::Info)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}
