use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Options forwarded to the embed provider when resolving a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OembedOptions {
    pub min_image_width: u32,
    pub min_image_height: u32,
    pub html: OembedHtmlOptions,
}

impl Default for OembedOptions {
    fn default() -> Self {
        Self {
            min_image_width: 60,
            min_image_height: 60,
            html: OembedHtmlOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OembedHtmlOptions {
    pub max_images: u32,
    pub external_images: bool,
}

impl Default for OembedHtmlOptions {
    fn default() -> Self {
        Self {
            max_images: 10,
            external_images: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document opened when the CLI is started without a path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_path: Option<PathBuf>,
    /// Per block type feature switches, e.g. `[blocks."core/heading"] anchor = false`.
    pub blocks: BTreeMap<String, BTreeMap<String, bool>>,
    pub oembed: OembedOptions,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the document path
        config.document_path = config
            .document_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockshift");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Features not mentioned in the config are enabled.
    pub fn is_block_feature_enabled(&self, block: &str, feature: &str) -> bool {
        self.blocks
            .get(block)
            .and_then(|features| features.get(feature))
            .copied()
            .unwrap_or(true)
    }

    pub fn set_block_feature(&mut self, block: &str, feature: &str, enabled: bool) {
        self.blocks
            .entry(block.to_string())
            .or_default()
            .insert(feature.to_string(), enabled);
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
