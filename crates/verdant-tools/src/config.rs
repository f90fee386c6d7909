//! Tool configuration.
//!
//! Output settings plus the full generator configuration, read from
//! `verdant.toml`. Command-line flags override anything set here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use verdant_common::{VerdantError, VerdantResult};
use verdant_terrain::GeneratorConfig;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "verdant.toml";

/// Tool configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    // === Grid ===
    /// Grid width in tiles
    pub width: u32,
    /// Grid depth in tiles
    pub depth: u32,
    /// Generation seed (None = random)
    pub seed: Option<u64>,

    // === Output ===
    /// Print the ASCII preview
    pub ascii: bool,
    /// PNG preview destination
    pub png: Option<PathBuf>,
    /// Pixels per tile in the PNG preview
    pub png_scale: u32,
    /// JSON dump destination
    pub json: Option<PathBuf>,

    /// Generator settings
    pub generator: GeneratorConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 32,
            seed: None,
            ascii: true,
            png: None,
            png_scale: 4,
            json: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from `verdant.toml` in the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Load configuration from a path the user asked for. Any failure,
    /// including an incomplete rule table, is an error.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> VerdantResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| VerdantError::Config(e.to_string()))?;
        config.generator.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp output settings to sensible ranges.
    pub fn validate(&mut self) {
        self.png_scale = self.png_scale.clamp(1, 32);
    }
}
