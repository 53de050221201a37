//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/hyptree/hyptree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `HYPTREE_*` prefix (`HYPTREE_WALK__STEPS` for nested keys)
//! 5. Command line flags

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Settings for the hypothesis walk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WalkConfig {
    /// Number of split/prune steps
    pub steps: usize,
    /// Chance of pruning when both edits are possible
    pub prune_probability: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            prune_probability: 0.3,
        }
    }
}

/// Raw walk config for intermediate parsing (None → inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawWalkConfig {
    pub steps: Option<usize>,
    pub prune_probability: Option<f64>,
}

impl WalkConfig {
    fn merge(&self, overlay: &RawWalkConfig) -> Self {
        Self {
            steps: overlay.steps.unwrap_or(self.steps),
            prune_probability: overlay.prune_probability.unwrap_or(self.prune_probability),
        }
    }
}

/// Unified configuration for hyptree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Tree levels, root included
    pub depth: usize,
    /// Children per inner node
    pub branch_count: usize,
    /// Split arity
    pub split_num: usize,
    /// RNG seed, entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Number of ranked partitions to show
    pub top: usize,
    /// Cap on enumerated partitions to print
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Hypothesis walk settings
    pub walk: WalkConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depth: 3,
            branch_count: 3,
            split_num: 2,
            seed: None,
            top: 20,
            limit: None,
            walk: WalkConfig::default(),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub depth: Option<usize>,
    pub branch_count: Option<usize>,
    pub split_num: Option<usize>,
    pub seed: Option<u64>,
    pub top: Option<usize>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub walk: RawWalkConfig,
}

/// Values given on the command line; `None` keeps the loaded setting.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub depth: Option<usize>,
    pub branch_count: Option<usize>,
    pub split_num: Option<usize>,
    pub seed: Option<u64>,
}

/// Get the XDG config directory for hyptree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hyptree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("hyptree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            depth: overlay.depth.unwrap_or(self.depth),
            branch_count: overlay.branch_count.unwrap_or(self.branch_count),
            split_num: overlay.split_num.unwrap_or(self.split_num),
            seed: overlay.seed.or(self.seed),
            top: overlay.top.unwrap_or(self.top),
            limit: overlay.limit.or(self.limit),
            walk: self.walk.merge(&overlay.walk),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit file
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply HYPTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("HYPTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<usize>("depth") {
            settings.depth = val;
        }
        if let Ok(val) = config.get::<usize>("branch_count") {
            settings.branch_count = val;
        }
        if let Ok(val) = config.get::<usize>("split_num") {
            settings.split_num = val;
        }
        if let Ok(val) = config.get::<u64>("seed") {
            settings.seed = Some(val);
        }
        if let Ok(val) = config.get::<usize>("top") {
            settings.top = val;
        }
        if let Ok(val) = config.get::<usize>("limit") {
            settings.limit = Some(val);
        }
        if let Ok(val) = config.get::<usize>("walk.steps") {
            settings.walk.steps = val;
        }
        if let Ok(val) = config.get::<f64>("walk.prune_probability") {
            settings.walk.prune_probability = val;
        }

        Ok(settings)
    }

    /// Apply command line values on top of loaded settings.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self, ApplicationError> {
        if let Some(depth) = overrides.depth {
            self.depth = depth;
        }
        if let Some(branch_count) = overrides.branch_count {
            self.branch_count = branch_count;
        }
        if let Some(split_num) = overrides.split_num {
            self.split_num = split_num;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.split_num == 0 {
            return Err(ApplicationError::Config {
                message: "split_num must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.walk.prune_probability) {
            return Err(ApplicationError::Config {
                message: format!(
                    "walk.prune_probability must be within [0, 1], got {}",
                    self.walk.prune_probability
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# hyptree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/hyptree/hyptree.toml
#   File:   --config <path>
#   Env:    HYPTREE_* environment variables (HYPTREE_WALK__STEPS for [walk].steps)

# Tree levels, root included
# depth = 3

# Children per inner node
# branch_count = 3

# Children grouped per split
# split_num = 2

# Fixed RNG seed for reproducible runs
# seed = 42

# Ranked partitions shown by `best`
# top = 20

[walk]
# steps = 50
# prune_probability = 0.3
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
