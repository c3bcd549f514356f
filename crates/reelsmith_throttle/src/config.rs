//! Layered TOML configuration.
//!
//! Sources, later overriding earlier:
//! - bundled defaults (`reelsmith.toml` compiled into the binary)
//! - `~/.config/reelsmith/reelsmith.toml`
//! - `./reelsmith.toml`

use crate::ProviderProfile;
use config::{Config, File, FileFormat};
use reelsmith_core::{AssemblyConfig, PlanningConfig};
use reelsmith_error::{ConfigError, ReelsmithError, ReelsmithResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../reelsmith.toml");

/// Top-level reelsmith configuration.
///
/// # Example
///
/// ```no_run
/// use reelsmith_throttle::ReelsmithConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReelsmithConfig::load()?;
/// let profile = config.provider(None)?;
/// println!("{} allows {} jobs at once", profile.name, profile.max_concurrent);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReelsmithConfig {
    /// Provider used when a run names none
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Directory for content-addressed clips
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Directory for persisted run state
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,

    /// Runs allowed to execute at once
    #[serde(default = "default_max_parallel_runs")]
    pub max_parallel_runs: u32,

    /// Provider profiles by name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderProfile>,

    /// Chunk planning limits
    #[serde(default)]
    pub planning: PlanningConfig,

    /// Final assembly settings
    #[serde(default)]
    pub assembly: AssemblyConfig,
}

fn default_provider() -> String {
    "veo".to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".reelsmith/clips")
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from(".reelsmith/runs")
}

fn default_max_parallel_runs() -> u32 {
    1
}

impl Default for ReelsmithConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            storage_dir: default_storage_dir(),
            runs_dir: default_runs_dir(),
            max_parallel_runs: default_max_parallel_runs(),
            providers: BTreeMap::new(),
            planning: PlanningConfig::default(),
            assembly: AssemblyConfig::default(),
        }
    }
}

fn build_error(e: config::ConfigError) -> ReelsmithError {
    ConfigError::new(format!("Failed to build configuration: {}", e)).into()
}

fn parse_error(e: config::ConfigError) -> ReelsmithError {
    ConfigError::new(format!("Failed to parse configuration: {}", e)).into()
}

impl ReelsmithConfig {
    /// Loads configuration from a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ReelsmithResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ReelsmithError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(parse_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads bundled defaults overlaid with user configuration files.
    ///
    /// User files are optional and skipped when absent.
    #[instrument]
    pub fn load() -> ReelsmithResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/reelsmith/reelsmith.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("reelsmith").required(false));

        let config: Self = builder
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads an explicit file when given, otherwise the layered defaults.
    pub fn load_from(path: Option<&std::path::Path>) -> ReelsmithResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Checks the planning limits and every provider profile.
    pub fn validate(&self) -> ReelsmithResult<()> {
        self.planning.validate()?;
        for (name, profile) in &self.providers {
            let mut named = profile.clone();
            if named.name.is_empty() {
                named.name = name.clone();
            }
            named.validate()?;
        }
        Ok(())
    }

    /// Returns the named provider profile, or the default provider's.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no such provider is configured.
    pub fn provider(&self, name: Option<&str>) -> ReelsmithResult<ProviderProfile> {
        let name = name.unwrap_or(&self.default_provider);
        let mut profile = self.providers.get(name).cloned().ok_or_else(|| {
            ReelsmithError::from(ConfigError::new(format!(
                "Unknown provider {:?}; configured: {}",
                name,
                self.providers.keys().cloned().collect::<Vec<_>>().join(", ")
            )))
        })?;
        if profile.name.is_empty() {
            profile.name = name.to_string();
        }
        Ok(profile)
    }

    /// Planning limits clamped to a provider's clip ceiling.
    pub fn planning_for(&self, profile: &ProviderProfile) -> PlanningConfig {
        profile.planning_config(&self.planning)
    }
}
