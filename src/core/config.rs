use crate::core::assumptions::{AdminGate, AssumptionOverrides, DEFAULT_ADMIN_KEY};
use crate::core::scenario::ScenarioInputs;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf};
use tracing::debug;

/// Environment variable that takes precedence over the configured admin key.
pub const ADMIN_KEY_ENV: &str = "EVENT_ROI_ADMIN_KEY";

fn default_program_name() -> String {
    "Scino360".to_string()
}

fn default_currency_symbol() -> String {
    "₣".to_string()
}

#[derive(Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_program_name")]
    pub program_name: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    pub admin_key: Option<String>,
    /// Values used when the matching CLI flag is not given.
    #[serde(default)]
    pub inputs: ScenarioInputs,
    /// Only honoured once admin mode is unlocked.
    #[serde(default)]
    pub overrides: AssumptionOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            program_name: default_program_name(),
            currency_symbol: default_currency_symbol(),
            admin_key: None,
            inputs: ScenarioInputs::default(),
            overrides: AssumptionOverrides::default(),
        }
    }
}

// Hand written so the admin key never reaches the logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("program_name", &self.program_name)
            .field("currency_symbol", &self.currency_symbol)
            .field(
                "admin_key",
                &self.admin_key.as_ref().map(|_| "<redacted>"),
            )
            .field("inputs", &self.inputs)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "scino360", "event-roi")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        // Inputs and overrides are checked after merging with the command
        // line, and overrides only once admin mode is unlocked.
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Builds the admin gate from the environment, then the file, then the
    /// built-in fallback.
    pub fn admin_gate(&self) -> AdminGate {
        self.admin_gate_with(std::env::var(ADMIN_KEY_ENV).ok())
    }

    /// Builds the admin gate from an explicit environment value.
    pub fn admin_gate_with(&self, from_env: Option<String>) -> AdminGate {
        AdminGate::new(resolve_admin_key(from_env, self.admin_key.as_deref()))
    }
}

fn resolve_admin_key(from_env: Option<String>, configured: Option<&str>) -> String {
    match (from_env, configured) {
        (Some(key), _) => {
            debug!("Using admin key from {ADMIN_KEY_ENV}");
            key
        }
        (None, Some(key)) => key.to_string(),
        (None, None) => DEFAULT_ADMIN_KEY.to_string(),
    }
}
