//! Planner configuration.
//!
//! Settings come from an optional `starlight.toml` file and are then
//! overridden by environment variables. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration apart from the API
//! key.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ErrorContext, PlannerError, PlannerResult};
use crate::services::brief::PromptProfile;

/// Full planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub prompt: PromptProfile,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Reasoning service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub fallback_model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Resolved from `api_key_env`; never read from or written to the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            fallback_model: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            api_key: None,
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    ["starlight.toml", "backend/starlight.toml", "../starlight.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PlannerError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new("load_config").with_details(path.display().to_string()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> PlannerResult<Self> {
        toml::from_str(content).map_err(|e| {
            PlannerError::configuration_with_context(
                format!("Failed to parse config file: {}", e),
                ErrorContext::new("load_config"),
            )
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `starlight.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> PlannerResult<Self> {
        match find_config_file() {
            Some(path) => Self::from_file(path),
            None => Err(PlannerError::configuration(
                "No starlight.toml found in standard locations",
            )),
        }
    }

    /// File configuration if one exists, defaults otherwise, then environment
    /// overrides and validation.
    pub fn load() -> PlannerResult<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                log::info!("loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("no starlight.toml found; using built-in defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    ///
    /// # Environment Variables
    /// - `<service.api_key_env>` (default `GEMINI_API_KEY`): API key
    /// - `STARLIGHT_MODEL`, `STARLIGHT_FALLBACK_MODEL`, `STARLIGHT_BASE_URL`
    /// - `STARLIGHT_TIMEOUT_SECS`
    /// - `HOST`, `PORT`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> PlannerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(&self.service.api_key_env) {
            self.service.api_key = Some(key);
        }
        if let Some(model) = lookup("STARLIGHT_MODEL") {
            self.service.model = model;
        }
        if let Some(model) = lookup("STARLIGHT_FALLBACK_MODEL") {
            self.service.fallback_model = Some(model);
        }
        if let Some(url) = lookup("STARLIGHT_BASE_URL") {
            self.service.base_url = url;
        }
        if let Some(secs) = lookup("STARLIGHT_TIMEOUT_SECS") {
            self.service.timeout_secs = secs.trim().parse().map_err(|_| {
                PlannerError::configuration_with_context(
                    "STARLIGHT_TIMEOUT_SECS must be a whole number of seconds",
                    ErrorContext::new("apply_overrides").with_field("STARLIGHT_TIMEOUT_SECS"),
                )
            })?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                PlannerError::configuration_with_context(
                    "PORT must be a valid port number",
                    ErrorContext::new("apply_overrides").with_field("PORT"),
                )
            })?;
        }
        Ok(())
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> PlannerResult<()> {
        let svc = &self.service;
        if svc.model.trim().is_empty() {
            return Err(PlannerError::configuration_with_context(
                "service.model must not be empty",
                ErrorContext::new("validate_config").with_field("service.model"),
            ));
        }
        if !(0.0..=2.0).contains(&svc.temperature) {
            return Err(PlannerError::configuration_with_context(
                format!("service.temperature {} is outside [0, 2]", svc.temperature),
                ErrorContext::new("validate_config").with_field("service.temperature"),
            ));
        }
        if svc.timeout_secs == 0 {
            return Err(PlannerError::configuration_with_context(
                "service.timeout_secs must be greater than zero",
                ErrorContext::new("validate_config").with_field("service.timeout_secs"),
            ));
        }
        Ok(())
    }
}
