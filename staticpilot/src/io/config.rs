//! Build configuration, validated once at startup.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional TOML
//! file, the process environment (after loading `<root>/.env` when present),
//! then CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::summary::OBSERVATION_LIMIT_CHARS;
use crate::error::ConfigError;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_URL: &str = "OPENAI_API_URL";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_MAX_STEPS: &str = "MAX_STEPS";

/// Literal reply that ends the build loop successfully.
pub const DEFAULT_COMPLETION_TOKEN: &str = "操作完成";

const REDACTED: &str = "<redacted>";

/// Runtime configuration for one build run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Bearer token for the chat endpoint. Required.
    pub api_key: String,
    /// Base URL or full chat-completions URL. Required.
    pub api_url: String,
    pub model: String,
    pub temperature: f64,

    /// Oracle round-trips allowed before the run is declared failed.
    pub max_steps: u32,
    /// Per-request HTTP timeout for oracle calls.
    pub request_timeout_secs: u64,
    /// Per-command timeout. Unset means commands may run indefinitely.
    pub command_timeout_secs: Option<u64>,
    /// Per-stream capture ceiling for executed commands.
    pub command_output_limit_bytes: usize,
    /// Character budget of one observation replayed to the oracle.
    pub observation_limit_chars: usize,
    /// POSIX shell used to interpret commands (`<shell> -c <command>`).
    pub shell: PathBuf,
    pub completion_token: String,

    /// Directory holding the task archive. Relative paths resolve against the root.
    pub task_dir: PathBuf,
    /// Extraction directory; the build loop runs here.
    pub source_dir: PathBuf,
    /// Directory receiving the release bundle.
    pub release_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_steps: 30,
            request_timeout_secs: 300,
            command_timeout_secs: None,
            command_output_limit_bytes: 10 * 1024 * 1024,
            observation_limit_chars: OBSERVATION_LIMIT_CHARS,
            shell: PathBuf::from("/bin/bash"),
            completion_token: DEFAULT_COMPLETION_TOKEN.to_string(),
            task_dir: PathBuf::from("task"),
            source_dir: PathBuf::from("source"),
            release_dir: PathBuf::from("release"),
        }
    }
}

/// CLI flags that override every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_steps: Option<u32>,
    pub model: Option<String>,
}

/// Absolute directory layout of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub task_dir: PathBuf,
    pub source_dir: PathBuf,
    pub release_dir: PathBuf,
}

impl Layout {
    /// Final path components of the source and release directories, which
    /// the artifact search must never descend into.
    pub fn working_dir_names(&self) -> Vec<String> {
        [&self.source_dir, &self.release_dir]
            .into_iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_API_KEY));
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_API_URL));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(invalid("api_url", "must start with http:// or https://"));
        }
        if self.model.trim().is_empty() {
            return Err(invalid("model", "must be non-empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be within [0, 2]"));
        }
        if self.max_steps == 0 {
            return Err(invalid("max_steps", "must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be > 0"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(invalid("command_timeout_secs", "must be > 0 when set"));
        }
        if self.command_output_limit_bytes == 0 {
            return Err(invalid("command_output_limit_bytes", "must be > 0"));
        }
        if self.observation_limit_chars == 0 {
            return Err(invalid("observation_limit_chars", "must be > 0"));
        }
        if self.shell.as_os_str().is_empty() {
            return Err(invalid("shell", "must be non-empty"));
        }
        if self.completion_token.trim().is_empty() {
            return Err(invalid("completion_token", "must be non-empty"));
        }
        Ok(())
    }

    /// Apply environment variables through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(raw) = lookup(ENV_MAX_STEPS) {
            self.max_steps = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                field: ENV_MAX_STEPS,
                reason: format!("expected a positive integer, got {raw:?}"),
            })?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(max_steps) = overrides.max_steps {
            self.max_steps = max_steps;
        }
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
    }

    /// Resolve the configured directories against `root`.
    pub fn layout(&self, root: &Path) -> Layout {
        Layout {
            root: root.to_path_buf(),
            task_dir: root.join(&self.task_dir),
            source_dir: root.join(&self.source_dir),
            release_dir: root.join(&self.release_dir),
        }
    }

    /// Copy of the configuration that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key.is_empty() {
            copy.api_key = REDACTED.to_string();
        }
        copy
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Load, merge and validate configuration for a run rooted at `root`.
pub fn load_config(
    root: &Path,
    file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<BuildConfig> {
    load_dotenv(root)?;
    let mut cfg = match file {
        Some(path) => read_config_file(path)?,
        None => BuildConfig::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok())?;
    cfg.apply_overrides(overrides);
    cfg.validate()?;
    debug!(model = %cfg.model, max_steps = cfg.max_steps, "configuration loaded");
    Ok(cfg)
}

/// Parse a TOML config file. Missing fields keep their defaults.
pub fn read_config_file(path: &Path) -> Result<BuildConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Render the configuration as TOML with the API key redacted.
pub fn render_redacted(cfg: &BuildConfig) -> Result<String> {
    toml::to_string_pretty(&cfg.redacted()).context("serialize config toml")
}

fn load_dotenv(root: &Path) -> Result<(), ConfigError> {
    let path = root.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::File {
            path,
            message: err.to_string(),
        }),
    }
}
