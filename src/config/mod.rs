//! Configuration management for sessionctl.
//!
//! Handles loading and persistence of the daemon executable, transport limits,
//! view rendering and attach settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::daemon::ExitStatusPolicy;

/// Env var overriding the daemon executable.
pub const ENV_EXECUTABLE: &str = "SESSIONCTL_EXECUTABLE";
/// Env var overriding the attach backend.
pub const ENV_BACKEND: &str = "SESSIONCTL_BACKEND";

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path or name of the daemon executable
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Per-call timeout in seconds (0 waits forever)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How to treat a non-zero daemon exit
    #[serde(default)]
    pub exit_status: ExitStatusPolicy,

    /// Render colors when displaying a view
    #[serde(default = "default_true")]
    pub interpret_color: bool,

    /// Attach configuration
    #[serde(default)]
    pub attach: AttachConfig,

    /// Editor used by send-buffer (falls back to $VISUAL / $EDITOR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

fn default_executable() -> String {
    "sessiond".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeout_secs: default_timeout_secs(),
            exit_status: ExitStatusPolicy::default(),
            interpret_color: true,
            attach: AttachConfig::default(),
            editor: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or return defaults if
    /// no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate();

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("sessionctl").join("config.json"))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(executable) = std::env::var(ENV_EXECUTABLE) {
            self.executable = executable;
        }
        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            self.attach.backend = backend;
        }
        self.validate();
    }

    /// Replace blank values with their defaults
    pub fn validate(&mut self) {
        if self.executable.trim().is_empty() {
            self.executable = default_executable();
        }
        self.attach.validate();
    }

    /// Per-call transport timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Editor command for send-buffer
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var("VISUAL").ok().filter(|e| !e.trim().is_empty()))
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| "vi".to_string())
    }
}

/// Attach configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachConfig {
    /// Name of the registered attach backend
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Multiplexer command that joins a session
    #[serde(default = "default_attach_program")]
    pub program: String,

    /// Prefix the daemon puts in front of session ids on the multiplexer side
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_backend() -> String {
    "inline".to_string()
}

fn default_attach_program() -> String {
    "tmux attach-session".to_string()
}

fn default_namespace() -> String {
    "sessiond".to_string()
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            program: default_attach_program(),
            namespace: default_namespace(),
        }
    }
}

impl AttachConfig {
    /// Replace blank values with their defaults
    pub fn validate(&mut self) {
        if self.backend.trim().is_empty() {
            self.backend = default_backend();
        }
        if self.program.trim().is_empty() {
            self.program = default_attach_program();
        }
        if self.namespace.trim().is_empty() {
            self.namespace = default_namespace();
        }
    }
}
