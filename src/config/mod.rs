//! Dispatcher configuration loaded from TOML.
//!
//! ```toml
//! leader = "ctrl+x"
//! sequence_timeout_ms = 500
//! initial_mode = "command"
//!
//! [keymap]
//! save = "ctrl+w"
//! go-top = "<leader>g"
//! ```

use crate::keybindings::sequence::DEFAULT_SEQUENCE_TIMEOUT;
use crate::mode::Mode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Step substituted for `<leader>`; `None` uses the built-in default.
    #[serde(default)]
    pub leader: Option<String>,
    #[serde(default = "default_sequence_timeout_ms")]
    pub sequence_timeout_ms: u64,
    #[serde(default)]
    pub initial_mode: Mode,
    /// Per-command hotkey overrides, keyed by command id. An empty string
    /// unbinds the command's default hotkey.
    #[serde(default)]
    pub keymap: BTreeMap<String, String>,
}

fn default_sequence_timeout_ms() -> u64 {
    DEFAULT_SEQUENCE_TIMEOUT.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            leader: None,
            sequence_timeout_ms: default_sequence_timeout_ms(),
            initial_mode: Mode::default(),
            keymap: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "keychord")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Parse a config from TOML source.
pub fn parse(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse config")
}

/// Load the config at `path`, or from the default location.
///
/// An explicit path must exist. A missing default file yields
/// [`Config::default`].
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = default_config_path()?;
            if !p.exists() {
                tracing::debug!("No config at {}, using defaults", p.display());
                return Ok(Config::default());
            }
            p
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}
