//! Client configuration at `~/.ttt/config.toml`.
//!
//! Provides the receiver URL, namespace, player name and layout delay.
//! CLI flags always override config file values.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ttt_core::messages::TTT_NAMESPACE;
use ttt_sender::ControllerConfig;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Receiver connection settings.
    #[serde(default)]
    pub receiver: ReceiverConfig,
}

/// Receiver connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Receiver WebSocket URL (empty = none).
    #[serde(default)]
    pub url: String,

    /// Namespace the game messages travel on.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Name sent when joining a game.
    #[serde(default = "default_player_name")]
    pub player_name: String,

    /// Delay before the first layout request on a new session.
    #[serde(default = "default_layout_delay_ms")]
    pub layout_delay_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            namespace: default_namespace(),
            player_name: default_player_name(),
            layout_delay_ms: default_layout_delay_ms(),
        }
    }
}

fn default_namespace() -> String {
    TTT_NAMESPACE.to_string()
}

fn default_player_name() -> String {
    "web player".to_string()
}

fn default_layout_delay_ms() -> u64 {
    250
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

impl ReceiverConfig {
    /// Controller settings for this receiver.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            namespace: self.namespace.clone(),
            player_name: self.player_name.clone(),
            layout_delay: Duration::from_millis(self.layout_delay_ms),
        }
    }
}
