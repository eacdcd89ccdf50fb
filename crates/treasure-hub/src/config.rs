// ABOUTME: Hub configuration - data directory, timeouts, and grace periods
// ABOUTME: TOML at ~/.config/treasure-hub/hub.toml, XDG_CONFIG_HOME respected

use crate::escalate::GracePeriods;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hub configuration. CLI flags override the file; missing file means
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Root of the hunt store (`hunts/`, `hunt_log.txt`, symlink farm).
    pub data_dir: PathBuf,

    /// How long a dispatch waits for the monitor's response.
    pub dispatch_timeout_secs: u64,

    /// Grace after the `stop` command before SIGTERM.
    pub stop_grace_secs: u64,

    /// Grace after SIGTERM before SIGKILL.
    pub term_grace_secs: u64,

    /// Grace after SIGKILL before giving up on the reap.
    pub kill_grace_secs: u64,

    /// How long `calculate_score` waits for the score subprocess.
    pub score_timeout_secs: u64,

    /// Override the monitor executable. Defaults to the current executable
    /// in `monitor` mode; tests point this at scripted fake workers.
    pub monitor_program: Option<PathBuf>,

    /// Arguments for `monitor_program`. Only used with the override.
    pub monitor_args: Option<Vec<String>>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            dispatch_timeout_secs: 10,
            stop_grace_secs: 5,
            term_grace_secs: 2,
            kill_grace_secs: 2,
            score_timeout_secs: 10,
            monitor_program: None,
            monitor_args: None,
        }
    }
}

impl HubConfig {
    /// Default config file location: `$XDG_CONFIG_HOME/treasure-hub/hub.toml`,
    /// falling back to `~/.config/treasure-hub/hub.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("could not determine home directory")?
                .join(".config"),
        };
        Ok(config_dir.join("treasure-hub").join("hub.toml"))
    }

    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load from the given path (or the default location); a missing file
    /// yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn score_timeout(&self) -> Duration {
        Duration::from_secs(self.score_timeout_secs)
    }

    pub fn grace_periods(&self) -> GracePeriods {
        GracePeriods {
            stop: Duration::from_secs(self.stop_grace_secs),
            term: Duration::from_secs(self.term_grace_secs),
            kill: Duration::from_secs(self.kill_grace_secs),
        }
    }
}
