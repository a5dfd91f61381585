//! Optional TOML configuration file.
//!
//! ```toml
//! [save]
//! dir = "/home/aurora/.local/share/aurora"
//!
//! [pacing]
//! scale = 1.0
//! transition_ms = 500
//! unlock_delay_ms = 1500
//!
//! [codes]
//! LUMOS = 1
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use aurora_core::{PhaseId, UnlockCodeTable};
use director::DirectorConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR: &str = "aurora";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuroraConfig {
    pub save: SaveConfig,
    pub pacing: PacingConfig,
    /// Card code to phase number; replaces the printed card set when present.
    pub codes: BTreeMap<String, u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub scale: f32,
    pub transition_ms: u64,
    pub unlock_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        let defaults = DirectorConfig::default();
        Self {
            scale: defaults.pace,
            transition_ms: defaults.transition.as_millis() as u64,
            unlock_delay_ms: defaults.unlock_delay.as_millis() as u64,
        }
    }
}

impl AuroraConfig {
    /// `<config_dir>/aurora/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration file")
    }

    /// Reads `path`, falling back to defaults when it is missing or malformed.
    pub async fn load_or_default(path: &Path) -> Self {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read configuration, using defaults");
                return Self::default();
            }
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed configuration, using defaults");
                Self::default()
            }
        }
    }

    pub fn with_save_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.save.dir = dir;
        }
        self
    }

    pub fn with_pace(mut self, pace: Option<f32>) -> Self {
        if let Some(pace) = pace {
            self.pacing.scale = pace;
        }
        self
    }

    /// Configured save directory, else `<data_dir>/aurora`, else `./.aurora`.
    pub fn save_dir(&self) -> PathBuf {
        self.save
            .dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".aurora"))
    }

    /// Director settings. A pace outside `0..=MAX_PACE` is ignored.
    pub fn director_config(&self) -> DirectorConfig {
        let defaults = DirectorConfig::default();
        let pace = if DirectorConfig::is_valid_pace(self.pacing.scale) {
            self.pacing.scale
        } else {
            warn!(
                pace = self.pacing.scale,
                max = DirectorConfig::MAX_PACE,
                "Pace out of range, using {}",
                defaults.pace
            );
            defaults.pace
        };
        defaults
            .with_pace(pace)
            .with_transition(Duration::from_millis(self.pacing.transition_ms))
            .with_unlock_delay(Duration::from_millis(self.pacing.unlock_delay_ms))
    }

    pub fn code_table(&self) -> Result<UnlockCodeTable> {
        if self.codes.is_empty() {
            return Ok(UnlockCodeTable::standard());
        }
        let pairs = self
            .codes
            .iter()
            .map(|(code, phase)| {
                PhaseId::new(*phase)
                    .map(|phase| (code.as_str(), phase))
                    .ok_or_else(|| anyhow!("Code {code} points at unknown phase {phase}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(UnlockCodeTable::from_pairs(pairs)?)
    }
}
