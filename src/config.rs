//! Configuration loading for SortBot.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.sortbot/config.toml`)
//! 3. User config (`~/.sortbot/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The game runs with the classic settings
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::ItemKind;
use crate::error::{Result, SortError};

/// Main configuration struct for SortBot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Training session configuration.
    pub training: TrainingConfig,
    /// Trial configuration.
    pub trial: TrialConfig,
    /// Robot movement configuration.
    pub robot: RobotConfig,
    /// Arena geometry and simulation rate.
    pub arena: ArenaConfig,
    /// Seed for every random choice. Unset means a fresh seed per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Training session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labels to collect before the trial starts.
    pub samples_required: usize,
    /// Whether finished training is saved for the next run.
    pub persist: bool,
    /// Key the training snapshot is stored under.
    pub snapshot_key: String,
}

impl TrainingConfig {
    /// Check if a sample count can cover every item kind.
    pub fn is_valid_samples_required(value: usize) -> bool {
        value >= ItemKind::ALL.len()
    }

    /// Check if a key is usable as a bare file name.
    pub fn is_valid_snapshot_key(key: &str) -> bool {
        !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..")
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples_required: 10,
            persist: true,
            snapshot_key: "training".to_string(),
        }
    }
}

/// Trial configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrialConfig {
    /// Items spawned per trial.
    pub batch_size: u32,
}

impl TrialConfig {
    /// Check if a batch size is usable.
    pub fn is_valid_batch_size(value: u32) -> bool {
        value >= 1
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self { batch_size: 5 }
    }
}

/// Robot movement configuration, in world units per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RobotConfig {
    /// Speed when walking to an item.
    pub speed: f32,
    /// Speed when carrying an item, and the speed the item trails at.
    pub carry_speed: f32,
}

impl RobotConfig {
    /// Check if a speed is usable.
    pub fn is_valid_speed(value: f32) -> bool {
        value.is_finite() && value > 0.0
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            speed: 50.0,
            carry_speed: 30.0,
        }
    }
}

/// Arena geometry and simulation rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: u32,
    pub height: u32,
    /// Distance at which two entities are in contact.
    pub contact_radius: f32,
    /// Simulation ticks per second.
    pub tick_rate: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            contact_radius: 6.0,
            tick_rate: 30,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.sortbot/config.toml` in cwd)
    /// 3. User config (`~/.sortbot/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        // Layer 4 → 3: Apply user config
        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        // Layer 3 → 2: Apply project config
        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        // Layer 2 → 1: Apply environment variables
        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.sortbot/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = sortbot_home()?.join("config.toml");
        Self::load_optional(&path)
    }

    /// Load project config from `.sortbot/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&project_config_path(cwd))
    }

    /// Load a config file that may be absent. A present but unreadable file
    /// is reported and skipped.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring config at {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| SortError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| SortError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // SORTBOT_SAMPLES
        if let Ok(val) = env::var("SORTBOT_SAMPLES") {
            match val.parse::<usize>() {
                Ok(n) if TrainingConfig::is_valid_samples_required(n) => {
                    self.training.samples_required = n;
                }
                Ok(n) => eprintln!(
                    "Warning: Invalid SORTBOT_SAMPLES value '{}'. \
                    Must be >= {}. Using '{}'.",
                    n,
                    ItemKind::ALL.len(),
                    self.training.samples_required
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid SORTBOT_SAMPLES value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.training.samples_required
                ),
            }
        }

        // SORTBOT_BATCH_SIZE
        if let Ok(val) = env::var("SORTBOT_BATCH_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if TrialConfig::is_valid_batch_size(n) => self.trial.batch_size = n,
                _ => eprintln!(
                    "Warning: Invalid SORTBOT_BATCH_SIZE value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.trial.batch_size
                ),
            }
        }

        // SORTBOT_ROBOT_SPEED
        if let Ok(val) = env::var("SORTBOT_ROBOT_SPEED") {
            match val.parse::<f32>() {
                Ok(v) if RobotConfig::is_valid_speed(v) => self.robot.speed = v,
                _ => eprintln!(
                    "Warning: Invalid SORTBOT_ROBOT_SPEED value '{}'. \
                    Expected a positive number. Using '{}'.",
                    val, self.robot.speed
                ),
            }
        }

        // SORTBOT_CARRY_SPEED
        if let Ok(val) = env::var("SORTBOT_CARRY_SPEED") {
            match val.parse::<f32>() {
                Ok(v) if RobotConfig::is_valid_speed(v) => self.robot.carry_speed = v,
                _ => eprintln!(
                    "Warning: Invalid SORTBOT_CARRY_SPEED value '{}'. \
                    Expected a positive number. Using '{}'.",
                    val, self.robot.carry_speed
                ),
            }
        }

        // SORTBOT_SEED
        if let Ok(val) = env::var("SORTBOT_SEED") {
            match val.parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => eprintln!(
                    "Warning: Invalid SORTBOT_SEED value '{}'. \
                    Expected an unsigned integer. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Values from `other` take precedence if they differ from defaults.
    /// A layer that explicitly sets a field to its default value cannot
    /// override a non-default value from a lower layer, because "unset" and
    /// "set to default" look the same after deserialization.
    fn merge(mut self, other: Config) -> Self {
        let default_training = TrainingConfig::default();
        if other.training.samples_required != default_training.samples_required {
            self.training.samples_required = other.training.samples_required;
        }
        if other.training.persist != default_training.persist {
            self.training.persist = other.training.persist;
        }
        if other.training.snapshot_key != default_training.snapshot_key {
            self.training.snapshot_key = other.training.snapshot_key;
        }

        if other.trial.batch_size != TrialConfig::default().batch_size {
            self.trial.batch_size = other.trial.batch_size;
        }

        let default_robot = RobotConfig::default();
        if other.robot.speed != default_robot.speed {
            self.robot.speed = other.robot.speed;
        }
        if other.robot.carry_speed != default_robot.carry_speed {
            self.robot.carry_speed = other.robot.carry_speed;
        }

        let default_arena = ArenaConfig::default();
        if other.arena.width != default_arena.width {
            self.arena.width = other.arena.width;
        }
        if other.arena.height != default_arena.height {
            self.arena.height = other.arena.height;
        }
        if other.arena.contact_radius != default_arena.contact_radius {
            self.arena.contact_radius = other.arena.contact_radius;
        }
        if other.arena.tick_rate != default_arena.tick_rate {
            self.arena.tick_rate = other.arena.tick_rate;
        }

        if other.seed.is_some() {
            self.seed = other.seed;
        }

        self
    }

    /// Check values that came from files or flags.
    ///
    /// Environment values are checked as they are read; this catches the
    /// rest before a game starts.
    pub fn validate(&self) -> Result<()> {
        if !TrainingConfig::is_valid_samples_required(self.training.samples_required) {
            return Err(SortError::config(format!(
                "training.samples_required must be at least {}, got {}",
                ItemKind::ALL.len(),
                self.training.samples_required
            )));
        }
        if !TrainingConfig::is_valid_snapshot_key(&self.training.snapshot_key) {
            return Err(SortError::config(format!(
                "training.snapshot_key must be a non-empty name without path separators, got '{}'",
                self.training.snapshot_key
            )));
        }
        if !TrialConfig::is_valid_batch_size(self.trial.batch_size) {
            return Err(SortError::config("trial.batch_size must be at least 1"));
        }
        if !RobotConfig::is_valid_speed(self.robot.speed) {
            return Err(SortError::config(format!(
                "robot.speed must be a positive number, got {}",
                self.robot.speed
            )));
        }
        if !RobotConfig::is_valid_speed(self.robot.carry_speed) {
            return Err(SortError::config(format!(
                "robot.carry_speed must be a positive number, got {}",
                self.robot.carry_speed
            )));
        }
        if !(self.arena.contact_radius.is_finite() && self.arena.contact_radius > 0.0) {
            return Err(SortError::config("arena.contact_radius must be positive"));
        }
        if self.arena.tick_rate == 0 {
            return Err(SortError::config("arena.tick_rate must be at least 1"));
        }
        Ok(())
    }
}

/// Get the SortBot home directory.
///
/// Returns `$SORTBOT_HOME` if set and non-empty, otherwise `~/.sortbot`.
/// Relative `SORTBOT_HOME` values are canonicalized when they exist.
pub fn sortbot_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SORTBOT_HOME") {
        if home.is_empty() {
            tracing::warn!("SORTBOT_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SORTBOT_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".sortbot"));
    }

    let fallback = env::temp_dir().join("sortbot");
    tracing::warn!("HOME not set, using fallback location: {}", fallback.display());
    Some(fallback)
}

/// Get the snapshots directory.
///
/// Returns `<sortbot_home>/snapshots/`.
pub fn snapshots_dir() -> Option<PathBuf> {
    sortbot_home().map(|h| h.join("snapshots"))
}

/// Get the crash log path.
///
/// Returns `<sortbot_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    sortbot_home().map(|h| h.join("crash.log"))
}

/// Get the project config path for a working directory.
///
/// Returns `<cwd>/.sortbot/config.toml`.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(".sortbot").join("config.toml")
}
