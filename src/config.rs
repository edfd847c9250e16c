//! Configuration for lazyslot.
//!
//! Loaded from YAML with a fallback chain:
//! 1. Explicit path if provided
//! 2. ~/.config/lazyslot/lazyslot.yml
//! 3. ./lazyslot.yml
//! 4. Default values

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{DEFAULT_DISPLAY_THRESHOLD, DEFAULT_FETCH_THRESHOLD, DEFAULT_UNLOAD_THRESHOLD, ZoneThresholds};
use crate::error::{LazySlotError, Result};
use crate::scheduler::SchedulerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Verbose scheduler logging (candidacy, transitions, skipped checks)
    pub debug: bool,
    pub zones: ZonesConfig,
    pub timing: TimingConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonesConfig {
    pub fetch_threshold: f64,
    pub display_threshold: f64,
    pub unload_threshold: f64,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            fetch_threshold: DEFAULT_FETCH_THRESHOLD,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            unload_threshold: DEFAULT_UNLOAD_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub throttle_interval_ms: u64,
    pub unload_stability_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 67,
            unload_stability_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Time between two simulated layout passes
    pub frame_interval_ms: u64,
    /// Scroll distance per second
    pub scroll_speed: f64,
    pub articles: usize,
    /// Insert an ad slot after every this many articles
    pub ad_every: usize,
    pub ad_height: f64,
    /// Pause at the bottom before scrolling back up
    pub dwell_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            viewport_height: 844.0,
            frame_interval_ms: 16,
            scroll_speed: 1500.0,
            articles: 24,
            ad_every: 3,
            ad_height: 320.0,
            dwell_ms: 2500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            debug: false,
            zones: ZonesConfig::default(),
            timing: TimingConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Effective log filter: `debug` wins over `log_level`.
    pub fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or("info")
        }
    }

    /// Parse the effective log filter as a level.
    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        self.log_filter()
            .parse::<LevelFilter>()
            .map_err(|_| LazySlotError::InvalidConfig(format!("unknown log level: {}", self.log_filter())))
    }

    pub fn thresholds(&self) -> Result<ZoneThresholds> {
        ZoneThresholds::new(
            self.zones.fetch_threshold,
            self.zones.display_threshold,
            self.zones.unload_threshold,
        )
    }

    /// Validate and build the scheduler configuration.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        if self.timing.throttle_interval_ms == 0 {
            return Err(LazySlotError::InvalidConfig(
                "timing.throttle_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(SchedulerConfig::default()
            .with_thresholds(self.thresholds()?)
            .with_throttle_interval(Duration::from_millis(self.timing.throttle_interval_ms))
            .with_unload_stability_delay(Duration::from_millis(self.timing.unload_stability_delay_ms)))
    }
}
