//! Configuration for the engine, the file store, and the HTTP server.
//!
//! Settings load from a TOML file. Every field carries a serde default, so an
//! empty file (or no file at all) yields [`Settings::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Steel density in kg/m³.
pub const DEFAULT_DENSITY: f64 = 7860.0;
/// Lookback window for the live status of a machine.
pub const DEFAULT_LIVE_LOOKBACK_MINUTES: i64 = 15;
/// Upper bound on the live-status lookback (one leap year).
pub const MAX_LIVE_LOOKBACK_MINUTES: i64 = 366 * 24 * 60;
/// Below this fraction of target speed a running machine counts as reduced speed.
pub const DEFAULT_REDUCED_SPEED_RATIO: f64 = 0.5;

// ---------------------------------------------------------------------------
// Telemetry attribute names
// ---------------------------------------------------------------------------

/// Names of the sample attributes the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryKeys {
    /// Machine status: `0` stopped, `1` running.
    pub status: String,
    /// Instantaneous speed used by the status classifier.
    pub actual_speed: String,
    /// Speed set-point used by the status classifier.
    pub target_speed: String,
    /// Line speed in length units per minute.
    pub line_speed: String,
    /// Material diameter in millimetres.
    pub diameter: String,
    /// Running production total that resets every device month.
    pub month_production: String,
    /// Reel-change indicator toggling between `0` and `1`.
    pub reel_change: String,
}

impl Default for TelemetryKeys {
    fn default() -> Self {
        Self {
            status: "MC_STATUS".to_string(),
            actual_speed: "Act Speed".to_string(),
            target_speed: "Target Speed".to_string(),
            line_speed: "LINE_SPEED".to_string(),
            diameter: "ACT_COLD_DIA".to_string(),
            month_production: "This Month Production".to_string(),
            reel_change: "P_DT_BOBIN_FORMER_CHANGE".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// How the target weight picks a diameter when a window holds several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterPolicy {
    /// Chronologically first diameter observed in the window.
    #[default]
    First,
    /// Evaluate the target formula once per distinct diameter and sum.
    SumDistinct,
}

impl std::fmt::Display for DiameterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::SumDistinct => write!(f, "sum_distinct"),
        }
    }
}

impl std::str::FromStr for DiameterPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(Self::First),
            "sum_distinct" | "sum-distinct" => Ok(Self::SumDistinct),
            other => Err(EngineError::InvalidInput(format!(
                "unknown diameter policy '{other}' (expected first or sum_distinct)"
            ))),
        }
    }
}

/// Tunables of the KPI computations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub density: f64,
    pub live_lookback_minutes: i64,
    pub reduced_speed_ratio: f64,
    pub diameter_policy: DiameterPolicy,
    pub keys: TelemetryKeys,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            live_lookback_minutes: DEFAULT_LIVE_LOOKBACK_MINUTES,
            reduced_speed_ratio: DEFAULT_REDUCED_SPEED_RATIO,
            diameter_policy: DiameterPolicy::default(),
            keys: TelemetryKeys::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values the formulas cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        if !(1..=MAX_LIVE_LOOKBACK_MINUTES).contains(&self.live_lookback_minutes) {
            return Err(EngineError::InvalidInput(format!(
                "live_lookback_minutes must be within [1, {MAX_LIVE_LOOKBACK_MINUTES}], got {}",
                self.live_lookback_minutes
            )));
        }
        if !(0.0..=1.0).contains(&self.reduced_speed_ratio) {
            return Err(EngineError::InvalidInput(format!(
                "reduced_speed_ratio must be within [0, 1], got {}",
                self.reduced_speed_ratio
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store and server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `machines.json` and `samples.jsonl`.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a single KPI request, store reads included.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8043,
            request_timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidInput(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
