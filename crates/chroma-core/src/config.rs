//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid dimensions and hit-test geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of the grid, in cells
    pub width: i32,
    /// Height of the grid, in cells
    pub height: i32,
    /// Edge length of one cell, in pixels
    pub cell_size: u32,
}

impl GridConfig {
    /// Upper bound on `width * height`
    pub const MAX_CELLS: u64 = 1 << 20;

    /// Number of cells, or `None` if either side is non-positive or the
    /// product overflows
    pub fn cell_count(width: i32, height: i32) -> Option<usize> {
        if width <= 0 || height <= 0 {
            return None;
        }
        usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 8,
            cell_size: 40,
        }
    }
}

/// Timer cadence. Intervals are `numerator / green` milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub production_numerator: u64,
    pub movement_numerator: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            production_numerator: 255_000,
            movement_numerator: 122_500,
        }
    }
}

impl TimingConfig {
    pub fn production_interval_ms(&self, green: u8) -> u64 {
        interval_ms(self.production_numerator, green)
    }

    pub fn movement_interval_ms(&self, green: u8) -> u64 {
        interval_ms(self.movement_numerator, green)
    }
}

/// A zero channel would mean an infinite interval; it is treated as 1.
fn interval_ms(numerator: u64, channel: u8) -> u64 {
    (numerator / u64::from(channel.max(1))).max(1)
}

/// Which timer-driven behaviors are active
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Buildings produce units
    pub production: bool,
    /// Units wander
    pub movement: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            production: true,
            movement: true,
        }
    }
}

/// Tone requests raised when a unit is produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Frequency for a zero attack stat
    pub base_hz: f32,
    /// Added frequency per attack point
    pub hz_per_point: f32,
    pub duration_ms: u64,
    /// Immediate tones may overlap; queued ones are dropped while another plays
    pub immediate: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_hz: 220.0,
            hz_per_point: 2.0,
            duration_ms: 150,
            immediate: false,
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Random seed; a fresh one is drawn when unset
    pub seed: Option<u64>,
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub features: FeatureConfig,
    pub audio: AudioConfig,
    /// Emit population metrics every this many fired timers (0 disables)
    pub metrics_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            grid: GridConfig::default(),
            timing: TimingConfig::default(),
            features: FeatureConfig::default(),
            audio: AudioConfig::default(),
            metrics_every: 100,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid.width <= 0 || self.grid.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        let cells = u64::from(self.grid.width.unsigned_abs())
            * u64::from(self.grid.height.unsigned_abs());
        if cells > GridConfig::MAX_CELLS {
            return Err(Error::InvalidConfig(format!(
                "grid of {}x{} exceeds {} cells",
                self.grid.width,
                self.grid.height,
                GridConfig::MAX_CELLS
            )));
        }
        if self.grid.cell_size == 0 {
            return Err(Error::InvalidConfig("cell_size must be positive".to_string()));
        }
        if self.timing.production_numerator == 0 || self.timing.movement_numerator == 0 {
            return Err(Error::InvalidConfig(
                "timer numerators must be positive".to_string(),
            ));
        }
        if self.audio.enabled && self.audio.duration_ms == 0 {
            return Err(Error::InvalidConfig(
                "tone duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Headless host configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub sim: SimConfig,
    /// Wall-clock period between clock advances (0 uses the default)
    pub frame_ms: u64,
    /// Stop after this much wall-clock time (0 runs until interrupted)
    pub duration_ms: u64,
}

impl HostConfig {
    pub const DEFAULT_FRAME_MS: u64 = 50;

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: HostConfig = serde_json::from_str(&text)?;
        config.sim.validate()?;
        Ok(config)
    }

    pub fn frame_ms(&self) -> u64 {
        if self.frame_ms == 0 {
            Self::DEFAULT_FRAME_MS
        } else {
            self.frame_ms
        }
    }
}
