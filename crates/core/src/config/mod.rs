use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub timeline: EditConfig,
    pub interaction: InteractionConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections and fields fall back
    /// to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Thresholds of a single peak detection band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakBandConfig {
    /// Cutoff of the band filter in Hz.
    pub cutoff_hz: f32,
    /// Absolute RMS a window must exceed to count as a peak.
    pub threshold: f32,
    /// Minimum RMS rise over the previous window.
    pub decay: f32,
}

/// Configuration of the offline audio analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window_seconds: f64,
    pub bass: PeakBandConfig,
    pub treble: PeakBandConfig,
    /// Windows above `high_ratio * avg` classify as High.
    pub high_ratio: f32,
    /// Windows above `build_ratio * avg` classify as Build.
    pub build_ratio: f32,
    /// Entering High above this normalized energy skips the debounce.
    pub drop_energy: f32,
    pub debounce_windows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.1,
            bass: PeakBandConfig {
                cutoff_hz: 150.0,
                threshold: 0.10,
                decay: 0.05,
            },
            treble: PeakBandConfig {
                cutoff_hz: 2_500.0,
                threshold: 0.05,
                decay: 0.02,
            },
            high_ratio: 1.3,
            build_ratio: 0.9,
            drop_energy: 0.8,
            debounce_windows: 3,
        }
    }
}

/// Constraints applied by the timeline edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    pub min_scene_seconds: f64,
    /// Distance from either scene edge inside which splits are ignored.
    pub split_guard_seconds: f64,
    pub snap_seconds: f64,
    /// Length of the fallback window used when a scene carries no timestamp.
    pub default_scene_seconds: f64,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            min_scene_seconds: 1.0,
            split_guard_seconds: 0.5,
            snap_seconds: 0.2,
            default_scene_seconds: 8.0,
        }
    }
}

/// Pointer and grid settings of the interactive timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub edge_threshold_px: f64,
    pub frame_rate: f64,
    /// Scrubbing snaps to frames above this zoom level.
    pub frame_snap_zoom: f64,
    /// Frame ticks are drawn above this density.
    pub frame_tick_pixels_per_second: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: 8.0,
            frame_rate: 30.0,
            frame_snap_zoom: 10.0,
            frame_tick_pixels_per_second: 150.0,
        }
    }
}
