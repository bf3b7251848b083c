//! Seams towards the external scene planner and media pipeline.

use tracing::debug;

use crate::{AudioAnalysisResult, EnergyLevel, MediaRef, RawScene, Result, Scene, TimeRange};

/// Turns an analysed track into an initial list of scene descriptors.
pub trait ScenePlanner {
    fn plan(&self, analysis: &AudioAnalysisResult) -> Result<Vec<RawScene>>;
}

/// Renders the visual for one scene and hands back an opaque handle.
pub trait MediaGenerator {
    fn generate(&self, scene: &Scene) -> Result<MediaRef>;
}

/// Planner that cuts the track along its energy segments.
///
/// Segments shorter than `min_scene_seconds` are folded into the preceding
/// scene and long segments are chunked into pieces of at most
/// `max_scene_seconds`.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPlanner {
    pub min_scene_seconds: f64,
    pub max_scene_seconds: f64,
}

impl Default for SegmentPlanner {
    fn default() -> Self {
        Self {
            min_scene_seconds: 1.0,
            max_scene_seconds: 8.0,
        }
    }
}

impl ScenePlanner for SegmentPlanner {
    fn plan(&self, analysis: &AudioAnalysisResult) -> Result<Vec<RawScene>> {
        let mut spans: Vec<(TimeRange, EnergyLevel)> = Vec::new();
        for segment in &analysis.segments {
            if segment.duration() < self.min_scene_seconds {
                if let Some((range, _)) = spans.last_mut() {
                    range.end = segment.end;
                    continue;
                }
            }
            spans.push((TimeRange::new(segment.start, segment.end), segment.energy_level));
        }

        let max = self.max_scene_seconds.max(self.min_scene_seconds);
        let mut scenes = Vec::new();
        for (range, level) in spans {
            let pieces = (range.duration() / max).ceil().max(1.0) as usize;
            let step = range.duration() / pieces as f64;
            for piece in 0..pieces {
                let start = range.start + step * piece as f64;
                let end = if piece + 1 == pieces {
                    range.end
                } else {
                    start + step
                };
                scenes.push(RawScene {
                    timestamp: Some(TimeRange::new(start, end).to_timestamp()),
                    visual: Some(describe(level).to_string()),
                    audio: Some(format!("{level:?} energy")),
                    transition: Some(transition_for(level).to_string()),
                    ..Default::default()
                });
            }
        }

        debug!(scenes = scenes.len(), "segment plan ready");
        Ok(scenes)
    }
}

fn describe(level: EnergyLevel) -> &'static str {
    match level {
        EnergyLevel::Low => "slow ambient shot",
        EnergyLevel::Build => "rising motion shot",
        EnergyLevel::High => "fast cut action shot",
    }
}

fn transition_for(level: EnergyLevel) -> &'static str {
    match level {
        EnergyLevel::Low => "fade",
        EnergyLevel::Build => "dissolve",
        EnergyLevel::High => "cut",
    }
}
