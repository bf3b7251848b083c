//! Ordered scene sequence edited against the audio timeline.

mod range;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use range::TimeRange;

use crate::{
    AudioAnalysisResult, EditConfig, MediaGenerator, MediaRef, RawScene, Result, Scene,
    SceneStatus, TransitionKind,
};

/// Which boundary of a scene an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Start,
    End,
}

/// Why an edit left the model untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRejection {
    IndexOutOfRange,
    InvalidTime,
    /// The split point was within the guard band of a scene edge.
    InsideSplitGuard,
}

/// What actually happened to a requested edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// The request was applied literally.
    Applied,
    /// The requested time violated the minimum span and was moved.
    Clamped { requested: f64, applied: f64 },
    /// The edited edge landed close to its neighbor and was aligned with it.
    Snapped { requested: f64, applied: f64 },
    Rejected(EditRejection),
}

impl EditOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Exclusive owner of the scene sequence and the analysis it was planned on.
///
/// All edits are synchronous and never produce an invalid scene: requests that
/// would are clamped, snapped or rejected, and the returned [`EditOutcome`]
/// says which.
#[derive(Debug, Clone, Default)]
pub struct TimelineModel {
    scenes: Vec<Scene>,
    analysis: Option<Arc<AudioAnalysisResult>>,
    config: EditConfig,
}

impl TimelineModel {
    pub fn new(config: EditConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn analysis(&self) -> Option<&AudioAnalysisResult> {
        self.analysis.as_deref()
    }

    pub fn set_analysis(&mut self, analysis: Arc<AudioAnalysisResult>) {
        self.analysis = Some(analysis);
    }

    /// Audio duration, or the furthest scene end when that is later.
    pub fn duration(&self) -> f64 {
        let audio = self.analysis.as_ref().map_or(0.0, |a| a.duration);
        self.scenes.iter().map(Scene::end).fold(audio, f64::max)
    }

    /// Turns planner output into scenes that satisfy the model invariants.
    ///
    /// Missing or unparseable timestamps fall back to consecutive default
    /// windows by position, spans shorter than the minimum are extended, and
    /// the status follows media presence. The result is sorted by start.
    pub fn normalize(&self, raw: Vec<RawScene>) -> Vec<Scene> {
        let window = self.config.default_scene_seconds;
        let min = self.config.min_scene_seconds;

        let mut scenes: Vec<Scene> = raw
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let fallback = TimeRange::new(index as f64 * window, (index + 1) as f64 * window);
                let mut time_range = match raw.timestamp.as_deref().map(TimeRange::parse) {
                    Some(parsed) if parsed.is_valid() => parsed,
                    Some(_) => {
                        warn!(index, timestamp = ?raw.timestamp, "unparseable scene timestamp");
                        fallback
                    }
                    None => fallback,
                };
                if time_range.duration() < min {
                    time_range.end = time_range.start + min;
                }

                let status = if raw.generated_media.is_some() {
                    SceneStatus::Success
                } else {
                    SceneStatus::Pending
                };

                Scene {
                    time_range,
                    visual_description: raw.visual.unwrap_or_default(),
                    audio_note: raw.audio.unwrap_or_default(),
                    transition: raw
                        .transition
                        .as_deref()
                        .map(TransitionKind::parse_lenient)
                        .unwrap_or_default(),
                    generated_media: raw.generated_media,
                    status,
                    script: raw.script,
                    voiceover: raw.voiceover,
                }
            })
            .collect();

        scenes.sort_by(|a, b| a.start().total_cmp(&b.start()));
        scenes
    }

    /// Normalizes planner output and replaces the current sequence with it.
    pub fn load_raw(&mut self, raw: Vec<RawScene>) {
        self.scenes = self.normalize(raw);
        debug!(scenes = self.scenes.len(), "timeline loaded");
    }

    pub fn set_scenes(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
    }

    /// Index of the scene whose range contains `time`.
    pub fn scene_at(&self, time: f64) -> Option<usize> {
        self.scenes
            .iter()
            .position(|scene| scene.time_range.contains(time))
    }

    /// Splits scene `index` at `at`.
    ///
    /// The first half keeps everything but its end. The second half inherits
    /// the description and metadata but loses its media, since the visual
    /// has to be regenerated for the shorter range.
    pub fn split(&mut self, index: usize, at: f64) -> EditOutcome {
        let Some(scene) = self.scenes.get(index) else {
            warn!(index, "split rejected: no such scene");
            return EditOutcome::Rejected(EditRejection::IndexOutOfRange);
        };

        let guard = self.config.split_guard_seconds;
        if !(at > scene.start() + guard && at < scene.end() - guard) {
            debug!(index, at, start = scene.start(), end = scene.end(), "split ignored");
            return EditOutcome::Rejected(EditRejection::InsideSplitGuard);
        }

        let mut second = scene.clone();
        second.time_range.start = at;
        second.generated_media = None;
        second.status = SceneStatus::Pending;

        self.scenes[index].time_range.end = at;
        self.scenes.insert(index + 1, second);
        debug!(index, at, scenes = self.scenes.len(), "split accepted");
        EditOutcome::Applied
    }

    /// Moves one edge of scene `index` to `new_time`.
    ///
    /// The edge is clamped so the scene keeps the minimum span, and a start
    /// never goes below zero; a scene too short for both grows at its end.
    /// When the
    /// result lands within the snap distance of the neighbor's facing edge
    /// (previous end for a start, next start for an end) it is aligned with
    /// that edge exactly, as long as the minimum span still holds.
    pub fn resize(&mut self, index: usize, edge: Edge, new_time: f64) -> EditOutcome {
        if !new_time.is_finite() {
            warn!(index, ?edge, "resize rejected: non-finite time");
            return EditOutcome::Rejected(EditRejection::InvalidTime);
        }
        let Some(scene) = self.scenes.get(index) else {
            warn!(index, ?edge, "resize rejected: no such scene");
            return EditOutcome::Rejected(EditRejection::IndexOutOfRange);
        };

        let min = self.config.min_scene_seconds;
        let (start, end) = (scene.start(), scene.end());
        let (clamped, neighbor, lower, upper) = match edge {
            Edge::Start => (
                new_time.min(end - min).max(0.0),
                index.checked_sub(1).map(|prev| self.scenes[prev].end()),
                0.0,
                end - min,
            ),
            Edge::End => (
                new_time.max(start + min),
                self.scenes.get(index + 1).map(Scene::start),
                start + min,
                f64::INFINITY,
            ),
        };

        let snapped = neighbor.filter(|boundary| {
            (boundary - clamped).abs() <= self.config.snap_seconds
                && (lower..=upper).contains(boundary)
        });
        let applied = snapped.unwrap_or(clamped);

        let range = &mut self.scenes[index].time_range;
        let mut extended = false;
        match edge {
            Edge::Start => {
                range.start = applied;
                // A scene already shorter than the minimum cannot keep its end.
                if applied > range.end - min {
                    range.end = applied + min;
                    extended = true;
                }
            }
            Edge::End => range.end = applied,
        }

        debug!(index, ?edge, requested = new_time, applied, extended, "resize accepted");
        if snapped.is_some() {
            EditOutcome::Snapped {
                requested: new_time,
                applied,
            }
        } else if extended || applied != new_time {
            EditOutcome::Clamped {
                requested: new_time,
                applied,
            }
        } else {
            EditOutcome::Applied
        }
    }

    /// Moves a scene to another position. Time ranges are left untouched, so
    /// the sequence may stop being ordered by time; see
    /// [`TimelineModel::is_time_ordered`] and [`TimelineModel::retime`].
    pub fn reorder(&mut self, from: usize, to: usize) -> EditOutcome {
        if from >= self.scenes.len() || to >= self.scenes.len() {
            warn!(from, to, "reorder rejected: no such scene");
            return EditOutcome::Rejected(EditRejection::IndexOutOfRange);
        }

        let scene = self.scenes.remove(from);
        self.scenes.insert(to, scene);
        debug!(from, to, "reorder accepted");
        EditOutcome::Applied
    }

    /// Removes a scene. Neighbors keep their ranges.
    pub fn delete(&mut self, index: usize) -> Option<Scene> {
        if index >= self.scenes.len() {
            warn!(index, "delete rejected: no such scene");
            return None;
        }

        let removed = self.scenes.remove(index);
        debug!(index, scenes = self.scenes.len(), "delete accepted");
        Some(removed)
    }

    /// Whether sequence order agrees with start times.
    pub fn is_time_ordered(&self) -> bool {
        self.scenes
            .windows(2)
            .all(|pair| pair[0].start() <= pair[1].start())
    }

    /// Lays the scenes out back to back from zero in their current order,
    /// keeping each scene's span.
    pub fn retime(&mut self) {
        let mut cursor = 0.0;
        for scene in &mut self.scenes {
            let span = scene.duration();
            scene.time_range = TimeRange::new(cursor, cursor + span);
            cursor += span;
        }
    }

    pub fn set_visual_description(&mut self, index: usize, text: impl Into<String>) -> EditOutcome {
        self.edit(index, |scene| scene.visual_description = text.into())
    }

    pub fn set_audio_note(&mut self, index: usize, text: impl Into<String>) -> EditOutcome {
        self.edit(index, |scene| scene.audio_note = text.into())
    }

    pub fn set_transition(&mut self, index: usize, transition: TransitionKind) -> EditOutcome {
        self.edit(index, |scene| scene.transition = transition)
    }

    pub fn set_script(&mut self, index: usize, script: Option<String>) -> EditOutcome {
        self.edit(index, |scene| scene.script = script)
    }

    pub fn set_voiceover(&mut self, index: usize, voiceover: Option<MediaRef>) -> EditOutcome {
        self.edit(index, |scene| scene.voiceover = voiceover)
    }

    pub fn mark_generating(&mut self, index: usize) -> EditOutcome {
        self.edit(index, |scene| scene.status = SceneStatus::Generating)
    }

    /// Stores the media pipeline's answer for one scene.
    pub fn record_generation(&mut self, index: usize, result: Result<MediaRef>) -> EditOutcome {
        self.edit(index, |scene| match result {
            Ok(media) => {
                scene.generated_media = Some(media);
                scene.status = SceneStatus::Success;
            }
            Err(err) => {
                warn!(index, error = %err, "scene generation failed");
                scene.status = SceneStatus::Error;
            }
        })
    }

    /// Runs every pending scene through `generator`. Returns how many scenes
    /// received media.
    pub fn generate_pending(&mut self, generator: &dyn MediaGenerator) -> usize {
        let pending: Vec<usize> = self
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, scene)| scene.status == SceneStatus::Pending)
            .map(|(index, _)| index)
            .collect();

        let mut generated = 0;
        for index in pending {
            self.mark_generating(index);
            let result = generator.generate(&self.scenes[index]);
            if result.is_ok() {
                generated += 1;
            }
            self.record_generation(index, result);
        }
        generated
    }

    fn edit(&mut self, index: usize, apply: impl FnOnce(&mut Scene)) -> EditOutcome {
        match self.scenes.get_mut(index) {
            Some(scene) => {
                apply(scene);
                EditOutcome::Applied
            }
            None => EditOutcome::Rejected(EditRejection::IndexOutOfRange),
        }
    }
}
