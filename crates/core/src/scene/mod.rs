use serde::{Deserialize, Serialize};

use crate::TimeRange;

/// Transition played when entering a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    #[default]
    Cut,
    Fade,
    Dissolve,
    Wipe,
}

impl TransitionKind {
    /// Lenient parse of planner output. Unknown names fall back to a cut.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fade" => Self::Fade,
            "dissolve" => Self::Dissolve,
            "wipe" => Self::Wipe,
            _ => Self::Cut,
        }
    }
}

/// Generation state of a scene's visual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    #[default]
    Pending,
    Generating,
    Success,
    Error,
}

/// Opaque handle owned by the external media pipeline. The timeline only
/// cares whether one is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One video scene placed on the audio timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub time_range: TimeRange,
    pub visual_description: String,
    pub audio_note: String,
    #[serde(default)]
    pub transition: TransitionKind,
    #[serde(default)]
    pub generated_media: Option<MediaRef>,
    #[serde(default)]
    pub status: SceneStatus,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub voiceover: Option<MediaRef>,
}

impl Scene {
    pub fn new(time_range: TimeRange, visual_description: impl Into<String>) -> Self {
        Self {
            time_range,
            visual_description: visual_description.into(),
            audio_note: String::new(),
            transition: TransitionKind::Cut,
            generated_media: None,
            status: SceneStatus::Pending,
            script: None,
            voiceover: None,
        }
    }

    pub fn start(&self) -> f64 {
        self.time_range.start
    }

    pub fn end(&self) -> f64 {
        self.time_range.end
    }

    pub fn duration(&self) -> f64 {
        self.time_range.duration()
    }

    pub fn has_media(&self) -> bool {
        self.generated_media.is_some()
    }
}

/// Scene descriptor as returned by an external planner. Every field may be
/// missing; [`crate::TimelineModel::normalize`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawScene {
    /// `"M:SS-M:SS"`.
    pub timestamp: Option<String>,
    pub visual: Option<String>,
    pub audio: Option<String>,
    pub transition: Option<String>,
    pub generated_media: Option<MediaRef>,
    pub script: Option<String>,
    pub voiceover: Option<MediaRef>,
}
