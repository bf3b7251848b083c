//! Core library for the scene timeline engine.
//!
//! The crate analyses an audio track (energy curve, energy segments, bass and
//! treble transients) and maintains the ordered list of video scenes that is
//! edited against it. Each module owns one subsystem; the drawing backend,
//! scene planner and media pipeline stay outside and talk to it through plain
//! data and the traits in [`planner`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod interaction;
pub mod planner;
pub mod render;
pub mod scene;
pub mod timeline;
pub mod viewport;

pub use analysis::{AudioAnalysisResult, AudioAnalyzer, EnergyLevel, EnergySegment};
pub use audio::{AnalysisOutcome, AudioBuffer, AudioEngine};
pub use config::{AnalysisConfig, AppConfig, EditConfig, InteractionConfig};
pub use error::{Result, TimelineError};
pub use interaction::{EdgeHit, InteractionController, InteractionEffect, InteractionState};
pub use planner::{MediaGenerator, ScenePlanner, SegmentPlanner};
pub use render::{render, DrawCommand, RenderState};
pub use scene::{MediaRef, RawScene, Scene, SceneStatus, TransitionKind};
pub use timeline::{Edge, EditOutcome, EditRejection, TimeRange, TimelineModel};
pub use viewport::{Tick, TickKind, Viewport};
