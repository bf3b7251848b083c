//! Backend-agnostic draw list for the timeline.
//!
//! [`render`] is a pure function of the current state. Whatever actually
//! draws (canvas, GPU surface, terminal) consumes the returned commands.

use serde::Serialize;

use crate::{
    Edge, EnergyLevel, InteractionConfig, InteractionState, SceneStatus, TickKind,
    TimelineModel, TransitionKind, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakKind {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandleEmphasis {
    Normal,
    Hovered,
    Active,
}

/// One drawing instruction in pixel space. `height` values are fractions of
/// the lane height.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    GridLine {
        x: f64,
        kind: TickKind,
    },
    EnergyBand {
        x0: f64,
        x1: f64,
        level: EnergyLevel,
    },
    EnergyBar {
        x: f64,
        width: f64,
        height: f32,
    },
    PeakMarker {
        x: f64,
        kind: PeakKind,
    },
    SceneBlock {
        index: usize,
        x0: f64,
        x1: f64,
        status: SceneStatus,
        transition: TransitionKind,
        label: String,
    },
    EdgeHandle {
        scene: usize,
        edge: Edge,
        x: f64,
        emphasis: HandleEmphasis,
    },
    Playhead {
        x: f64,
    },
}

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub model: &'a TimelineModel,
    pub viewport: &'a Viewport,
    pub interaction: InteractionState,
    pub config: &'a InteractionConfig,
    pub width_px: f64,
}

pub fn render(state: &RenderState<'_>) -> Vec<DrawCommand> {
    let viewport = state.viewport;
    let width = state.width_px;
    let (view_start, view_end) = (viewport.view_start(), viewport.view_end());
    let overlaps = |start: f64, end: f64| start <= view_end && end >= view_start;
    let x = |time: f64| viewport.time_to_pixel(time, width);

    let mut commands: Vec<DrawCommand> = viewport
        .ticks(
            width,
            state.config.frame_rate,
            state.config.frame_tick_pixels_per_second,
        )
        .into_iter()
        .map(|tick| DrawCommand::GridLine {
            x: x(tick.time),
            kind: tick.kind,
        })
        .collect();

    if let Some(analysis) = state.model.analysis() {
        commands.extend(
            analysis
                .segments
                .iter()
                .filter(|segment| overlaps(segment.start, segment.end))
                .map(|segment| DrawCommand::EnergyBand {
                    x0: x(segment.start),
                    x1: x(segment.end),
                    level: segment.energy_level,
                }),
        );

        let window = analysis.window_seconds;
        commands.extend(
            analysis
                .energy_curve
                .iter()
                .enumerate()
                .map(|(i, energy)| (i as f64 * window, energy))
                .filter(|(start, _)| overlaps(*start, *start + window))
                .map(|(start, energy)| {
                    let end = (start + window).min(analysis.duration);
                    DrawCommand::EnergyBar {
                        x: x(start),
                        width: x(end) - x(start),
                        height: *energy,
                    }
                }),
        );

        for (peaks, kind) in [
            (&analysis.primary_peaks, PeakKind::Primary),
            (&analysis.secondary_peaks, PeakKind::Secondary),
        ] {
            commands.extend(
                peaks
                    .iter()
                    .filter(|time| overlaps(**time, **time))
                    .map(|time| DrawCommand::PeakMarker { x: x(*time), kind }),
            );
        }
    }

    for (index, scene) in state.model.scenes().iter().enumerate() {
        if !overlaps(scene.start(), scene.end()) {
            continue;
        }

        commands.push(DrawCommand::SceneBlock {
            index,
            x0: x(scene.start()),
            x1: x(scene.end()),
            status: scene.status,
            transition: scene.transition,
            label: scene.visual_description.clone(),
        });
        for (edge, time) in [(Edge::Start, scene.start()), (Edge::End, scene.end())] {
            commands.push(DrawCommand::EdgeHandle {
                scene: index,
                edge,
                x: x(time),
                emphasis: emphasis(state.interaction, index, edge),
            });
        }
    }

    commands.push(DrawCommand::Playhead {
        x: x(viewport.current_time()),
    });
    commands
}

fn emphasis(interaction: InteractionState, index: usize, edge: Edge) -> HandleEmphasis {
    match interaction {
        InteractionState::Dragging { scene, edge: e } if scene == index && e == edge => {
            HandleEmphasis::Active
        }
        InteractionState::Hovering { scene, edge: e } if scene == index && e == edge => {
            HandleEmphasis::Hovered
        }
        _ => HandleEmphasis::Normal,
    }
}
