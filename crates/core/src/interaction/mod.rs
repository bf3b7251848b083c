//! Pointer state machine for editing scene edges and scrubbing the playhead.

use tracing::debug;

use crate::{Edge, EditOutcome, InteractionConfig, TimelineModel, Viewport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering {
        scene: usize,
        edge: Edge,
    },
    Dragging {
        scene: usize,
        edge: Edge,
    },
    Scrubbing,
}

/// Scene edge found under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    pub scene: usize,
    pub edge: Edge,
    /// Distance from the pointer in seconds.
    pub distance: f64,
}

/// Side effect the caller has to carry out after a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEffect {
    None,
    /// Move the playhead here.
    Seek(f64),
    /// A scene edge was moved; the model already reflects it.
    Resized {
        scene: usize,
        edge: Edge,
        outcome: EditOutcome,
    },
}

/// Owns the interaction state; the model and viewport are passed in on every
/// event so there is a single writer for each.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
    config: InteractionConfig,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            config,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Nearest scene edge within the pixel threshold of `x`. On a shared
    /// boundary the earlier scene wins.
    pub fn hit_test(
        &self,
        model: &TimelineModel,
        viewport: &Viewport,
        x: f64,
        width_px: f64,
    ) -> Option<EdgeHit> {
        let time = viewport.pixel_to_time(x, width_px);
        let threshold = viewport.pixels_to_seconds(self.config.edge_threshold_px, width_px);

        let mut best: Option<EdgeHit> = None;
        for (scene, candidate) in model.scenes().iter().enumerate() {
            for (edge, boundary) in [(Edge::Start, candidate.start()), (Edge::End, candidate.end())] {
                let distance = (time - boundary).abs();
                if distance > threshold {
                    continue;
                }
                if best.map_or(true, |hit| distance < hit.distance) {
                    best = Some(EdgeHit {
                        scene,
                        edge,
                        distance,
                    });
                }
            }
        }
        best
    }

    pub fn pointer_move(
        &mut self,
        model: &mut TimelineModel,
        viewport: &Viewport,
        x: f64,
        width_px: f64,
    ) -> InteractionEffect {
        match self.state {
            InteractionState::Dragging { scene, edge } => {
                let time = viewport.pixel_to_time(x, width_px);
                let outcome = model.resize(scene, edge, time);
                InteractionEffect::Resized {
                    scene,
                    edge,
                    outcome,
                }
            }
            InteractionState::Scrubbing => {
                InteractionEffect::Seek(self.scrub_time(viewport, x, width_px))
            }
            InteractionState::Idle | InteractionState::Hovering { .. } => {
                self.state = match self.hit_test(model, viewport, x, width_px) {
                    Some(hit) => InteractionState::Hovering {
                        scene: hit.scene,
                        edge: hit.edge,
                    },
                    None => InteractionState::Idle,
                };
                InteractionEffect::None
            }
        }
    }

    /// Grabs the edge under the pointer, or starts scrubbing and seeks there.
    pub fn pointer_down(
        &mut self,
        model: &TimelineModel,
        viewport: &Viewport,
        x: f64,
        width_px: f64,
    ) -> InteractionEffect {
        if let Some(hit) = self.hit_test(model, viewport, x, width_px) {
            self.state = InteractionState::Dragging {
                scene: hit.scene,
                edge: hit.edge,
            };
            debug!(scene = hit.scene, edge = ?hit.edge, "edge drag started");
            return InteractionEffect::None;
        }

        self.state = InteractionState::Scrubbing;
        InteractionEffect::Seek(self.scrub_time(viewport, x, width_px))
    }

    pub fn pointer_up(&mut self) -> InteractionEffect {
        if self.state != InteractionState::Idle {
            debug!(state = ?self.state, "pointer released");
        }
        self.state = InteractionState::Idle;
        InteractionEffect::None
    }

    /// Pointer time clamped to the timeline. Deep zoom levels snap it to the
    /// frame grid.
    fn scrub_time(&self, viewport: &Viewport, x: f64, width_px: f64) -> f64 {
        let mut time = viewport.pixel_to_time(x, width_px);
        if viewport.zoom() > self.config.frame_snap_zoom && self.config.frame_rate > 0.0 {
            time = (time * self.config.frame_rate).round() / self.config.frame_rate;
        }
        time.clamp(0.0, viewport.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scene, TimeRange};

    const WIDTH: f64 = 800.0;

    fn model() -> TimelineModel {
        let mut model = TimelineModel::default();
        model.set_scenes(vec![
            Scene::new(TimeRange::new(0.0, 4.0), "a"),
            Scene::new(TimeRange::new(4.0, 8.0), "b"),
        ]);
        model
    }

    // 100 px per second.
    fn viewport() -> Viewport {
        Viewport::new(8.0, 1.0, 0.0)
    }

    #[test]
    fn hovering_near_an_edge() {
        let mut model = model();
        let mut controller = InteractionController::default();

        controller.pointer_move(&mut model, &viewport(), 402.0, WIDTH);
        assert_eq!(
            controller.state(),
            InteractionState::Hovering {
                scene: 0,
                edge: Edge::End
            }
        );

        controller.pointer_move(&mut model, &viewport(), 795.0, WIDTH);
        assert_eq!(
            controller.state(),
            InteractionState::Hovering {
                scene: 1,
                edge: Edge::End
            }
        );

        controller.pointer_move(&mut model, &viewport(), 200.0, WIDTH);
        assert_eq!(controller.state(), InteractionState::Idle);
    }

    #[test]
    fn threshold_follows_zoom() {
        let model = model();
        let controller = InteractionController::default();

        // 10 px away: outside the threshold at 100 px/s.
        assert!(controller.hit_test(&model, &viewport(), 410.0, WIDTH).is_none());

        // At 2x zoom around 4 s, 10 px is 0.05 s while 8 px is 0.04 s.
        let zoomed = Viewport::new(8.0, 2.0, 4.0);
        let x = zoomed.time_to_pixel(4.03, WIDTH);
        let hit = controller.hit_test(&model, &zoomed, x, WIDTH).unwrap();
        assert_eq!((hit.scene, hit.edge), (0, Edge::End));
    }

    #[test]
    fn dragging_an_edge_resizes_live() {
        let mut model = model();
        let mut controller = InteractionController::default();
        let viewport = viewport();

        assert_eq!(
            controller.pointer_down(&model, &viewport, 403.0, WIDTH),
            InteractionEffect::None
        );
        assert_eq!(
            controller.state(),
            InteractionState::Dragging {
                scene: 0,
                edge: Edge::End
            }
        );

        let effect = controller.pointer_move(&mut model, &viewport, 350.0, WIDTH);
        assert_eq!(
            effect,
            InteractionEffect::Resized {
                scene: 0,
                edge: Edge::End,
                outcome: EditOutcome::Applied
            }
        );
        assert_eq!(model.scenes()[0].end(), 3.5);

        // Dragging back close to the neighbor snaps onto it.
        controller.pointer_move(&mut model, &viewport, 390.0, WIDTH);
        assert_eq!(model.scenes()[0].end(), 4.0);

        controller.pointer_up();
        assert_eq!(controller.state(), InteractionState::Idle);
    }

    #[test]
    fn scrubbing_seeks_the_playhead() {
        let mut model = model();
        let mut controller = InteractionController::default();
        let viewport = viewport();

        assert_eq!(
            controller.pointer_down(&model, &viewport, 200.0, WIDTH),
            InteractionEffect::Seek(2.0)
        );
        assert_eq!(controller.state(), InteractionState::Scrubbing);
        assert_eq!(
            controller.pointer_move(&mut model, &viewport, 300.0, WIDTH),
            InteractionEffect::Seek(3.0)
        );
        assert_eq!(
            controller.pointer_move(&mut model, &viewport, 5_000.0, WIDTH),
            InteractionEffect::Seek(8.0)
        );

        controller.pointer_up();
        assert_eq!(controller.state(), InteractionState::Idle);
        assert_eq!(model.scenes()[0].end(), 4.0);
    }

    #[test]
    fn deep_zoom_scrubbing_snaps_to_frames() {
        let mut model = model();
        let mut controller = InteractionController::default();
        // 0.5 s visible from 4.75 s across 1000 px.
        let viewport = Viewport::new(10.0, 20.0, 5.0);

        controller.pointer_down(&model, &viewport, 500.0, 1_000.0);
        let effect = controller.pointer_move(&mut model, &viewport, 101.0, 1_000.0);

        assert_eq!(effect, InteractionEffect::Seek(144.0 / 30.0));
    }

    #[test]
    fn moderate_zoom_scrubbing_is_continuous() {
        let model = model();
        let mut controller = InteractionController::default();
        let viewport = Viewport::new(10.0, 1.0, 0.0);

        let effect = controller.pointer_down(&model, &viewport, 101.0, 1_000.0);
        let InteractionEffect::Seek(time) = effect else {
            panic!("expected a seek");
        };
        assert!((time - 1.01).abs() < 1e-9);
    }
}
