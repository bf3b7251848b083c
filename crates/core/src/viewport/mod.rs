use serde::{Deserialize, Serialize};

/// Kind of vertical grid line on the time ruler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickKind {
    Second,
    Frame,
}

/// Grid line at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub time: f64,
    pub kind: TickKind,
}

/// Visible window of the timeline, centred on the playhead where possible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    duration: f64,
    zoom: f64,
    current_time: f64,
}

impl Viewport {
    /// Zoom levels below 1 are raised to 1 and negative durations to 0.
    pub fn new(duration: f64, zoom: f64, current_time: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            zoom: if zoom.is_finite() { zoom.max(1.0) } else { 1.0 },
            current_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        *self = Self::new(self.duration, zoom, self.current_time);
    }

    pub fn visible_duration(&self) -> f64 {
        self.duration / self.zoom
    }

    /// Left edge of the window: the playhead minus half the window, kept
    /// inside `[0, duration - visible_duration]`.
    pub fn view_start(&self) -> f64 {
        let visible = self.visible_duration();
        let latest = (self.duration - visible).max(0.0);
        (self.current_time - visible / 2.0).max(0.0).min(latest)
    }

    pub fn view_end(&self) -> f64 {
        self.view_start() + self.visible_duration()
    }

    pub fn pixels_per_second(&self, width_px: f64) -> f64 {
        let visible = self.visible_duration();
        if visible <= 0.0 {
            return 0.0;
        }
        width_px / visible
    }

    pub fn time_to_pixel(&self, time: f64, width_px: f64) -> f64 {
        (time - self.view_start()) * self.pixels_per_second(width_px)
    }

    pub fn pixel_to_time(&self, pixel: f64, width_px: f64) -> f64 {
        if width_px <= 0.0 {
            return self.view_start();
        }
        self.view_start() + pixel / width_px * self.visible_duration()
    }

    /// Converts a screen distance into the time it spans at this zoom.
    pub fn pixels_to_seconds(&self, pixels: f64, width_px: f64) -> f64 {
        let pps = self.pixels_per_second(width_px);
        if pps <= 0.0 {
            return 0.0;
        }
        pixels / pps
    }

    /// Frame ticks only pay off once a frame is a few pixels wide.
    pub fn shows_frame_ticks(&self, width_px: f64, min_pixels_per_second: f64) -> bool {
        self.pixels_per_second(width_px) > min_pixels_per_second
    }

    /// Grid lines inside the window: every whole second, plus every frame of
    /// a `frame_rate` grid when [`Viewport::shows_frame_ticks`] holds.
    pub fn ticks(&self, width_px: f64, frame_rate: f64, min_pixels_per_second: f64) -> Vec<Tick> {
        let (start, end) = (self.view_start(), self.view_end());
        if end <= start {
            return Vec::new();
        }

        if frame_rate > 0.0 && self.shows_frame_ticks(width_px, min_pixels_per_second) {
            let first = (start * frame_rate).ceil() as u64;
            let last = (end * frame_rate).floor() as u64;
            let per_second = frame_rate.round().max(1.0) as u64;
            return (first..=last)
                .map(|frame| Tick {
                    time: frame as f64 / frame_rate,
                    kind: if frame % per_second == 0 {
                        TickKind::Second
                    } else {
                        TickKind::Frame
                    },
                })
                .collect();
        }

        (start.ceil() as u64..=end.floor() as u64)
            .map(|second| Tick {
                time: second as f64,
                kind: TickKind::Second,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn view_is_centred_on_playhead() {
        let viewport = Viewport::new(100.0, 4.0, 50.0);

        assert_eq!(viewport.visible_duration(), 25.0);
        assert_eq!(viewport.view_start(), 37.5);
        assert_eq!(viewport.time_to_pixel(50.0, 1_000.0), 500.0);
        assert_eq!(viewport.pixel_to_time(500.0, 1_000.0), 50.0);
    }

    #[test]
    fn view_is_clamped_at_both_ends() {
        assert_eq!(Viewport::new(100.0, 4.0, 2.0).view_start(), 0.0);
        assert_eq!(Viewport::new(100.0, 4.0, 99.0).view_start(), 75.0);
        assert_eq!(Viewport::new(100.0, 1.0, 60.0).view_start(), 0.0);
    }

    #[test]
    fn zoom_below_one_is_raised() {
        let viewport = Viewport::new(30.0, 0.25, 10.0);
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.visible_duration(), 30.0);
    }

    #[test]
    fn frame_ticks_need_enough_pixels() {
        // 10 s across 1000 px.
        let coarse = Viewport::new(10.0, 1.0, 0.0);
        assert!(!coarse.shows_frame_ticks(1_000.0, 150.0));
        let ticks = coarse.ticks(1_000.0, 30.0, 150.0);
        assert_eq!(ticks.len(), 11);
        assert!(ticks.iter().all(|t| t.kind == TickKind::Second));

        // 1 s across 1000 px.
        let fine = Viewport::new(10.0, 10.0, 0.0);
        assert!(fine.shows_frame_ticks(1_000.0, 150.0));
        let ticks = fine.ticks(1_000.0, 30.0, 150.0);
        assert_eq!(ticks.len(), 31);
        assert_eq!(ticks[0].kind, TickKind::Second);
        assert_eq!(ticks[1].kind, TickKind::Frame);
        assert_eq!(ticks[30].kind, TickKind::Second);
    }

    #[test]
    fn empty_timeline_maps_everything_to_zero() {
        let viewport = Viewport::new(0.0, 2.0, 0.0);
        assert_eq!(viewport.time_to_pixel(5.0, 800.0), 0.0);
        assert_eq!(viewport.pixels_to_seconds(8.0, 800.0), 0.0);
        assert!(viewport.ticks(800.0, 30.0, 150.0).is_empty());
    }

    proptest! {
        #[test]
        fn view_start_stays_in_bounds(
            duration in 0.1_f64..600.0,
            zoom in 1.0_f64..64.0,
            fraction in 0.0_f64..=1.0,
        ) {
            let viewport = Viewport::new(duration, zoom, duration * fraction);
            let start = viewport.view_start();

            prop_assert!(start >= 0.0);
            prop_assert!(start <= duration - viewport.visible_duration() + 1e-9);
        }

        #[test]
        fn pixel_mapping_round_trips(
            zoom in 1.0_f64..32.0,
            time in 0.0_f64..120.0,
            pixel in 0.0_f64..1_920.0,
        ) {
            let viewport = Viewport::new(120.0, zoom, time);
            let t = viewport.pixel_to_time(pixel, 1_920.0);
            prop_assert!((viewport.time_to_pixel(t, 1_920.0) - pixel).abs() < 1e-6);
        }
    }
}
