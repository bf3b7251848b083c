//! Second-order IIR filters used to split a buffer into bass and treble bands.
//!
//! Coefficients follow the RBJ audio EQ cookbook. State is kept in `f64` so
//! long offline renders do not accumulate `f32` rounding noise.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Highest usable cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f64 = 0.45;

#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Butterworth low-pass at `cutoff_hz`.
    pub fn low_pass(sample_rate: u32, cutoff_hz: f32) -> Self {
        let (cos, alpha) = prewarp(sample_rate, cutoff_hz);
        let b1 = 1.0 - cos;
        Self::normalized(b1 * 0.5, b1, b1 * 0.5, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
    }

    /// Butterworth high-pass at `cutoff_hz`.
    pub fn high_pass(sample_rate: u32, cutoff_hz: f32) -> Self {
        let (cos, alpha) = prewarp(sample_rate, cutoff_hz);
        let b0 = (1.0 + cos) * 0.5;
        Self::normalized(b0, -(1.0 + cos), b0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y as f32
    }

    /// Runs the filter over a whole buffer, starting from silence.
    pub fn render(mut self, samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|sample| self.process(*sample)).collect()
    }
}

fn prewarp(sample_rate: u32, cutoff_hz: f32) -> (f64, f64) {
    let sample_rate = f64::from(sample_rate.max(1));
    let cutoff = f64::from(cutoff_hz).clamp(1.0, sample_rate * MAX_CUTOFF_RATIO);
    let w0 = 2.0 * PI * cutoff / sample_rate;
    let alpha = w0.sin() / (2.0 * FRAC_1_SQRT_2);
    (w0.cos(), alpha)
}

/// Bass and treble renditions of the same buffer.
#[derive(Debug, Clone)]
pub struct BandSplit {
    pub bass: Vec<f32>,
    pub treble: Vec<f32>,
}

impl BandSplit {
    pub fn render(samples: &[f32], sample_rate: u32, bass_cutoff: f32, treble_cutoff: f32) -> Self {
        Self {
            bass: Biquad::low_pass(sample_rate, bass_cutoff).render(samples),
            treble: Biquad::high_pass(sample_rate, treble_cutoff).render(samples),
        }
    }
}
