//! Offline energy and transient analysis of a decoded audio track.

mod filter;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use filter::{BandSplit, Biquad};

use crate::{config::PeakBandConfig, AnalysisConfig, AudioBuffer, Result, TimelineError};

/// Energy classification of a stretch of audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Build,
    High,
}

/// Maximal time range sharing one energy classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySegment {
    pub start: f64,
    pub end: f64,
    pub energy_level: EnergyLevel,
}

impl EnergySegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Everything the timeline needs to know about an analysed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAnalysisResult {
    pub duration: f64,
    /// Length of one energy window in seconds.
    pub window_seconds: f64,
    /// Per-window RMS normalised to `[0, 1]`.
    pub energy_curve: Vec<f32>,
    /// Contiguous segments covering `[0, duration]`.
    pub segments: Vec<EnergySegment>,
    /// Bass-band transients ("beats").
    pub primary_peaks: Vec<f64>,
    /// Treble-band transients ("hits").
    pub secondary_peaks: Vec<f64>,
}

impl AudioAnalysisResult {
    /// Returns the segment covering `time`. The final boundary belongs to the
    /// last segment.
    pub fn segment_at(&self, time: f64) -> Option<&EnergySegment> {
        if !(0.0..=self.duration).contains(&time) {
            return None;
        }

        let index = self.segments.partition_point(|segment| segment.end <= time);
        self.segments.get(index).or_else(|| self.segments.last())
    }

    /// Samples the energy curve at (or before) the requested time.
    pub fn energy_at(&self, time: f64) -> f32 {
        if time < 0.0 || self.window_seconds <= 0.0 {
            return 0.0;
        }

        let index = (time / self.window_seconds) as usize;
        self.energy_curve
            .get(index.min(self.energy_curve.len().saturating_sub(1)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Tempo estimate from the mean spacing of the primary peaks.
    pub fn estimated_tempo_bpm(&self) -> Option<f32> {
        let mut sum = 0.0;
        let mut count = 0;
        for window in self.primary_peaks.windows(2) {
            let interval = window[1] - window[0];
            if interval > f64::EPSILON {
                sum += interval;
                count += 1;
            }
        }

        if count == 0 {
            return None;
        }

        let average_interval = sum / count as f64;
        Some((60.0 / average_interval) as f32)
    }
}

/// Stateless analyser turning a mono buffer into an [`AudioAnalysisResult`].
#[derive(Debug, Clone, Default)]
pub struct AudioAnalyzer {
    config: AnalysisConfig,
}

impl AudioAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze_buffer(&self, buffer: &AudioBuffer) -> Result<AudioAnalysisResult> {
        self.analyze(buffer.samples(), buffer.sample_rate())
    }

    /// Runs the full analysis. The computation is a pure function of its
    /// input: identical buffers always yield identical results.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<AudioAnalysisResult> {
        if sample_rate == 0 {
            return Err(TimelineError::InvalidInput(
                "analysis requires a non-zero sample rate",
            ));
        }
        if self.config.window_seconds <= 0.0 {
            return Err(TimelineError::InvalidInput(
                "analysis window must be longer than zero",
            ));
        }

        let windows = Windows::new(samples.len(), sample_rate, self.config.window_seconds);
        let duration = samples.len() as f64 / f64::from(sample_rate);

        let energy_curve = normalize(&windows.rms(samples));
        let levels = classify(&energy_curve, &self.config);
        let segments = segment_levels(&energy_curve, &levels, &windows, duration, &self.config);

        let bands = BandSplit::render(
            samples,
            sample_rate,
            self.config.bass.cutoff_hz,
            self.config.treble.cutoff_hz,
        );
        let primary_peaks = detect_peaks(&windows.rms(&bands.bass), &windows, &self.config.bass);
        let secondary_peaks =
            detect_peaks(&windows.rms(&bands.treble), &windows, &self.config.treble);

        info!(
            duration,
            windows = energy_curve.len(),
            segments = segments.len(),
            primary_peaks = primary_peaks.len(),
            secondary_peaks = secondary_peaks.len(),
            "audio analysis finished"
        );

        Ok(AudioAnalysisResult {
            duration,
            window_seconds: windows.seconds_per_window(),
            energy_curve,
            segments,
            primary_peaks,
            secondary_peaks,
        })
    }
}

/// Fixed-size partition of a buffer. The trailing partial window counts.
#[derive(Debug, Clone, Copy)]
struct Windows {
    len: usize,
    sample_rate: u32,
    samples_per_window: usize,
}

impl Windows {
    fn new(len: usize, sample_rate: u32, window_seconds: f64) -> Self {
        let samples_per_window = ((f64::from(sample_rate) * window_seconds).round() as usize).max(1);
        Self {
            len,
            sample_rate,
            samples_per_window,
        }
    }

    fn seconds_per_window(&self) -> f64 {
        self.samples_per_window as f64 / f64::from(self.sample_rate)
    }

    fn start_time(&self, index: usize) -> f64 {
        round_centis((index * self.samples_per_window) as f64 / f64::from(self.sample_rate))
    }

    fn rms(&self, samples: &[f32]) -> Vec<f32> {
        debug_assert_eq!(samples.len(), self.len);
        samples
            .chunks(self.samples_per_window)
            .map(compute_rms)
            .collect()
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn normalize(rms: &[f32]) -> Vec<f32> {
    let max = rms.iter().copied().fold(0.0_f32, f32::max);
    if max <= 0.0 {
        return vec![0.0; rms.len()];
    }

    rms.iter().map(|value| (value / max).clamp(0.0, 1.0)).collect()
}

/// Zone of each window relative to the track average.
///
/// A curve that never leaves the `(build, high]` band around its average has
/// no relative dynamics (steady tone, DC, window-aligned or not) and is all
/// Low.
fn classify(curve: &[f32], config: &AnalysisConfig) -> Vec<EnergyLevel> {
    if curve.is_empty() {
        return Vec::new();
    }

    let avg = curve.iter().sum::<f32>() / curve.len() as f32;
    let (min, max) = curve
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), e| (lo.min(*e), hi.max(*e)));
    if min > config.build_ratio * avg && max <= config.high_ratio * avg {
        debug!(avg, min, max, "energy curve is flat");
        return vec![EnergyLevel::Low; curve.len()];
    }

    curve
        .iter()
        .map(|energy| {
            if *energy > config.high_ratio * avg {
                EnergyLevel::High
            } else if *energy > config.build_ratio * avg {
                EnergyLevel::Build
            } else {
                EnergyLevel::Low
            }
        })
        .collect()
}

fn segment_levels(
    curve: &[f32],
    levels: &[EnergyLevel],
    windows: &Windows,
    duration: f64,
    config: &AnalysisConfig,
) -> Vec<EnergySegment> {
    let Some(&first) = levels.first() else {
        return vec![EnergySegment {
            start: 0.0,
            end: duration,
            energy_level: EnergyLevel::Low,
        }];
    };

    let mut segments = Vec::new();
    let mut current = first;
    let mut start = 0.0;

    for (index, &level) in levels.iter().enumerate().skip(1) {
        if level == current {
            continue;
        }

        let is_drop = level == EnergyLevel::High && curve[index] > config.drop_energy;
        let reverts = levels[index + 1..]
            .iter()
            .take(config.debounce_windows)
            .any(|next| *next == current);
        if !is_drop && reverts {
            continue;
        }

        let boundary = windows.start_time(index);
        if boundary <= start || boundary >= duration {
            continue;
        }

        debug!(boundary, from = ?current, to = ?level, is_drop, "energy transition");
        segments.push(EnergySegment {
            start,
            end: boundary,
            energy_level: current,
        });
        start = boundary;
        current = level;
    }

    segments.push(EnergySegment {
        start,
        end: duration,
        energy_level: current,
    });
    segments
}

fn detect_peaks(rms: &[f32], windows: &Windows, band: &PeakBandConfig) -> Vec<f64> {
    if rms.len() < 3 {
        return Vec::new();
    }

    (1..rms.len() - 1)
        .filter(|&i| {
            let (prev, current, next) = (rms[i - 1], rms[i], rms[i + 1]);
            current > prev
                && current > next
                && current > band.threshold
                && current - prev > band.decay
        })
        .map(|i| windows.start_time(i))
        .collect()
}

fn round_centis(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use proptest::prelude::*;

    use super::*;

    fn analyzer() -> AudioAnalyzer {
        AudioAnalyzer::default()
    }

    /// Two seconds of silence with 100 ms sine bursts at 0.5 s, 1.0 s and 1.5 s.
    fn bursts(sample_rate: u32, frequency: f32) -> Vec<f32> {
        let window = sample_rate as usize / 10;
        let mut samples = vec![0.0; window * 20];
        for start_window in [5, 10, 15] {
            for n in 0..window {
                let phase = 2.0 * PI * frequency * n as f32 / sample_rate as f32;
                samples[start_window * window + n] = 0.8 * phase.sin();
            }
        }
        samples
    }

    fn assert_covers(result: &AudioAnalysisResult) {
        let segments = &result.segments;
        assert!(!segments.is_empty());
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[segments.len() - 1].end, result.duration);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn constant_amplitude_is_one_low_segment_without_peaks() {
        let samples = vec![0.5; 8_000 * 10];
        let result = analyzer().analyze(&samples, 8_000).unwrap();

        assert_eq!(result.duration, 10.0);
        assert_eq!(result.energy_curve.len(), 100);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].energy_level, EnergyLevel::Low);
        assert!(result.primary_peaks.is_empty());
        assert!(result.secondary_peaks.is_empty());
    }

    #[test]
    fn steady_sine_is_one_low_segment_regardless_of_window_alignment() {
        // Neither period divides the 100 ms window, so the RMS curve ripples.
        for frequency in [123.0_f32, 441.0] {
            let samples: Vec<f32> = (0..44_100 * 10)
                .map(|n| {
                    let phase = std::f64::consts::TAU * f64::from(frequency) * n as f64 / 44_100.0;
                    0.5 * phase.sin() as f32
                })
                .collect();
            let result = analyzer().analyze(&samples, 44_100).unwrap();

            assert_eq!(result.duration, 10.0);
            assert!(result.energy_curve.iter().any(|e| *e < 1.0));
            assert_eq!(result.segments.len(), 1, "{frequency} Hz");
            assert_eq!(result.segments[0].energy_level, EnergyLevel::Low, "{frequency} Hz");
            assert_eq!(result.segments[0].end, 10.0);
        }
    }

    #[test]
    fn silence_is_all_low() {
        let result = analyzer().analyze(&vec![0.0; 4_410], 44_100).unwrap();

        assert!(result.energy_curve.iter().all(|e| *e == 0.0));
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].energy_level, EnergyLevel::Low);
    }

    #[test]
    fn buffer_shorter_than_a_window_yields_one_segment() {
        let result = analyzer().analyze(&[0.2, -0.4, 0.9], 44_100).unwrap();

        assert_eq!(result.energy_curve, vec![1.0]);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].end, result.duration);
        assert!(result.primary_peaks.is_empty());
        assert!(result.secondary_peaks.is_empty());
    }

    #[test]
    fn empty_buffer_yields_zero_length_segment() {
        let result = analyzer().analyze(&[], 44_100).unwrap();

        assert_eq!(result.duration, 0.0);
        assert!(result.energy_curve.is_empty());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].end, 0.0);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let err = analyzer().analyze(&[0.1; 16], 0).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidInput(_)));
    }

    #[test]
    fn bass_bursts_become_primary_peaks() {
        let samples = bursts(8_000, 60.0);
        let result = analyzer().analyze(&samples, 8_000).unwrap();

        assert_eq!(result.primary_peaks, vec![0.5, 1.0, 1.5]);
        assert!(result.secondary_peaks.is_empty());
        let tempo = result.estimated_tempo_bpm().expect("tempo from beats");
        assert!((tempo - 120.0).abs() < 1.0);
    }

    #[test]
    fn treble_bursts_become_secondary_peaks() {
        let samples = bursts(16_000, 3_000.0);
        let result = analyzer().analyze(&samples, 16_000).unwrap();

        assert_eq!(result.secondary_peaks, vec![0.5, 1.0, 1.5]);
        assert!(result.primary_peaks.is_empty());
    }

    #[test]
    fn bursts_open_high_segments_immediately() {
        let result = analyzer().analyze(&bursts(8_000, 60.0), 8_000).unwrap();

        let levels: Vec<_> = result.segments.iter().map(|s| s.energy_level).collect();
        assert_eq!(
            levels,
            vec![
                EnergyLevel::Low,
                EnergyLevel::High,
                EnergyLevel::Low,
                EnergyLevel::High,
                EnergyLevel::Low,
                EnergyLevel::High,
                EnergyLevel::Low,
            ]
        );
        assert_eq!(result.segments[1].start, 0.5);
        assert_eq!(result.segments[1].end, 0.6);
        assert_covers(&result);
    }

    #[test]
    fn analysis_is_deterministic() {
        let samples = bursts(8_000, 60.0);
        let first = analyzer().analyze(&samples, 8_000).unwrap();
        let second = analyzer().analyze(&samples, 8_000).unwrap();

        assert_eq!(first.primary_peaks, second.primary_peaks);
        assert_eq!(first.secondary_peaks, second.secondary_peaks);
        assert_eq!(first, second);
    }

    fn segments_for(curve: &[f32]) -> Vec<EnergySegment> {
        let config = AnalysisConfig::default();
        let windows = Windows::new(curve.len() * 10, 100, config.window_seconds);
        let duration = curve.len() as f64 * 0.1;
        let levels = classify(curve, &config);
        segment_levels(curve, &levels, &windows, duration, &config)
    }

    #[test]
    fn short_blip_is_debounced() {
        let segments = segments_for(&[0.2, 0.2, 0.2, 0.5, 0.2, 0.2, 0.2, 0.2]);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].energy_level, EnergyLevel::Low);
    }

    #[test]
    fn loud_blip_is_a_drop() {
        let segments = segments_for(&[0.2, 0.2, 0.2, 0.9, 0.2, 0.2, 0.2, 0.2]);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].energy_level, EnergyLevel::High);
        assert_eq!(segments[1].start, 0.3);
        assert_eq!(segments[1].end, 0.4);
    }

    #[test]
    fn sustained_build_is_confirmed() {
        let segments = segments_for(&[0.1, 0.1, 0.1, 0.4, 0.4, 0.4, 0.4, 0.4]);

        // avg = 0.2875: 0.4 is High but below the drop energy, so it only
        // lands once the following windows confirm it.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].energy_level, EnergyLevel::High);
        assert_eq!(segments[1].start, 0.3);
    }

    #[test]
    fn segment_lookup_uses_boundaries() {
        let result = analyzer().analyze(&bursts(8_000, 60.0), 8_000).unwrap();

        assert_eq!(
            result.segment_at(0.55).map(|s| s.energy_level),
            Some(EnergyLevel::High)
        );
        assert_eq!(
            result.segment_at(0.6).map(|s| s.energy_level),
            Some(EnergyLevel::Low)
        );
        assert!(result.segment_at(2.0).is_some());
        assert!(result.segment_at(2.5).is_none());
        assert_eq!(result.energy_at(0.52), 1.0);
        assert_eq!(result.energy_at(0.42), 0.0);
    }

    proptest! {
        #[test]
        fn segments_always_cover_the_track(
            envelope in prop::collection::vec(0.0_f32..1.0, 1..60),
            tail in 0_usize..100,
        ) {
            let mut samples: Vec<f32> = envelope
                .iter()
                .flat_map(|amp| (0..100).map(move |n| if n % 2 == 0 { *amp } else { -*amp }))
                .collect();
            samples.extend(std::iter::repeat(0.3).take(tail));

            let result = analyzer().analyze(&samples, 1_000).unwrap();
            assert_covers(&result);
            prop_assert!(result.energy_curve.iter().all(|e| (0.0..=1.0).contains(e)));
        }
    }
}
