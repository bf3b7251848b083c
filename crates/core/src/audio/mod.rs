use std::{
    future::Future,
    io::{Cursor, Read},
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use hound::{SampleFormat, WavReader};
use tracing::{debug, info};

use crate::{AnalysisConfig, AudioAnalysisResult, AudioAnalyzer, Result, TimelineError};

/// Decoded mono audio ready for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decodes a WAV file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = WavReader::open(path)?;
        Self::decode(reader)
    }

    /// Decodes an in-memory WAV payload, e.g. an uploaded file.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        Self::decode(reader)
    }

    /// Keeps the left (first) channel of multichannel input and scales
    /// integer PCM to `[-1, 1]`.
    fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let samples = interleaved.into_iter().step_by(channels).collect::<Vec<_>>();
        debug!(
            sample_rate = spec.sample_rate,
            channels,
            frames = samples.len(),
            "decoded wav"
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Outcome of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The request was the newest one when it finished; its result has been
    /// published as the engine's latest analysis.
    Completed(Arc<AudioAnalysisResult>),
    /// A newer request or an explicit cancel arrived while this one was
    /// running. The result was dropped.
    Superseded { generation: u64 },
}

/// Runs analyses on the blocking pool and publishes only the newest one.
///
/// Every request takes a generation number at call time. When its job
/// completes, the result is kept only if no other request (or cancel) has
/// taken a newer generation in the meantime.
#[derive(Debug, Clone)]
pub struct AudioEngine {
    analyzer: Arc<AudioAnalyzer>,
    generation: Arc<AtomicU64>,
    latest: Arc<Mutex<Option<Arc<AudioAnalysisResult>>>>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AudioEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            analyzer: Arc::new(AudioAnalyzer::new(config)),
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Drops whatever analysis is currently in flight.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "pending analysis cancelled");
    }

    /// Latest published analysis, if any.
    pub fn latest(&self) -> Result<Option<Arc<AudioAnalysisResult>>> {
        Ok(self.lock_latest()?.clone())
    }

    /// Analyses an already decoded buffer. The generation is taken when this
    /// method is called, not when the returned future is first polled.
    pub fn analyze(
        &self,
        buffer: AudioBuffer,
    ) -> impl Future<Output = Result<AnalysisOutcome>> + Send + 'static {
        self.spawn(move |analyzer| analyzer.analyze_buffer(&buffer))
    }

    /// Decodes and analyses a WAV payload. A decode failure fails the whole
    /// request and publishes nothing.
    pub fn analyze_wav_bytes(
        &self,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<AnalysisOutcome>> + Send + 'static {
        self.spawn(move |analyzer| {
            let buffer = AudioBuffer::from_wav_bytes(&bytes)?;
            analyzer.analyze_buffer(&buffer)
        })
    }

    fn spawn<F>(&self, job: F) -> impl Future<Output = Result<AnalysisOutcome>> + Send + 'static
    where
        F: FnOnce(&AudioAnalyzer) -> Result<AudioAnalysisResult> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let engine = self.clone();

        async move {
            let analyzer = engine.analyzer.clone();
            let result = tokio::task::spawn_blocking(move || job(&analyzer)).await??;
            engine.publish(generation, result)
        }
    }

    fn publish(&self, generation: u64, result: AudioAnalysisResult) -> Result<AnalysisOutcome> {
        let mut latest = self.lock_latest()?;
        // Checked under the lock so two finishing jobs cannot interleave.
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "analysis superseded");
            return Ok(AnalysisOutcome::Superseded { generation });
        }

        info!(generation, duration = result.duration, "analysis published");
        let result = Arc::new(result);
        *latest = Some(result.clone());
        Ok(AnalysisOutcome::Completed(result))
    }

    fn lock_latest(&self) -> Result<MutexGuard<'_, Option<Arc<AudioAnalysisResult>>>> {
        self.latest
            .lock()
            .map_err(|_| TimelineError::msg("analysis result slot has been poisoned"))
    }
}
