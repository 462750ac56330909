//! Signal Feature Extractor
//!
//! Computes the scalar statistics consumed by the acoustic rubric directly
//! from decoded PCM samples.
//!
//! # Framing
//! Frames of 2048 samples with a hop of 512. The signal is centered by
//! padding `frame_length / 2` zeros on each side, giving `1 + n / hop`
//! frames for `n` samples.
//!
//! # Extracted Features
//! - **RMS**: mean over frames of `sqrt(mean(x²))`
//! - **Zero-crossing rate**: mean over frames of sign changes / frame length
//!   (zero counts as positive)
//! - **Spectral centroid**: mean over frames of `Σ f·|X(f)| / Σ |X(f)|` on a
//!   Hann-windowed FFT; a silent frame contributes 0 Hz
//! - **Silence ratio**: fraction of samples with `|x| < 0.01`
//! - **Duration**: samples / sample rate

use crate::error::{CapabilityError, CapabilityResult};
use crate::types::{AcousticFeatures, FeatureExtractor};
use crate::utils::decode_audio_file;
use async_trait::async_trait;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const FRAME_LENGTH: usize = 2048;
pub const HOP_LENGTH: usize = 512;
/// Absolute amplitude below which a sample counts as silent
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// Frame-based statistics over mono samples
#[derive(Clone)]
pub struct FrameAnalyzer {
    frame_length: usize,
    hop_length: usize,
    silence_threshold: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Arc<[f32]>,
}

impl FrameAnalyzer {
    pub fn new(frame_length: usize, hop_length: usize, silence_threshold: f32) -> Self {
        let frame_length = frame_length.max(2);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_length);

        // Periodic Hann window
        let window: Vec<f32> = (0..frame_length)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / frame_length as f32).cos())
            .collect();

        Self {
            frame_length,
            hop_length: hop_length.max(1),
            silence_threshold,
            fft,
            window: window.into(),
        }
    }

    /// Compute all features for one mono signal
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> CapabilityResult<AcousticFeatures> {
        if samples.is_empty() {
            return Err(CapabilityError::Decode("no audio samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(CapabilityError::Decode("sample rate unknown".to_string()));
        }

        let half = self.frame_length / 2;
        let frame_count = 1 + samples.len() / self.hop_length;

        let mut frame = vec![0.0f32; self.frame_length];
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); self.frame_length];
        let bin_hz = sample_rate as f32 / self.frame_length as f32;

        let mut rms_sum = 0.0f64;
        let mut zcr_sum = 0.0f64;
        let mut centroid_sum = 0.0f64;

        for t in 0..frame_count {
            let start = t * self.hop_length;
            for (k, slot) in frame.iter_mut().enumerate() {
                // Padded index start + k maps to sample start + k - half
                *slot = (start + k)
                    .checked_sub(half)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
            }

            rms_sum += frame_rms(&frame) as f64;
            zcr_sum += frame_zero_crossing_rate(&frame) as f64;
            centroid_sum += self.frame_spectral_centroid(&frame, &mut spectrum, bin_hz) as f64;
        }

        let silent = samples
            .iter()
            .filter(|s| s.abs() < self.silence_threshold)
            .count();

        let features = AcousticFeatures {
            rms: (rms_sum / frame_count as f64) as f32,
            zero_crossing_rate: (zcr_sum / frame_count as f64) as f32,
            spectral_centroid_hz: (centroid_sum / frame_count as f64) as f32,
            silence_ratio: silent as f32 / samples.len() as f32,
            duration_seconds: samples.len() as f32 / sample_rate as f32,
            sample_rate,
        };

        debug!(
            frames = frame_count,
            rms = features.rms,
            zcr = features.zero_crossing_rate,
            centroid_hz = features.spectral_centroid_hz,
            silence_ratio = features.silence_ratio,
            "Signal features computed"
        );

        Ok(features)
    }

    fn frame_spectral_centroid(
        &self,
        frame: &[f32],
        spectrum: &mut [Complex<f32>],
        bin_hz: f32,
    ) -> f32 {
        for ((slot, &sample), &w) in spectrum.iter_mut().zip(frame).zip(self.window.iter()) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(spectrum);

        let mut weighted = 0.0f64;
        let mut total = 0.0f64;
        for (k, bin) in spectrum.iter().take(self.frame_length / 2 + 1).enumerate() {
            let magnitude = bin.norm() as f64;
            weighted += k as f64 * bin_hz as f64 * magnitude;
            total += magnitude;
        }

        if total <= f64::EPSILON {
            0.0
        } else {
            (weighted / total) as f32
        }
    }
}

fn frame_rms(frame: &[f32]) -> f32 {
    let sum_squares: f32 = frame.iter().map(|s| s * s).sum();
    (sum_squares / frame.len() as f32).sqrt()
}

fn frame_zero_crossing_rate(frame: &[f32]) -> f32 {
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

/// Signal Feature Extractor
///
/// Decodes the clip with symphonia, then runs [`FrameAnalyzer`] on a
/// blocking worker thread.
#[derive(Clone)]
pub struct SignalFeatureExtractor {
    analyzer: FrameAnalyzer,
}

impl SignalFeatureExtractor {
    pub fn new() -> Self {
        Self {
            analyzer: FrameAnalyzer::new(FRAME_LENGTH, HOP_LENGTH, SILENCE_THRESHOLD),
        }
    }
}

impl Default for SignalFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureExtractor for SignalFeatureExtractor {
    fn name(&self) -> &'static str {
        "signal"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, audio_file: &Path) -> CapabilityResult<AcousticFeatures> {
        let analyzer = self.analyzer.clone();
        let path = audio_file.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let decoded = decode_audio_file(&path)?;
            debug!(
                path = %path.display(),
                channels = decoded.channels,
                sample_rate = decoded.sample_rate,
                samples = decoded.samples.len(),
                "Clip decoded"
            );
            analyzer.analyze(&decoded.samples, decoded.sample_rate)
        })
        .await
        .map_err(|e| CapabilityError::Internal(format!("feature extraction task failed: {}", e)))?
    }
}
