//! Audio Test Fixture Generator
//!
//! Writes mono 16-bit WAV tones with an optional silence gap.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ToneConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub frequency_hz: f32,
    /// Peak amplitude in [0,1]
    pub amplitude: f32,
    pub silence_gap_start: Option<f64>,
    pub silence_gap_duration: Option<f64>,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 16000,
            frequency_hz: 1500.0,
            amplitude: 0.2,
            silence_gap_start: None,
            silence_gap_duration: None,
        }
    }
}

/// Generate a WAV tone at `path`
pub fn generate_tone_wav(path: &Path, config: &ToneConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    let (silence_start, silence_end) = match (config.silence_gap_start, config.silence_gap_duration) {
        (Some(start), Some(duration)) => {
            let start_sample = (start * config.sample_rate as f64) as usize;
            (start_sample, start_sample + (duration * config.sample_rate as f64) as usize)
        }
        _ => (usize::MAX, usize::MAX),
    };

    for i in 0..total_samples {
        let sample = if i >= silence_start && i < silence_end {
            0
        } else {
            let t = i as f32 / config.sample_rate as f32;
            let value = config.amplitude * (2.0 * std::f32::consts::PI * config.frequency_hz * t).sin();
            (value * i16::MAX as f32) as i16
        };
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}
