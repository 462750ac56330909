//! Scripted capability fakes
//!
//! Each fake counts its calls so tests can assert how often the retry loop
//! and validator reached out to a capability.

use super::audio_generator::{generate_tone_wav, ToneConfig};
use adgen_narration::utils::narration_files::narration_file_path;
use adgen_narration::{
    AcousticFeatures, AudioValidation, CapabilityError, CapabilityResult, FeatureExtractor,
    QualityVerdict, SpeechSynthesizer, SynthesisRequest, SynthesizedAudio, TranscriptionResult,
    Transcriber,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the scripted synthesizer does on one call
#[derive(Debug, Clone)]
pub enum SynthStep {
    /// Write an audio file
    Audio,
    /// Return a provider error
    Fail(String),
    /// Never return (exercises timeouts and cancellation)
    Hang,
    /// Report a file path that was never written
    Phantom,
    /// Report the provider as unavailable
    Unavailable,
}

/// Synthesizer following a fixed script; calls past the end produce audio
pub struct ScriptedSynthesizer {
    steps: Vec<SynthStep>,
    tone: Option<ToneConfig>,
    calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn new(steps: Vec<SynthStep>) -> Self {
        Self {
            steps,
            tone: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_audio() -> Self {
        Self::new(Vec::new())
    }

    pub fn always_failing(message: &str, attempts: usize) -> Self {
        Self::new(vec![SynthStep::Fail(message.to_string()); attempts])
    }

    /// Write real WAV tones instead of placeholder bytes
    pub fn with_tone(mut self, tone: ToneConfig) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesizedAudio> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.get(index).cloned().unwrap_or(SynthStep::Audio);

        let path = narration_file_path(
            request.output_dir,
            request.unit.scene_number,
            &request.unit.scene_name,
            request.attempt_number,
            "wav",
        );

        match step {
            SynthStep::Audio => {
                std::fs::create_dir_all(request.output_dir)?;
                match &self.tone {
                    Some(tone) => {
                        generate_tone_wav(&path, tone)
                            .map_err(|e| CapabilityError::Internal(e.to_string()))?;
                    }
                    None => std::fs::write(&path, b"RIFF placeholder")?,
                }
                let size_bytes = std::fs::metadata(&path)?.len();
                Ok(SynthesizedAudio {
                    audio_file_path: path,
                    size_bytes,
                })
            }
            SynthStep::Fail(message) => Err(CapabilityError::Api {
                status: 500,
                message,
            }),
            SynthStep::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CapabilityError::Internal("hang elapsed".to_string()))
            }
            SynthStep::Phantom => Ok(SynthesizedAudio {
                audio_file_path: path,
                size_bytes: 0,
            }),
            SynthStep::Unavailable => Err(CapabilityError::Unavailable(
                "speech synthesis API key not configured".to_string(),
            )),
        }
    }
}

/// Transcriber returning a fixed transcript
pub struct FixedTranscriber {
    text: String,
    confidence: f32,
    available: bool,
    failure: Option<String>,
    hang: bool,
    calls: AtomicUsize,
}

impl FixedTranscriber {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            available: true,
            failure: None,
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new("", 0.0)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("", 0.0)
        }
    }

    /// Never returns a transcript
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new("", 0.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn transcribe(&self, _audio_file: &Path) -> CapabilityResult<TranscriptionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(message) = &self.failure {
            return Err(CapabilityError::Network(message.clone()));
        }
        Ok(TranscriptionResult {
            text: self.text.clone(),
            language_code: "ko".to_string(),
            confidence: self.confidence,
            segments: vec![self.text.clone()],
            error_message: None,
        })
    }
}

/// Feature extractor returning fixed statistics
pub struct FixedFeatureExtractor {
    features: AcousticFeatures,
    hang: bool,
    calls: AtomicUsize,
}

impl FixedFeatureExtractor {
    pub fn new(features: AcousticFeatures) -> Self {
        Self {
            features,
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Statistics inside every default rubric band
    pub fn speech_like() -> Self {
        Self::new(AcousticFeatures {
            rms: 0.1,
            zero_crossing_rate: 0.1,
            spectral_centroid_hz: 2000.0,
            silence_ratio: 0.05,
            duration_seconds: 3.0,
            sample_rate: 24000,
        })
    }

    /// Never returns features
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::speech_like()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureExtractor for FixedFeatureExtractor {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, _audio_file: &Path) -> CapabilityResult<AcousticFeatures> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(self.features)
    }
}

/// Validator returning scripted scores; calls past the end repeat the last
pub struct ScriptedValidator {
    scores: Vec<f32>,
    available: bool,
    calls: AtomicUsize,
    validated: Mutex<Vec<PathBuf>>,
}

impl ScriptedValidator {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            available: true,
            calls: AtomicUsize::new(0),
            validated: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Files passed to `validate`, in call order
    pub fn validated_files(&self) -> Vec<PathBuf> {
        self.validated.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioValidation for ScriptedValidator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn validate(&self, audio_file: &Path, original_text: &str, min_score: f32) -> QualityVerdict {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.validated.lock().unwrap().push(audio_file.to_path_buf());

        if !self.available {
            return QualityVerdict::unavailable("scripted validator unavailable");
        }
        if !audio_file.exists() {
            return QualityVerdict::failed(audio_file, original_text, min_score, "file not found");
        }

        let score = self
            .scores
            .get(index)
            .or(self.scores.last())
            .copied()
            .unwrap_or(0.0);

        QualityVerdict {
            validator_available: true,
            audio_file: Some(audio_file.to_path_buf()),
            original_text: original_text.to_string(),
            overall_score: score,
            passed: score >= min_score,
            min_score,
            ..Default::default()
        }
    }
}
