//! Core Types and Capability Traits
//!
//! Defines the data model shared by the analyzers, the validator and the
//! retry controller, plus the capability traits external collaborators
//! implement:
//! - **SpeechSynthesizer** - text → audio file
//! - **Transcriber** - audio file → transcript + confidence
//! - **FeatureExtractor** - audio file → scalar signal statistics
//! - **AudioValidation** - audio file + script → verdict
//!
//! All records serialize to camelCase JSON for the orchestration layer.

use crate::error::CapabilityResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Inputs
// ============================================================================

/// One scene's narration line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationUnit {
    /// 1-based position in the storyboard (used for file naming)
    pub scene_number: usize,
    /// Human-readable scene name
    pub scene_name: String,
    /// Script to be spoken
    pub text: String,
}

impl NarrationUnit {
    pub fn new(scene_number: usize, scene_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            scene_number,
            scene_name: scene_name.into(),
            text: text.into(),
        }
    }
}

/// Synthesis voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Voice::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Voice::ALL.iter().map(|v| v.as_str()).collect();
                format!("unknown voice '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Voice parameters handed to the synthesis provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub voice: Voice,
    /// Playback speed multiplier (provider range 0.25-4.0)
    pub speed: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            speed: 1.0,
        }
    }
}

// ============================================================================
// Speech Synthesis
// ============================================================================

/// One request to the synthesis provider
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub unit: &'a NarrationUnit,
    pub params: &'a VoiceParams,
    /// 1-based attempt number within the unit's retry loop
    pub attempt_number: u32,
    /// Private directory for this unit's audio files
    pub output_dir: &'a Path,
}

/// Audio produced by the synthesis provider
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_file_path: PathBuf,
    pub size_bytes: u64,
}

/// One concrete rendering of a narration unit.
///
/// A failed synthesis yields an attempt with no file path and an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisAttempt {
    pub attempt_number: u32,
    pub audio_file_path: Option<PathBuf>,
    pub voice: Voice,
    pub estimated_duration_seconds: f32,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SynthesisAttempt {
    pub fn has_audio(&self) -> bool {
        self.audio_file_path.is_some()
    }
}

/// Speech synthesis capability
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Render `request.unit.text` into a file under `request.output_dir`
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesizedAudio>;
}

// ============================================================================
// Transcription
// ============================================================================

/// Independent transcription of one synthesized clip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResult {
    pub text: String,
    pub language_code: String,
    /// Mean per-segment confidence in [0,1], 0 when none available
    pub confidence: f32,
    /// Per-segment texts as returned by the engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TranscriptionResult {
    /// Empty transcript recording a failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Speech-to-text capability
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// False when the engine failed to initialize; validation is then skipped
    fn is_available(&self) -> bool;

    /// Why the engine failed to initialize
    fn unavailable_reason(&self) -> Option<&str> {
        None
    }

    async fn transcribe(&self, audio_file: &Path) -> CapabilityResult<TranscriptionResult>;
}

// ============================================================================
// Acoustic Features
// ============================================================================

/// Raw signal statistics from the feature extraction capability
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcousticFeatures {
    /// Mean frame RMS energy
    pub rms: f32,
    /// Mean frame zero-crossing rate
    pub zero_crossing_rate: f32,
    /// Mean spectral centroid (Hz)
    pub spectral_centroid_hz: f32,
    /// Fraction of samples below the silence amplitude threshold
    pub silence_ratio: f32,
    pub duration_seconds: f32,
    pub sample_rate: u32,
}

/// Acoustic feature extraction capability
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    async fn extract(&self, audio_file: &Path) -> CapabilityResult<AcousticFeatures>;
}

// ============================================================================
// Metrics and Verdicts
// ============================================================================

/// Textual similarity between script and transcript, all in [0,1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityMetrics {
    pub character_similarity: f32,
    pub word_similarity: f32,
    pub length_similarity: f32,
    pub average_similarity: f32,
}

/// Acoustic statistics plus the rubric-derived sub-score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcousticMetrics {
    pub average_rms: f32,
    pub average_zero_crossing_rate: f32,
    pub average_spectral_centroid_hz: f32,
    pub silence_ratio: f32,
    pub duration_seconds: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Rubric score in [0,1]
    pub quality_score: f32,
    pub feature_extraction_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validation outcome for one synthesis attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVerdict {
    /// False when the transcription capability could not be loaded
    pub validator_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<PathBuf>,
    pub original_text: String,
    pub transcribed_text: String,
    pub overall_score: f32,
    pub passed: bool,
    pub min_score: f32,
    pub similarity: SimilarityMetrics,
    pub acoustic: AcousticMetrics,
    pub transcription_confidence: f32,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QualityVerdict {
    /// Verdict returned when no transcription engine is loaded
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            validator_available: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Zero-score failed verdict carrying an error
    pub fn failed(
        audio_file: &Path,
        original_text: &str,
        min_score: f32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            validator_available: true,
            audio_file: Some(audio_file.to_path_buf()),
            original_text: original_text.to_string(),
            min_score,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Audio validation seam used by the retry controller
#[async_trait]
pub trait AudioValidation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score one clip against its script. Never fails; every error is
    /// reported inside the verdict.
    async fn validate(&self, audio_file: &Path, original_text: &str, min_score: f32) -> QualityVerdict;
}

// ============================================================================
// Retry Outcome
// ============================================================================

/// One entry of a unit's attempt history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub attempt: SynthesisAttempt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    /// Why the clip could not be scored (e.g. file not found)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl AttemptRecord {
    /// Attempt that was never scored (synthesis failed or validation skipped)
    pub fn unscored(attempt: SynthesisAttempt) -> Self {
        Self {
            attempt,
            overall_score: None,
            passed: None,
            validation_error: None,
        }
    }

    /// Attempt with its verdict; unavailable verdicts carry no score
    pub fn scored(attempt: SynthesisAttempt, verdict: &QualityVerdict) -> Self {
        if !verdict.validator_available {
            return Self::unscored(attempt);
        }
        Self {
            attempt,
            overall_score: Some(verdict.overall_score),
            passed: Some(verdict.passed),
            validation_error: verdict.error.clone(),
        }
    }
}

/// Aggregate result for one narration unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryOutcome {
    pub scene_number: usize,
    pub scene_name: String,
    pub text: String,
    /// First passing attempt, else best-scoring; None on total failure
    pub chosen_attempt: Option<SynthesisAttempt>,
    /// Verdict for `chosen_attempt`; None when validation is disabled
    pub verdict: Option<QualityVerdict>,
    pub attempts_made: u32,
    pub attempts: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Loop stopped early because the caller cancelled
    pub cancelled: bool,
}

impl RetryOutcome {
    pub fn audio_file(&self) -> Option<&Path> {
        self.chosen_attempt
            .as_ref()
            .and_then(|a| a.audio_file_path.as_deref())
    }

    pub fn has_audio(&self) -> bool {
        self.audio_file().is_some()
    }

    /// Whether a verdict from an available validator is attached
    pub fn is_validated(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.validator_available)
    }

    pub fn passed(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.passed)
    }
}
