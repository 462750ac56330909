//! Quality Validator
//!
//! Façade that scores one synthesized clip against its script.
//!
//! # Validation Flow
//! 1. **Unavailable** - transcription engine not loaded → `validator_available: false`,
//!    no external calls
//! 2. **FileMissing** - clip does not exist → zero-score verdict, error "file not found"
//! 3. **Transcribing** - STT errors and timeouts become an empty transcript
//!    with zero confidence
//! 4. **Scoring** - transcript comparison, acoustic analysis, overall score
//! 5. **Verdict** - `passed = overall_score >= min_score`
//!
//! `validate()` never fails; anything unexpected in steps 3-4 becomes a
//! zero-score verdict carrying the error.

use crate::analysis::{AcousticAnalyzer, TranscriptComparator};
use crate::error::{CapabilityError, CapabilityResult};
use crate::types::{AudioValidation, QualityVerdict, TranscriptionResult, Transcriber};
use crate::validators::QualityScorer;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Quality Validator
pub struct QualityValidator {
    transcriber: Arc<dyn Transcriber>,
    comparator: TranscriptComparator,
    analyzer: AcousticAnalyzer,
    scorer: QualityScorer,
    transcription_timeout: Duration,
}

impl QualityValidator {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        analyzer: AcousticAnalyzer,
        scorer: QualityScorer,
        transcription_timeout: Duration,
    ) -> Self {
        Self {
            transcriber,
            comparator: TranscriptComparator::new(),
            analyzer,
            scorer,
            transcription_timeout,
        }
    }

    /// Whether the transcription engine loaded
    pub fn is_available(&self) -> bool {
        self.transcriber.is_available()
    }

    /// Validate one clip
    pub async fn validate(&self, audio_file: &Path, original_text: &str, min_score: f32) -> QualityVerdict {
        if !self.is_available() {
            let reason = self.transcriber.unavailable_reason().unwrap_or("not loaded");
            debug!(
                transcriber = self.transcriber.name(),
                reason,
                "Transcription engine unavailable, skipping validation"
            );
            return QualityVerdict::unavailable(format!(
                "transcription engine unavailable ({}); validation skipped",
                reason
            ));
        }

        if !audio_file.exists() {
            warn!(path = %audio_file.display(), "Audio file missing, failing verdict");
            return QualityVerdict::failed(
                audio_file,
                original_text,
                min_score,
                CapabilityError::ArtifactMissing(audio_file.to_path_buf()).to_string(),
            );
        }

        match self.score_clip(audio_file, original_text, min_score).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(path = %audio_file.display(), error = %e, "Validation failed");
                QualityVerdict::failed(audio_file, original_text, min_score, e.to_string())
            }
        }
    }

    async fn score_clip(
        &self,
        audio_file: &Path,
        original_text: &str,
        min_score: f32,
    ) -> CapabilityResult<QualityVerdict> {
        let transcription = self.transcribe(audio_file).await;
        let confidence = transcription.confidence.clamp(0.0, 1.0);

        let similarity = self.comparator.compare(original_text, &transcription.text);
        let acoustic = self.analyzer.analyze(audio_file).await;

        let overall_score = self.scorer.score(&similarity, &acoustic, confidence);
        if !overall_score.is_finite() {
            return Err(CapabilityError::Internal(format!(
                "overall score is not finite (similarity {}, acoustic {}, confidence {})",
                similarity.average_similarity, acoustic.quality_score, transcription.confidence
            )));
        }

        let passed = overall_score >= min_score;
        let recommendations = self.scorer.recommendations(overall_score, &similarity, &acoustic);

        info!(
            path = %audio_file.display(),
            score = overall_score,
            min_score,
            passed,
            similarity = similarity.average_similarity,
            acoustic = acoustic.quality_score,
            confidence,
            "Validation complete"
        );

        Ok(QualityVerdict {
            validator_available: true,
            audio_file: Some(audio_file.to_path_buf()),
            original_text: original_text.to_string(),
            transcribed_text: transcription.text,
            overall_score,
            passed,
            min_score,
            similarity,
            acoustic,
            transcription_confidence: confidence,
            recommendations,
            error: None,
            message: transcription.error_message,
        })
    }

    /// Transcribe, folding errors and timeouts into an empty transcript
    async fn transcribe(&self, audio_file: &Path) -> TranscriptionResult {
        let result = match tokio::time::timeout(
            self.transcription_timeout,
            self.transcriber.transcribe(audio_file),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(self.transcription_timeout)),
        };

        match result {
            Ok(transcription) => {
                debug!(
                    path = %audio_file.display(),
                    text = %transcription.text,
                    language = %transcription.language_code,
                    confidence = transcription.confidence,
                    "Transcription complete"
                );
                transcription
            }
            Err(e) => {
                warn!(
                    path = %audio_file.display(),
                    transcriber = self.transcriber.name(),
                    error = %e,
                    "Transcription failed, scoring with empty transcript"
                );
                TranscriptionResult::failed(format!("transcription failed: {}", e))
            }
        }
    }
}

#[async_trait]
impl AudioValidation for QualityValidator {
    fn name(&self) -> &'static str {
        "quality"
    }

    async fn validate(&self, audio_file: &Path, original_text: &str, min_score: f32) -> QualityVerdict {
        QualityValidator::validate(self, audio_file, original_text, min_score).await
    }
}
