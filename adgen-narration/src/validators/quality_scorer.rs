//! Quality Scorer
//!
//! Combines transcript fidelity, acoustic cleanliness and transcription
//! confidence into one overall score, and renders human-readable
//! recommendations.
//!
//! # Scoring Algorithm
//! - **Text similarity** (weight: 0.6): `similarity.average_similarity`
//! - **Audio quality** (weight: 0.3): `acoustic.quality_score`
//! - **Transcription confidence** (weight: 0.1)
//!
//! The weighted sum is clamped to [0,1] and rounded to 3 decimals.
//!
//! # Recommendations
//! Rules are evaluated independently, in order:
//! 1. overall < 0.6 → regeneration recommended
//! 2. character similarity < 0.7 → pronunciation may be inaccurate
//! 3. mean RMS < 0.01 → volume too low; else > 0.3 → volume too high
//! 4. silence ratio > 0.2 → too much silence
//!
//! Acoustic rules only fire on measured features; the neutral metrics
//! reported when extraction is unavailable or failed trigger nothing.
//! When no rule fires the single message is "quality acceptable".

use crate::types::{AcousticMetrics, SimilarityMetrics};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const RECOMMEND_REGENERATE: &str = "overall quality low, regeneration recommended";
pub const RECOMMEND_PRONUNCIATION: &str = "text similarity low, pronunciation may be inaccurate";
pub const RECOMMEND_VOLUME_LOW: &str = "volume too low";
pub const RECOMMEND_VOLUME_HIGH: &str = "volume too high";
pub const RECOMMEND_SILENCE: &str = "too much silence";
pub const RECOMMEND_ACCEPTABLE: &str = "quality acceptable";

/// Overall score weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub text_similarity: f32,
    pub audio_quality: f32,
    pub transcription_confidence: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            text_similarity: 0.6,
            audio_quality: 0.3,
            transcription_confidence: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f32 {
        self.text_similarity + self.audio_quality + self.transcription_confidence
    }

    /// Weights must be non-negative and sum to 1 (within 1e-3)
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            self.text_similarity,
            self.audio_quality,
            self.transcription_confidence,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("scoring weights must be non-negative".to_string());
        }
        if (self.sum() - 1.0).abs() > 1e-3 {
            return Err(format!("scoring weights must sum to 1.0 (got {:.3})", self.sum()));
        }
        Ok(())
    }
}

/// Quality Scorer
pub struct QualityScorer {
    weights: ScoringWeights,
    /// Overall score below this recommends regeneration
    low_overall_threshold: f32,
    /// Character similarity below this flags pronunciation
    low_character_similarity: f32,
    min_rms: f32,
    max_rms: f32,
    max_silence_ratio: f32,
}

impl QualityScorer {
    /// Create new Quality Scorer with default weights and thresholds
    pub fn new() -> Self {
        Self::with_weights(ScoringWeights::default())
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self {
            weights,
            low_overall_threshold: 0.6,
            low_character_similarity: 0.7,
            min_rms: 0.01,
            max_rms: 0.3,
            max_silence_ratio: 0.2,
        }
    }

    /// Weighted overall score in [0,1], rounded to 3 decimals
    ///
    /// NaN inputs propagate so the caller can detect them.
    pub fn score(
        &self,
        similarity: &SimilarityMetrics,
        acoustic: &AcousticMetrics,
        transcription_confidence: f32,
    ) -> f32 {
        let text_component = self.weights.text_similarity * similarity.average_similarity;
        let audio_component = self.weights.audio_quality * acoustic.quality_score;
        let confidence_component = self.weights.transcription_confidence * transcription_confidence;

        let raw = text_component + audio_component + confidence_component;
        let overall = round_to_millis(raw.clamp(0.0, 1.0));

        debug!(
            text = text_component,
            audio = audio_component,
            confidence = confidence_component,
            overall,
            "Quality score breakdown"
        );

        overall
    }

    /// Ordered recommendation messages
    pub fn recommendations(
        &self,
        overall_score: f32,
        similarity: &SimilarityMetrics,
        acoustic: &AcousticMetrics,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if overall_score < self.low_overall_threshold {
            recommendations.push(RECOMMEND_REGENERATE.to_string());
        }

        if similarity.character_similarity < self.low_character_similarity {
            recommendations.push(RECOMMEND_PRONUNCIATION.to_string());
        }

        let measured = acoustic.feature_extraction_available && acoustic.error.is_none();
        if measured {
            if acoustic.average_rms < self.min_rms {
                recommendations.push(RECOMMEND_VOLUME_LOW.to_string());
            } else if acoustic.average_rms > self.max_rms {
                recommendations.push(RECOMMEND_VOLUME_HIGH.to_string());
            }

            if acoustic.silence_ratio > self.max_silence_ratio {
                recommendations.push(RECOMMEND_SILENCE.to_string());
            }
        }

        if recommendations.is_empty() {
            recommendations.push(RECOMMEND_ACCEPTABLE.to_string());
        }

        recommendations
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to_millis(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
