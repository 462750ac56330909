//! Acoustic Analyzer
//!
//! Turns raw signal statistics into an acoustic quality sub-score using an
//! additive rubric. Each criterion contributes its bonus when its statistic
//! lands inside the configured range; the sum is capped at 1.0.
//!
//! | Criterion          | Range                  | Bonus |
//! |--------------------|------------------------|-------|
//! | Mean RMS           | 0.01 ≤ rms ≤ 0.3       | 0.3   |
//! | Silence ratio      | < 0.1 (else < 0.2)     | 0.2 (0.1) |
//! | Zero-crossing rate | 0.05 ≤ zcr ≤ 0.2       | 0.2   |
//! | Spectral centroid  | 1000 ≤ c ≤ 4000 Hz     | 0.2   |
//! | Duration           | 1.0 ≤ d ≤ 30.0 s       | 0.1   |
//!
//! When extraction is unavailable, fails, or times out, the analyzer never
//! propagates the failure; it reports the neutral score instead.

use crate::error::CapabilityError;
use crate::types::{AcousticFeatures, AcousticMetrics, FeatureExtractor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sub-score reported when features cannot be obtained
pub const NEUTRAL_QUALITY_SCORE: f32 = 0.5;

/// Acoustic rubric thresholds and bonuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcousticRubric {
    pub rms_min: f32,
    pub rms_max: f32,
    pub rms_bonus: f32,

    /// Silence ratio strictly below this earns the full bonus
    pub silence_clean_max: f32,
    pub silence_clean_bonus: f32,
    /// Silence ratio strictly below this earns the partial bonus
    pub silence_tolerable_max: f32,
    pub silence_tolerable_bonus: f32,

    pub zcr_min: f32,
    pub zcr_max: f32,
    pub zcr_bonus: f32,

    pub centroid_min_hz: f32,
    pub centroid_max_hz: f32,
    pub centroid_bonus: f32,

    pub duration_min_secs: f32,
    pub duration_max_secs: f32,
    pub duration_bonus: f32,
}

impl Default for AcousticRubric {
    fn default() -> Self {
        Self {
            rms_min: 0.01,
            rms_max: 0.3,
            rms_bonus: 0.3,
            silence_clean_max: 0.1,
            silence_clean_bonus: 0.2,
            silence_tolerable_max: 0.2,
            silence_tolerable_bonus: 0.1,
            zcr_min: 0.05,
            zcr_max: 0.2,
            zcr_bonus: 0.2,
            centroid_min_hz: 1000.0,
            centroid_max_hz: 4000.0,
            centroid_bonus: 0.2,
            duration_min_secs: 1.0,
            duration_max_secs: 30.0,
            duration_bonus: 0.1,
        }
    }
}

impl AcousticRubric {
    /// Additive rubric score, capped at 1.0
    pub fn score(&self, features: &AcousticFeatures) -> f32 {
        let mut score = 0.0f32;

        if in_range(features.rms, self.rms_min, self.rms_max) {
            score += self.rms_bonus;
        }

        if features.silence_ratio < self.silence_clean_max {
            score += self.silence_clean_bonus;
        } else if features.silence_ratio < self.silence_tolerable_max {
            score += self.silence_tolerable_bonus;
        }

        if in_range(features.zero_crossing_rate, self.zcr_min, self.zcr_max) {
            score += self.zcr_bonus;
        }

        if in_range(
            features.spectral_centroid_hz,
            self.centroid_min_hz,
            self.centroid_max_hz,
        ) {
            score += self.centroid_bonus;
        }

        if in_range(
            features.duration_seconds,
            self.duration_min_secs,
            self.duration_max_secs,
        ) {
            score += self.duration_bonus;
        }

        score.min(1.0)
    }

    /// Check that every range is ordered and every bonus is non-negative
    pub fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("rms", self.rms_min, self.rms_max),
            ("silence", self.silence_clean_max, self.silence_tolerable_max),
            ("zcr", self.zcr_min, self.zcr_max),
            ("centroid", self.centroid_min_hz, self.centroid_max_hz),
            ("duration", self.duration_min_secs, self.duration_max_secs),
        ];
        for (name, low, high) in ranges {
            if !(low.is_finite() && high.is_finite() && low <= high) {
                return Err(format!("rubric {} range is invalid: {} > {}", name, low, high));
            }
        }

        let bonuses = [
            self.rms_bonus,
            self.silence_clean_bonus,
            self.silence_tolerable_bonus,
            self.zcr_bonus,
            self.centroid_bonus,
            self.duration_bonus,
        ];
        if bonuses.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err("rubric bonuses must be non-negative".to_string());
        }

        Ok(())
    }
}

fn in_range(value: f32, low: f32, high: f32) -> bool {
    value >= low && value <= high
}

/// Acoustic Analyzer
pub struct AcousticAnalyzer {
    extractor: Arc<dyn FeatureExtractor>,
    rubric: AcousticRubric,
    timeout: Duration,
}

impl AcousticAnalyzer {
    pub fn new(extractor: Arc<dyn FeatureExtractor>, rubric: AcousticRubric, timeout: Duration) -> Self {
        Self {
            extractor,
            rubric,
            timeout,
        }
    }

    /// Analyze one clip
    ///
    /// Always returns metrics; extraction failures yield the neutral score
    /// with `error` set.
    pub async fn analyze(&self, audio_file: &Path) -> AcousticMetrics {
        if !self.extractor.is_available() {
            debug!(
                extractor = self.extractor.name(),
                "Feature extraction unavailable, using neutral acoustic score"
            );
            return AcousticMetrics {
                feature_extraction_available: false,
                quality_score: NEUTRAL_QUALITY_SCORE,
                ..Default::default()
            };
        }

        let result = match tokio::time::timeout(self.timeout, self.extractor.extract(audio_file)).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(self.timeout)),
        };

        match result {
            Ok(features) => self.metrics_from_features(&features),
            Err(e) => {
                warn!(
                    file = %audio_file.display(),
                    extractor = self.extractor.name(),
                    error = %e,
                    "Acoustic feature extraction failed"
                );
                AcousticMetrics {
                    feature_extraction_available: true,
                    quality_score: NEUTRAL_QUALITY_SCORE,
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    /// Score extracted features against the rubric
    pub fn metrics_from_features(&self, features: &AcousticFeatures) -> AcousticMetrics {
        let quality_score = self.rubric.score(features);

        debug!(
            rms = features.rms,
            zcr = features.zero_crossing_rate,
            centroid_hz = features.spectral_centroid_hz,
            silence_ratio = features.silence_ratio,
            duration_s = features.duration_seconds,
            quality_score,
            "Acoustic analysis complete"
        );

        AcousticMetrics {
            average_rms: features.rms,
            average_zero_crossing_rate: features.zero_crossing_rate,
            average_spectral_centroid_hz: features.spectral_centroid_hz,
            silence_ratio: features.silence_ratio,
            duration_seconds: features.duration_seconds,
            sample_rate: Some(features.sample_rate),
            quality_score,
            feature_extraction_available: true,
            error: None,
        }
    }
}
