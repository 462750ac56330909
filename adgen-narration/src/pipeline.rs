//! Capability wiring from configuration
//!
//! Builds the concrete synthesizer, transcriber and feature extractor and
//! injects the neutral stand-ins when a capability cannot initialize.

use crate::analysis::AcousticAnalyzer;
use crate::config::QualityGateConfig;
use crate::error::CapabilityResult;
use crate::extractors::{SignalFeatureExtractor, UnavailableTranscriber};
use crate::services::{OpenAiSpeechClient, OpenAiTranscriptionClient};
use crate::types::{AudioValidation, Transcriber};
use crate::validators::{QualityScorer, QualityValidator};
use crate::workflow::RetryController;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Transcriber for `config`, or the unavailable stand-in
pub fn build_transcriber(config: &QualityGateConfig, api_key: Option<&str>) -> Arc<dyn Transcriber> {
    let Some(api_key) = api_key else {
        warn!("No API key configured, transcription unavailable; validation will be skipped");
        return Arc::new(UnavailableTranscriber::new("API key not configured"));
    };

    match OpenAiTranscriptionClient::new(
        api_key,
        &config.stt,
        &config.stt_model_size,
        config.transcription_timeout(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Transcription client unavailable; validation will be skipped");
            Arc::new(UnavailableTranscriber::new(e.to_string()))
        }
    }
}

/// Quality validator for `config`
pub fn build_validator(config: &QualityGateConfig, api_key: Option<&str>) -> QualityValidator {
    let analyzer = AcousticAnalyzer::new(
        Arc::new(SignalFeatureExtractor::new()),
        config.rubric.clone(),
        config.analysis_timeout(),
    );

    QualityValidator::new(
        build_transcriber(config, api_key),
        analyzer,
        QualityScorer::with_weights(config.scoring),
        config.transcription_timeout(),
    )
}

/// Retry controller for `config`
///
/// Fails only when the speech synthesizer cannot be built; a missing
/// transcriber degrades validation instead.
pub fn build_controller(config: &QualityGateConfig, api_key: &str) -> CapabilityResult<RetryController> {
    let synthesizer = OpenAiSpeechClient::new(
        api_key,
        config.tts.clone(),
        Duration::from_secs(config.synthesis_timeout_secs),
    )?;

    let validator: Option<Arc<dyn AudioValidation>> = if config.enable_quality_validation {
        Some(Arc::new(build_validator(config, Some(api_key))))
    } else {
        info!("Quality validation disabled, first synthesized clip will be accepted");
        None
    };

    Ok(RetryController::new(Arc::new(synthesizer), validator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_gives_unavailable_transcriber() {
        let transcriber = build_transcriber(&QualityGateConfig::default(), None);
        assert!(!transcriber.is_available());
    }

    #[test]
    fn test_controller_respects_validation_flag() {
        let mut config = QualityGateConfig::default();
        let controller = build_controller(&config, "sk-test").unwrap();
        assert!(controller.validation_enabled());

        config.enable_quality_validation = false;
        let controller = build_controller(&config, "sk-test").unwrap();
        assert!(!controller.validation_enabled());
    }

    #[test]
    fn test_controller_requires_key() {
        assert!(build_controller(&QualityGateConfig::default(), "").is_err());
    }
}
