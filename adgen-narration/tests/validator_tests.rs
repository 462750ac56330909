//! Quality validator integration tests
//!
//! Drives `QualityValidator` end to end with fixed transcription and
//! feature capabilities, plus one run through the real signal extractor.

mod helpers;

use adgen_narration::analysis::{AcousticAnalyzer, AcousticRubric};
use adgen_narration::extractors::{SignalFeatureExtractor, UnavailableTranscriber};
use adgen_narration::validators::quality_scorer::{
    RECOMMEND_ACCEPTABLE, RECOMMEND_PRONUNCIATION, RECOMMEND_REGENERATE,
};
use adgen_narration::validators::{QualityScorer, QualityValidator};
use adgen_narration::{FeatureExtractor, Transcriber};
use helpers::{generate_tone_wav, FixedFeatureExtractor, FixedTranscriber, ToneConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SCRIPT: &str = "스타벅스의 새로운 겨울 메뉴를 만나보세요";

fn validator(transcriber: Arc<dyn Transcriber>, extractor: Arc<dyn FeatureExtractor>) -> QualityValidator {
    validator_with_timeouts(transcriber, extractor, Duration::from_secs(5), Duration::from_secs(5))
}

fn validator_with_timeouts(
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn FeatureExtractor>,
    transcription_timeout: Duration,
    analysis_timeout: Duration,
) -> QualityValidator {
    let analyzer = AcousticAnalyzer::new(extractor, AcousticRubric::default(), analysis_timeout);
    QualityValidator::new(transcriber, analyzer, QualityScorer::new(), transcription_timeout)
}

fn placeholder_clip(dir: &Path) -> PathBuf {
    let path = dir.join("narration_01_Opening.mp3");
    std::fs::write(&path, b"not really audio").unwrap();
    path
}

#[tokio::test]
async fn test_matching_transcript_passes() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let transcriber = Arc::new(FixedTranscriber::new(SCRIPT, 0.9));
    let extractor = Arc::new(FixedFeatureExtractor::speech_like());
    let validator = validator(transcriber.clone(), extractor.clone());

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(verdict.validator_available);
    assert!(verdict.passed);
    assert!((verdict.overall_score - 0.99).abs() < 1e-6, "score was {}", verdict.overall_score);
    assert_eq!(verdict.similarity.average_similarity, 1.0);
    assert_eq!(verdict.acoustic.quality_score, 1.0);
    assert_eq!(verdict.transcribed_text, SCRIPT);
    assert_eq!(verdict.recommendations, vec![RECOMMEND_ACCEPTABLE.to_string()]);
    assert_eq!(verdict.audio_file.as_deref(), Some(clip.as_path()));
    assert!(verdict.error.is_none());
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(extractor.calls(), 1);
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let validator = validator(
        Arc::new(FixedTranscriber::new(SCRIPT, 0.9)),
        Arc::new(FixedFeatureExtractor::speech_like()),
    );

    let verdict = validator.validate(&clip, SCRIPT, 0.99).await;
    assert!(verdict.passed);
    assert_eq!(verdict.min_score, 0.99);
}

#[tokio::test]
async fn test_missing_file_fails_without_calls() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.mp3");

    let transcriber = Arc::new(FixedTranscriber::new(SCRIPT, 0.9));
    let extractor = Arc::new(FixedFeatureExtractor::speech_like());
    let validator = validator(transcriber.clone(), extractor.clone());

    let verdict = validator.validate(&missing, SCRIPT, 0.8).await;

    assert!(verdict.validator_available);
    assert!(!verdict.passed);
    assert_eq!(verdict.overall_score, 0.0);
    assert_eq!(verdict.error.as_deref(), Some("file not found"));
    assert_eq!(transcriber.calls(), 0);
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_transcription_failure_degrades_to_empty_transcript() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let validator = validator(
        Arc::new(FixedTranscriber::failing("connection reset")),
        Arc::new(FixedFeatureExtractor::speech_like()),
    );

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(verdict.validator_available);
    assert!(!verdict.passed);
    assert_eq!(verdict.transcribed_text, "");
    assert_eq!(verdict.transcription_confidence, 0.0);
    assert_eq!(verdict.similarity.average_similarity, 0.0);
    // Only the acoustic component remains
    assert!((verdict.overall_score - 0.3).abs() < 1e-6);
    assert!(verdict.error.is_none());
    assert!(verdict
        .message
        .as_deref()
        .is_some_and(|m| m.contains("connection reset")));
    assert_eq!(
        verdict.recommendations,
        vec![RECOMMEND_REGENERATE.to_string(), RECOMMEND_PRONUNCIATION.to_string()]
    );
}

#[tokio::test]
async fn test_unavailable_transcriber_skips_everything() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let extractor = Arc::new(FixedFeatureExtractor::speech_like());
    let validator = validator(
        Arc::new(UnavailableTranscriber::new("model not installed")),
        extractor.clone(),
    );
    assert!(!validator.is_available());

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(!verdict.validator_available);
    assert!(!verdict.passed);
    assert!(verdict
        .message
        .as_deref()
        .is_some_and(|m| m.contains("model not installed")));
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_fake_transcriber_is_never_called() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let transcriber = Arc::new(FixedTranscriber::unavailable());
    let validator = validator(transcriber.clone(), Arc::new(FixedFeatureExtractor::speech_like()));

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;
    assert!(!verdict.validator_available);
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn test_real_wav_through_signal_extractor() {
    let temp_dir = TempDir::new().unwrap();
    let wav_path = temp_dir.path().join("tone.wav");
    generate_tone_wav(&wav_path, &ToneConfig::default()).unwrap();

    let validator = validator(
        Arc::new(FixedTranscriber::new(SCRIPT, 0.8)),
        Arc::new(SignalFeatureExtractor::new()),
    );

    let verdict = validator.validate(&wav_path, SCRIPT, 0.5).await;

    assert!(verdict.acoustic.feature_extraction_available);
    assert!(verdict.acoustic.error.is_none());
    assert_eq!(verdict.acoustic.sample_rate, Some(16000));
    assert!((verdict.acoustic.duration_seconds - 2.0).abs() < 0.01);
    assert!(verdict.acoustic.average_rms > 0.1 && verdict.acoustic.average_rms < 0.2);
    assert!(verdict.acoustic.quality_score > 0.5);
    assert!(verdict.passed);
}

#[tokio::test]
async fn test_undecodable_file_uses_neutral_acoustic_score() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let validator = validator(
        Arc::new(FixedTranscriber::new(SCRIPT, 1.0)),
        Arc::new(SignalFeatureExtractor::new()),
    );

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(verdict.acoustic.error.is_some());
    assert_eq!(verdict.acoustic.quality_score, 0.5);
    // 0.6 * 1.0 + 0.3 * 0.5 + 0.1 * 1.0
    assert!((verdict.overall_score - 0.85).abs() < 1e-6);
    assert!(verdict.passed);
}

#[tokio::test]
async fn test_transcription_timeout_scores_empty_transcript() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let transcriber = Arc::new(FixedTranscriber::hanging());
    let validator = validator_with_timeouts(
        transcriber.clone(),
        Arc::new(FixedFeatureExtractor::speech_like()),
        Duration::from_millis(50),
        Duration::from_secs(5),
    );

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(verdict.validator_available);
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(verdict.transcribed_text, "");
    assert_eq!(verdict.transcription_confidence, 0.0);
    assert!(verdict
        .message
        .as_deref()
        .is_some_and(|m| m.contains("Timed out")));
    assert!(verdict.error.is_none());
    // Acoustic analysis still ran
    assert_eq!(verdict.acoustic.quality_score, 1.0);
    assert!((verdict.overall_score - 0.3).abs() < 1e-6);
    assert!(!verdict.passed);
}

#[tokio::test]
async fn test_analysis_timeout_uses_neutral_score() {
    let temp_dir = TempDir::new().unwrap();
    let clip = placeholder_clip(temp_dir.path());

    let extractor = Arc::new(FixedFeatureExtractor::hanging());
    let validator = validator_with_timeouts(
        Arc::new(FixedTranscriber::new(SCRIPT, 0.9)),
        extractor.clone(),
        Duration::from_secs(5),
        Duration::from_millis(50),
    );

    let verdict = validator.validate(&clip, SCRIPT, 0.8).await;

    assert!(verdict.validator_available);
    assert_eq!(extractor.calls(), 1);
    assert!(verdict.acoustic.feature_extraction_available);
    assert_eq!(verdict.acoustic.quality_score, 0.5);
    assert!(verdict
        .acoustic
        .error
        .as_deref()
        .is_some_and(|e| e.contains("Timed out")));
    // 0.6 * 1.0 + 0.3 * 0.5 + 0.1 * 0.9
    assert!((verdict.overall_score - 0.84).abs() < 1e-6);
    assert!(verdict.passed);
    assert!(verdict.error.is_none());
    assert_eq!(verdict.recommendations, vec![RECOMMEND_ACCEPTABLE.to_string()]);
}
