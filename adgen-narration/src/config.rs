//! Configuration for adgen-narration
//!
//! `QualityGateConfig` is loaded from `narration.toml` (see
//! `adgen_common::config` for discovery) and overridden by environment
//! variables and CLI flags in `main.rs`. Every field has a default, so an
//! empty or missing file yields a working configuration.

use crate::analysis::AcousticRubric;
use crate::types::{Voice, VoiceParams};
use crate::validators::ScoringWeights;
use crate::workflow::RetryPolicy;
use adgen_common::config::{load_or_default, resolve_config_path, LoggingConfig};
use adgen_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config file name looked up under `<config_dir>/adgen/`
pub const CONFIG_FILE_NAME: &str = "narration.toml";

/// Environment variable holding the provider API key
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_TTS_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";
pub const DEFAULT_STT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Hosted transcription model; self-hosted servers use faster-whisper ids
pub const HOSTED_STT_MODEL: &str = "whisper-1";

/// Quality gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    /// Overall score required to accept a clip
    pub min_quality_score: f32,
    /// Additional attempts after the first
    pub max_retry_attempts: u32,
    /// When false, the first successful synthesis is accepted unvalidated
    pub enable_quality_validation: bool,
    pub voice: Voice,
    /// Speech speed multiplier
    pub speed: f32,
    /// Whisper model size (tiny, base, small, medium, large-v3)
    pub stt_model_size: String,
    /// Narration units processed concurrently in a storyboard
    pub max_concurrent_units: usize,

    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub synthesis_timeout_secs: u64,
    pub transcription_timeout_secs: u64,
    pub analysis_timeout_secs: u64,

    /// Audio output root (ADGEN_OUTPUT_DIR and --output-dir take precedence)
    pub output_dir: Option<PathBuf>,
    /// Provider API key (OPENAI_API_KEY takes precedence)
    pub api_key: Option<String>,

    pub scoring: ScoringWeights,
    pub rubric: AcousticRubric,
    pub tts: TtsConfig,
    pub stt: SttConfig,
    pub logging: LoggingConfig,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_quality_score: 0.8,
            max_retry_attempts: 2,
            enable_quality_validation: true,
            voice: Voice::Alloy,
            speed: 1.0,
            stt_model_size: "base".to_string(),
            max_concurrent_units: 4,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 8000,
            synthesis_timeout_secs: 60,
            transcription_timeout_secs: 120,
            analysis_timeout_secs: 60,
            output_dir: None,
            api_key: None,
            scoring: ScoringWeights::default(),
            rubric: AcousticRubric::default(),
            tts: TtsConfig::default(),
            stt: SttConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Speech synthesis provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub endpoint: String,
    pub model: String,
    /// Audio container requested from the provider; also the file extension
    pub response_format: String,
    /// Minimum spacing between synthesis requests (0 disables pacing)
    pub min_request_interval_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            model: "tts-1".to_string(),
            response_format: "mp3".to_string(),
            min_request_interval_ms: 200,
        }
    }
}

/// Transcription provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    pub endpoint: String,
    /// Explicit model id; overrides the id derived from `stt_model_size`
    pub model: Option<String>,
    /// Spoken language hint (ISO 639-1)
    pub language: Option<String>,
    pub min_request_interval_ms: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STT_ENDPOINT.to_string(),
            model: None,
            language: Some("ko".to_string()),
            min_request_interval_ms: 0,
        }
    }
}

impl SttConfig {
    /// Model id sent to the transcription endpoint
    pub fn model_id(&self, model_size: &str) -> String {
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            return model.to_string();
        }
        if self.endpoint.contains("api.openai.com") {
            HOSTED_STT_MODEL.to_string()
        } else {
            format!("Systran/faster-whisper-{}", model_size)
        }
    }
}

impl QualityGateConfig {
    /// Load from the resolved config file, or defaults when none exists
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_FILE_NAME);
        let config: Self = load_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_quality_score) {
            return Err(Error::Config(format!(
                "min_quality_score must be within [0, 1] (got {})",
                self.min_quality_score
            )));
        }
        if !(0.25..=4.0).contains(&self.speed) {
            return Err(Error::Config(format!(
                "speed must be within [0.25, 4.0] (got {})",
                self.speed
            )));
        }
        if self.max_concurrent_units == 0 {
            return Err(Error::Config("max_concurrent_units must be at least 1".to_string()));
        }
        if self.synthesis_timeout_secs == 0
            || self.transcription_timeout_secs == 0
            || self.analysis_timeout_secs == 0
        {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }
        if self.stt_model_size.trim().is_empty() {
            return Err(Error::Config("stt_model_size must not be empty".to_string()));
        }
        self.scoring.validate().map_err(Error::Config)?;
        self.rubric.validate().map_err(Error::Config)?;
        Ok(())
    }

    /// Resolve the provider API key
    ///
    /// **Priority:** ENV → TOML
    pub fn resolve_api_key(&self) -> Option<String> {
        let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
        let toml_key = self.api_key.clone().filter(|k| is_valid_key(k));

        if env_key.is_some() && toml_key.is_some() {
            warn!(
                "API key found in both {} and TOML config. Using environment (highest priority).",
                API_KEY_ENV_VAR
            );
        }

        if let Some(key) = env_key {
            info!("API key loaded from environment variable");
            return Some(key);
        }
        if let Some(key) = toml_key {
            info!("API key loaded from TOML config");
            return Some(key);
        }
        None
    }

    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            voice: self.voice,
            speed: self.speed,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            min_quality_score: self.min_quality_score,
            max_retry_attempts: self.max_retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_retry_delay: Duration::from_millis(self.max_retry_delay_ms),
            synthesis_timeout: Duration::from_secs(self.synthesis_timeout_secs),
        }
    }

    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_secs(self.transcription_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
