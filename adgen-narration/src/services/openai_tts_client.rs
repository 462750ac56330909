//! Speech synthesis client (OpenAI-compatible `/v1/audio/speech`)
//!
//! Posts `{model, input, voice, response_format, speed}` with bearer auth and
//! writes the returned audio bytes into the unit's output directory as
//! `narration_{NN}_{scene}[_attempt_K].{format}`.

use crate::config::TtsConfig;
use crate::error::{CapabilityError, CapabilityResult};
use crate::services::{pace, request_limiter};
use crate::types::{SpeechSynthesizer, SynthesisRequest, SynthesizedAudio};
use crate::utils::narration_files::narration_file_path;
use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for the speech endpoint
#[derive(Debug, Serialize)]
struct SpeechRequestBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}

/// `{"error": {"message": "..."}}` returned by OpenAI-compatible servers
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract a readable message from an error response body
pub(crate) fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// OpenAI speech synthesis client
pub struct OpenAiSpeechClient {
    http_client: reqwest::Client,
    api_key: String,
    config: TtsConfig,
    /// None when pacing is disabled
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl OpenAiSpeechClient {
    /// Build a client; an empty API key is reported as unavailable
    pub fn new(api_key: impl Into<String>, config: TtsConfig, request_timeout: Duration) -> CapabilityResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CapabilityError::Unavailable(
                "speech synthesis API key not configured".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CapabilityError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        let rate_limiter = request_limiter(config.min_request_interval_ms);

        Ok(Self {
            http_client,
            api_key,
            config,
            rate_limiter,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechClient {
    fn name(&self) -> &'static str {
        "openai-tts"
    }

    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesizedAudio> {
        pace(self.rate_limiter.as_ref()).await;

        let body = SpeechRequestBody {
            model: &self.config.model,
            input: &request.unit.text,
            voice: request.params.voice.as_str(),
            response_format: &self.config.response_format,
            speed: request.params.speed,
        };

        tracing::debug!(
            scene = request.unit.scene_number,
            attempt = request.attempt_number,
            voice = %request.params.voice,
            model = %self.config.model,
            "Requesting speech synthesis"
        );

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: api_error_message(&error_text),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CapabilityError::Parse("empty audio response".to_string()));
        }

        tokio::fs::create_dir_all(request.output_dir).await?;
        let path = narration_file_path(
            request.output_dir,
            request.unit.scene_number,
            &request.unit.scene_name,
            request.attempt_number,
            &self.config.response_format,
        );
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            scene = request.unit.scene_number,
            attempt = request.attempt_number,
            path = %path.display(),
            size_bytes = bytes.len(),
            "Speech audio written"
        );

        Ok(SynthesizedAudio {
            audio_file_path: path,
            size_bytes: bytes.len() as u64,
        })
    }
}
