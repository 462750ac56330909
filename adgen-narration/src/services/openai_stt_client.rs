//! Transcription client (OpenAI-compatible `/v1/audio/transcriptions`)
//!
//! Works against the hosted Whisper API and self-hosted faster-whisper
//! servers that expose the same route. Requests `verbose_json` so that
//! per-segment log-probabilities are available for the confidence score.
//!
//! # Confidence
//! Mean over segments of `exp(min(0, avg_logprob))`; 0 when no segment
//! reports a log-probability.

use crate::config::SttConfig;
use crate::error::{CapabilityError, CapabilityResult};
use crate::services::openai_tts_client::api_error_message;
use crate::services::{pace, request_limiter};
use crate::types::{TranscriptionResult, Transcriber};
use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// `verbose_json` transcription response
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerboseTranscription {
    pub text: String,
    pub language: Option<String>,
    pub segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionSegment {
    pub text: String,
    pub avg_logprob: Option<f64>,
}

impl VerboseTranscription {
    /// Fold the provider response into a `TranscriptionResult`
    pub fn into_result(self) -> TranscriptionResult {
        let segments: Vec<String> = self
            .segments
            .iter()
            .map(|s| s.text.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let text = if segments.is_empty() {
            self.text.trim().to_string()
        } else {
            segments.join(" ")
        };

        let probabilities: Vec<f64> = self
            .segments
            .iter()
            .filter_map(|s| s.avg_logprob)
            .filter(|lp| lp.is_finite())
            .map(|lp| lp.min(0.0).exp())
            .collect();
        let confidence = if probabilities.is_empty() {
            0.0
        } else {
            (probabilities.iter().sum::<f64>() / probabilities.len() as f64) as f32
        };

        TranscriptionResult {
            text,
            language_code: self
                .language
                .as_deref()
                .map(normalize_language_code)
                .unwrap_or_default(),
            confidence,
            segments,
            error_message: None,
        }
    }
}

/// Map provider language names ("korean") to ISO 639-1 codes ("ko")
pub fn normalize_language_code(language: &str) -> String {
    let language = language.trim().to_ascii_lowercase();
    let code = match language.as_str() {
        "korean" => "ko",
        "english" => "en",
        "japanese" => "ja",
        "chinese" => "zh",
        other => other,
    };
    code.to_string()
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("aac") => "audio/aac",
        _ => "application/octet-stream",
    }
}

/// OpenAI transcription client
pub struct OpenAiTranscriptionClient {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model_id: String,
    language: Option<String>,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl OpenAiTranscriptionClient {
    /// Build a client; an empty API key is reported as unavailable
    pub fn new(
        api_key: impl Into<String>,
        config: &SttConfig,
        model_size: &str,
        request_timeout: Duration,
    ) -> CapabilityResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CapabilityError::Unavailable(
                "transcription API key not configured".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CapabilityError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        let model_id = config.model_id(model_size);
        tracing::info!(endpoint = %config.endpoint, model = %model_id, "Transcription client ready");

        Ok(Self {
            http_client,
            api_key,
            endpoint: config.endpoint.clone(),
            model_id,
            language: config.language.clone().filter(|l| !l.trim().is_empty()),
            rate_limiter: request_limiter(config.min_request_interval_ms),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriptionClient {
    fn name(&self) -> &'static str {
        "openai-stt"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn transcribe(&self, audio_file: &Path) -> CapabilityResult<TranscriptionResult> {
        let bytes = tokio::fs::read(audio_file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CapabilityError::ArtifactMissing(audio_file.to_path_buf())
            } else {
                CapabilityError::Io(e)
            }
        })?;

        let file_name = audio_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type_for(audio_file))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model_id.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        pace(self.rate_limiter.as_ref()).await;

        tracing::debug!(path = %audio_file.display(), model = %self.model_id, "Requesting transcription");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
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

        let body = response.text().await?;
        let parsed: VerboseTranscription = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::Parse(format!("transcription response: {}", e)))?;

        Ok(parsed.into_result())
    }
}
