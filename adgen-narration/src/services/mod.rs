//! Remote provider clients

pub mod openai_stt_client;
pub mod openai_tts_client;

pub use openai_stt_client::OpenAiTranscriptionClient;
pub use openai_tts_client::OpenAiSpeechClient;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::Duration;

/// Request pacing: one request per `min_interval_ms`, None when 0
pub(crate) fn request_limiter(min_interval_ms: u64) -> Option<DefaultDirectRateLimiter> {
    Quota::with_period(Duration::from_millis(min_interval_ms)).map(RateLimiter::direct)
}

/// Wait for a request permit when pacing is configured
pub(crate) async fn pace(limiter: Option<&DefaultDirectRateLimiter>) {
    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }
}
