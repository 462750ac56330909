//! Retry Controller
//!
//! Per narration unit: synthesize, validate, and retry until a clip passes
//! the quality gate or the retry budget runs out.
//!
//! # Algorithm
//! At most `max_retry_attempts + 1` synthesis calls, issued one at a time:
//! 1. Synthesize (timeout-bound). No audio → record the failure, try again
//!    unless the synthesizer reports itself unavailable.
//! 2. Validation disabled → accept the first audio without a verdict.
//! 3. Validate. Validator unavailable → accept immediately.
//! 4. Passed → return this attempt.
//! 5. Otherwise remember it if it beats the best score so far (strictly
//!    greater, so the earliest attempt wins ties).
//!
//! A verdict carrying an `error` (clip missing, score not computable) never
//! becomes the best attempt; the slot is spent and the loop moves on.
//!
//! When the budget is exhausted the best attempt is returned with a
//! `quality_warning`. Only when no attempt produced a usable clip is the
//! outcome left without a chosen attempt, carrying an `error` instead.
//!
//! # Cancellation
//! The token is checked before every attempt and raced against every
//! external call and backoff pause. Cancelling stops new attempts and
//! returns the best result gathered so far with `cancelled: true`.

use crate::error::CapabilityError;
use crate::types::{
    AttemptRecord, AudioValidation, NarrationUnit, QualityVerdict, RetryOutcome,
    SpeechSynthesizer, SynthesisAttempt, SynthesisRequest, VoiceParams,
};
use crate::utils::{estimate_duration_seconds, Backoff};
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Retry budget, quality threshold and per-call timing
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub min_quality_score: f32,
    /// Additional attempts after the first
    pub max_retry_attempts: u32,
    /// Pause before the second attempt; doubles for each later one
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub synthesis_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_quality_score: 0.8,
            max_retry_attempts: 2,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(8000),
            synthesis_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Total synthesis calls allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retry_attempts.saturating_add(1)
    }
}

/// Best validated attempt seen so far
#[derive(Debug, Default)]
struct BestAttempt {
    best: Option<(SynthesisAttempt, QualityVerdict)>,
}

impl BestAttempt {
    /// Keep `attempt` if it is the first scored one or strictly better
    fn observe(&mut self, attempt: SynthesisAttempt, verdict: QualityVerdict) -> bool {
        let improves = match &self.best {
            None => true,
            Some((_, current)) => verdict.overall_score > current.overall_score,
        };
        if improves {
            self.best = Some((attempt, verdict));
        }
        improves
    }

    fn score(&self) -> Option<f32> {
        self.best.as_ref().map(|(_, verdict)| verdict.overall_score)
    }

    fn into_inner(self) -> Option<(SynthesisAttempt, QualityVerdict)> {
        self.best
    }
}

/// Run `future` unless `cancel` fires first
async fn unless_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = future => Some(output),
    }
}

/// Retry Controller
pub struct RetryController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    /// None when quality validation is disabled
    validator: Option<Arc<dyn AudioValidation>>,
}

impl RetryController {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        validator: Option<Arc<dyn AudioValidation>>,
    ) -> Self {
        Self {
            synthesizer,
            validator,
        }
    }

    pub fn validation_enabled(&self) -> bool {
        self.validator.is_some()
    }

    /// Produce one narration clip that passes the quality gate if possible
    ///
    /// Never fails: synthesis errors, timeouts and cancellation all end up
    /// in fields of the returned outcome.
    pub async fn produce_validated_narration(
        &self,
        unit: &NarrationUnit,
        params: &VoiceParams,
        policy: &RetryPolicy,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> RetryOutcome {
        let max_attempts = policy.max_attempts();
        let mut outcome = empty_outcome(unit);
        let mut best = BestAttempt::default();
        let mut backoff = Backoff::new(policy.retry_delay, policy.max_retry_delay);

        info!(
            scene = unit.scene_number,
            scene_name = %unit.scene_name,
            max_attempts,
            min_score = policy.min_quality_score,
            "Producing narration"
        );

        while outcome.attempts_made < max_attempts {
            if outcome.attempts_made > 0 {
                let delay = backoff.next_delay();
                if !delay.is_zero() {
                    debug!(scene = unit.scene_number, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    if unless_cancelled(cancel, tokio::time::sleep(delay)).await.is_none() {
                        outcome.cancelled = true;
                        break;
                    }
                }
            }

            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            outcome.attempts_made += 1;
            let attempt_number = outcome.attempts_made;

            let synthesis = self.synthesize_attempt(unit, params, attempt_number, output_dir, policy.synthesis_timeout);
            let Some((attempt, retryable)) = unless_cancelled(cancel, synthesis).await else {
                outcome.cancelled = true;
                break;
            };

            let Some(audio_file) = attempt.audio_file_path.clone() else {
                outcome.attempts.push(AttemptRecord::unscored(attempt));
                if !retryable {
                    warn!(
                        scene = unit.scene_number,
                        attempt = attempt_number,
                        "Synthesis unavailable, giving up without further attempts"
                    );
                    break;
                }
                continue;
            };

            let Some(validator) = &self.validator else {
                info!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    path = %audio_file.display(),
                    "Quality validation disabled, accepting synthesized audio"
                );
                outcome.attempts.push(AttemptRecord::unscored(attempt.clone()));
                outcome.chosen_attempt = Some(attempt);
                return outcome;
            };

            let validation = validator.validate(&audio_file, &unit.text, policy.min_quality_score);
            let Some(verdict) = unless_cancelled(cancel, validation).await else {
                outcome.attempts.push(AttemptRecord::unscored(attempt));
                outcome.cancelled = true;
                break;
            };

            outcome.attempts.push(AttemptRecord::scored(attempt.clone(), &verdict));

            if !verdict.validator_available {
                info!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    "Validator unavailable, accepting audio without validation"
                );
                outcome.chosen_attempt = Some(attempt);
                outcome.verdict = Some(verdict);
                return outcome;
            }

            if let Some(error) = &verdict.error {
                warn!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    path = %audio_file.display(),
                    error = %error,
                    "Clip could not be validated, discarding"
                );
                continue;
            }

            if verdict.passed {
                info!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    score = verdict.overall_score,
                    "Narration passed quality gate"
                );
                outcome.chosen_attempt = Some(attempt);
                outcome.verdict = Some(verdict);
                return outcome;
            }

            info!(
                scene = unit.scene_number,
                attempt = attempt_number,
                score = verdict.overall_score,
                min_score = policy.min_quality_score,
                remaining = max_attempts - attempt_number,
                "Narration below quality threshold"
            );
            best.observe(attempt, verdict);
        }

        finish(outcome, best, policy)
    }

    /// One timeout-bound synthesis call folded into an attempt record,
    /// paired with whether a failure is worth retrying
    async fn synthesize_attempt(
        &self,
        unit: &NarrationUnit,
        params: &VoiceParams,
        attempt_number: u32,
        output_dir: &Path,
        timeout: Duration,
    ) -> (SynthesisAttempt, bool) {
        let request = SynthesisRequest {
            unit,
            params,
            attempt_number,
            output_dir,
        };

        debug!(
            scene = unit.scene_number,
            attempt = attempt_number,
            synthesizer = self.synthesizer.name(),
            "Synthesizing narration"
        );

        let result = match tokio::time::timeout(timeout, self.synthesizer.synthesize(&request)).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(timeout)),
        };

        let mut attempt = SynthesisAttempt {
            attempt_number,
            audio_file_path: None,
            voice: params.voice,
            estimated_duration_seconds: estimate_duration_seconds(&unit.text),
            generated_at: Utc::now(),
            error: None,
        };

        let mut retryable = true;
        match result {
            Ok(audio) => {
                info!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    path = %audio.audio_file_path.display(),
                    size_bytes = audio.size_bytes,
                    "Narration synthesized"
                );
                attempt.audio_file_path = Some(audio.audio_file_path);
            }
            Err(e) => {
                warn!(
                    scene = unit.scene_number,
                    attempt = attempt_number,
                    error = %e,
                    "Synthesis attempt failed"
                );
                retryable = e.is_retryable();
                attempt.error = Some(e.to_string());
            }
        }

        (attempt, retryable)
    }
}

/// Settle the outcome once the loop stops without an accepted attempt
fn finish(mut outcome: RetryOutcome, best: BestAttempt, policy: &RetryPolicy) -> RetryOutcome {
    let best_score = best.score();

    match best.into_inner() {
        Some((attempt, verdict)) => {
            if outcome.cancelled {
                warn!(
                    scene = outcome.scene_number,
                    attempts = outcome.attempts_made,
                    best_score,
                    "Cancelled, returning best attempt so far"
                );
            } else {
                warn!(
                    scene = outcome.scene_number,
                    attempts = outcome.attempts_made,
                    best_score,
                    min_score = policy.min_quality_score,
                    "Retry budget exhausted, returning best attempt"
                );
            }
            outcome.quality_warning = Some(format!(
                "did not meet threshold {}, returning best available",
                policy.min_quality_score
            ));
            outcome.chosen_attempt = Some(attempt);
            outcome.verdict = Some(verdict);
        }
        None if outcome.cancelled => {
            warn!(
                scene = outcome.scene_number,
                attempts = outcome.attempts_made,
                "Cancelled before any attempt was validated"
            );
            outcome.error = Some(if outcome.attempts_made == 0 {
                "cancelled before the first synthesis attempt".to_string()
            } else {
                "cancelled before any attempt was validated".to_string()
            });
        }
        None => {
            let last_error = outcome.attempts.iter().rev().find_map(|record| {
                record
                    .attempt
                    .error
                    .clone()
                    .or_else(|| record.validation_error.clone())
            });
            let produced_audio = outcome.attempts.iter().any(|record| record.attempt.has_audio());
            error!(
                scene = outcome.scene_number,
                attempts = outcome.attempts_made,
                produced_audio,
                last_error = last_error.as_deref().unwrap_or("none"),
                "No usable narration produced"
            );
            let mut message = if produced_audio {
                format!("no usable audio after {} attempts", outcome.attempts_made)
            } else {
                format!(
                    "all {} synthesis attempts failed to produce audio",
                    outcome.attempts_made
                )
            };
            if let Some(last_error) = last_error {
                message.push_str(&format!(" (last error: {})", last_error));
            }
            outcome.error = Some(message);
        }
    }

    outcome
}

fn empty_outcome(unit: &NarrationUnit) -> RetryOutcome {
    RetryOutcome {
        scene_number: unit.scene_number,
        scene_name: unit.scene_name.clone(),
        text: unit.text.clone(),
        chosen_attempt: None,
        verdict: None,
        attempts_made: 0,
        attempts: Vec::new(),
        quality_warning: None,
        error: None,
        cancelled: false,
    }
}
