//! Storyboard batch validation
//!
//! Runs the retry controller once per scene narration with bounded
//! concurrency. Each unit writes into its own `scene_{NN}` directory under
//! the output root, so concurrent units never touch each other's files.
//! Outcomes come back in storyboard order.

use crate::types::{NarrationUnit, RetryOutcome, VoiceParams};
use crate::workflow::{RetryController, RetryPolicy};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Storyboard document: `{"scenes": [{"name": "...", "narration": "..."}]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    #[serde(default)]
    pub scenes: Vec<SceneScript>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneScript {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub narration: String,
}

impl Storyboard {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Narration units in storyboard order, plus the count of scenes skipped
    /// for having no narration
    ///
    /// Scene numbers are 1-based storyboard positions, so skipped scenes
    /// leave gaps. Unnamed scenes become `Scene {N}`. A scene is skipped when
    /// its narration is blank after trimming; kept narration is synthesized
    /// and compared exactly as written.
    pub fn narration_units(&self) -> (Vec<NarrationUnit>, usize) {
        let mut units = Vec::new();
        let mut skipped = 0;

        for (index, scene) in self.scenes.iter().enumerate() {
            let scene_number = index + 1;
            let name = scene
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Scene {}", scene_number));

            if scene.narration.trim().is_empty() {
                warn!(scene = scene_number, scene_name = %name, "Scene has no narration, skipping");
                skipped += 1;
                continue;
            }

            units.push(NarrationUnit::new(scene_number, name, scene.narration.clone()));
        }

        (units, skipped)
    }
}

/// Batch tallies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardSummary {
    pub total_units: usize,
    /// Units that ended with playable audio
    pub successful_units: usize,
    pub failed_units: usize,
    /// Units carrying a verdict from an available validator
    pub validated_units: usize,
    pub passed_units: usize,
    /// Mean overall score over validated units; absent when none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_overall_score: Option<f32>,
    pub skipped_units: usize,
}

impl StoryboardSummary {
    pub fn from_outcomes(outcomes: &[RetryOutcome], skipped_units: usize) -> Self {
        let total_units = outcomes.len();
        let successful_units = outcomes.iter().filter(|o| o.has_audio()).count();

        let validated_scores: Vec<f32> = outcomes
            .iter()
            .filter(|o| o.is_validated())
            .filter_map(|o| o.verdict.as_ref().map(|v| v.overall_score))
            .collect();

        let mean_overall_score = if validated_scores.is_empty() {
            None
        } else {
            let mean = validated_scores.iter().sum::<f32>() / validated_scores.len() as f32;
            Some((mean * 1000.0).round() / 1000.0)
        };

        Self {
            total_units,
            successful_units,
            failed_units: total_units - successful_units,
            validated_units: validated_scores.len(),
            passed_units: outcomes.iter().filter(|o| o.passed()).count(),
            mean_overall_score,
            skipped_units,
        }
    }
}

/// Batch result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output_root: PathBuf,
    /// True when the batch was cancelled before every unit finished
    pub cancelled: bool,
    pub outcomes: Vec<RetryOutcome>,
    pub summary: StoryboardSummary,
}

/// Private output directory for one unit
pub fn unit_output_dir(output_root: &Path, unit: &NarrationUnit) -> PathBuf {
    output_root.join(format!("scene_{:02}", unit.scene_number))
}

/// Storyboard runner
pub struct StoryboardRunner {
    controller: Arc<RetryController>,
    max_concurrent_units: usize,
}

impl StoryboardRunner {
    pub fn new(controller: Arc<RetryController>, max_concurrent_units: usize) -> Self {
        Self {
            controller,
            max_concurrent_units: max_concurrent_units.max(1),
        }
    }

    /// Validate every narration in a storyboard document
    pub async fn run(
        &self,
        storyboard: &Storyboard,
        params: &VoiceParams,
        policy: &RetryPolicy,
        output_root: &Path,
        cancel: &CancellationToken,
    ) -> StoryboardReport {
        let (units, skipped) = storyboard.narration_units();
        self.validate_storyboard(units, skipped, params, policy, output_root, cancel)
            .await
    }

    /// Run the retry controller for each unit, up to `max_concurrent_units`
    /// at a time, preserving input order in the report
    pub async fn validate_storyboard(
        &self,
        units: Vec<NarrationUnit>,
        skipped_units: usize,
        params: &VoiceParams,
        policy: &RetryPolicy,
        output_root: &Path,
        cancel: &CancellationToken,
    ) -> StoryboardReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            units = units.len(),
            skipped = skipped_units,
            concurrency = self.max_concurrent_units,
            output_root = %output_root.display(),
            "Storyboard validation started"
        );

        let outcomes: Vec<RetryOutcome> = stream::iter(units.iter())
            .map(|unit| {
                let output_dir = unit_output_dir(output_root, unit);
                async move {
                    self.controller
                        .produce_validated_narration(unit, params, policy, &output_dir, cancel)
                        .await
                }
            })
            .buffered(self.max_concurrent_units)
            .collect()
            .await;

        let summary = StoryboardSummary::from_outcomes(&outcomes, skipped_units);
        let cancelled = cancel.is_cancelled() || outcomes.iter().any(|o| o.cancelled);
        let finished_at = Utc::now();

        info!(
            run_id = %run_id,
            total = summary.total_units,
            successful = summary.successful_units,
            failed = summary.failed_units,
            validated = summary.validated_units,
            passed = summary.passed_units,
            mean_score = summary.mean_overall_score,
            cancelled,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Storyboard validation finished"
        );

        StoryboardReport {
            run_id,
            started_at,
            finished_at,
            output_root: output_root.to_path_buf(),
            cancelled,
            outcomes,
            summary,
        }
    }
}
