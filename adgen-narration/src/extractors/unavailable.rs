//! Stand-ins for capabilities that failed to initialize
//!
//! The validator and analyzer check `is_available()` before calling these,
//! so the call paths only run if a caller ignores that contract.

use crate::error::{CapabilityError, CapabilityResult};
use crate::types::{AcousticFeatures, FeatureExtractor, TranscriptionResult, Transcriber};
use async_trait::async_trait;
use std::path::Path;

/// Transcriber that could not be loaded
#[derive(Debug, Clone)]
pub struct UnavailableTranscriber {
    reason: String,
}

impl UnavailableTranscriber {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Transcriber for UnavailableTranscriber {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn unavailable_reason(&self) -> Option<&str> {
        Some(&self.reason)
    }

    async fn transcribe(&self, _audio_file: &Path) -> CapabilityResult<TranscriptionResult> {
        Err(CapabilityError::Unavailable(self.reason.clone()))
    }
}

/// Feature extractor that could not be loaded
#[derive(Debug, Clone)]
pub struct UnavailableFeatureExtractor {
    reason: String,
}

impl UnavailableFeatureExtractor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl FeatureExtractor for UnavailableFeatureExtractor {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn extract(&self, _audio_file: &Path) -> CapabilityResult<AcousticFeatures> {
        Err(CapabilityError::Unavailable(self.reason.clone()))
    }
}
