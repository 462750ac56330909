//! adgen-narration: narration quality gate
//!
//! Synthesizes each scene's narration, transcribes it back independently,
//! scores text fidelity and acoustic quality, and retries within a bounded
//! budget until a clip passes or the best available clip is returned.

pub mod analysis;
pub mod config;
pub mod error;
pub mod extractors;
pub mod pipeline;
pub mod services;
pub mod types;
pub mod utils;
pub mod validators;
pub mod workflow;

pub use crate::config::QualityGateConfig;
pub use crate::error::{CapabilityError, CapabilityResult};
pub use crate::types::{
    AcousticFeatures, AcousticMetrics, AttemptRecord, AudioValidation, FeatureExtractor,
    NarrationUnit, QualityVerdict, RetryOutcome, SimilarityMetrics, SpeechSynthesizer,
    SynthesisAttempt, SynthesisRequest, SynthesizedAudio, TranscriptionResult, Transcriber,
    Voice, VoiceParams,
};
pub use crate::validators::QualityValidator;
pub use crate::workflow::{RetryController, RetryPolicy, StoryboardReport, StoryboardRunner};
