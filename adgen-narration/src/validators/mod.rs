//! Validators
//!
//! Scoring and the per-clip validation façade consumed by the retry
//! controller through the `AudioValidation` seam.

pub mod quality_scorer;
pub mod quality_validator;

pub use quality_scorer::{QualityScorer, ScoringWeights};
pub use quality_validator::QualityValidator;
