//! Analysis components
//!
//! Pure scoring of a transcript against its script and of raw signal
//! statistics against the acoustic rubric.

pub mod acoustic_analyzer;
pub mod transcript_comparator;

pub use acoustic_analyzer::{AcousticAnalyzer, AcousticRubric, NEUTRAL_QUALITY_SCORE};
pub use transcript_comparator::TranscriptComparator;
