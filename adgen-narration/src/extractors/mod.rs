//! Feature extractors
//!
//! Implementations of the `FeatureExtractor` and `Transcriber` seams that
//! run locally rather than against a remote provider.

pub mod signal_features;
pub mod unavailable;

pub use signal_features::{FrameAnalyzer, SignalFeatureExtractor};
pub use unavailable::{UnavailableFeatureExtractor, UnavailableTranscriber};
