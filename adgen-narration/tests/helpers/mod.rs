//! Test Helper Utilities
//!
//! Shared utilities for testing adgen-narration

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;

pub use audio_generator::{generate_tone_wav, ToneConfig};
pub use fakes::{
    FixedFeatureExtractor, FixedTranscriber, ScriptedSynthesizer, ScriptedValidator, SynthStep,
};
