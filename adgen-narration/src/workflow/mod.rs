//! Narration workflow
//!
//! Per-unit retry control and the storyboard batch built on top of it.

pub mod retry_controller;
pub mod storyboard;

pub use retry_controller::{RetryController, RetryPolicy};
pub use storyboard::{
    SceneScript, Storyboard, StoryboardReport, StoryboardRunner, StoryboardSummary,
};
