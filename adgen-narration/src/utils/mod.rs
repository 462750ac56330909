//! Utility modules for adgen-narration

pub mod audio_decoder;
pub mod narration_files;
pub mod retry_backoff;

pub use audio_decoder::{decode_audio_file, DecodedAudio};
pub use narration_files::{estimate_duration_seconds, narration_file_name, safe_scene_name};
pub use retry_backoff::Backoff;
