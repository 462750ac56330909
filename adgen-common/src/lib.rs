//! # adgen Common Library
//!
//! Shared code for the adgen narration tooling:
//! - Error type used by configuration loading
//! - TOML config discovery and loading
//! - Output root resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
