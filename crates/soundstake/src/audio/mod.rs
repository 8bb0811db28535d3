//! Audio subsystem
//!
//! Clip playback, onset analysis, and the shared visualization state.

pub mod analyzer;
pub mod engine;
pub mod meter;
pub mod types;

pub use analyzer::AnalyzingSource;
pub use engine::AudioEngine;
pub use meter::SpectralMeter;
pub use types::{AudioAnalysis, AudioCommand, AudioEvent, ClipInfo, PlaybackState};
