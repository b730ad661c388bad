//! tcha-player library
//!
//! Sequential playback queue: decoded tracks are streamed one after another
//! into a real-time audio output, with progress exposed for a UI.

pub mod audio;
pub mod decode;
pub mod engine;
pub mod library;
pub mod resample;

pub use engine::{Player, PlaybackQueue, Progress, ProgressPublisher, RefreshLoop};
