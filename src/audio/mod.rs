//! Audio core
//!
//! Contains:
//! - Format: sample rate / duration math, stereo frame type
//! - Stats: output callback counters
//! - Output: real-time drivers pulling from the player
//! - Device: cpal output (feature `cpal`)

#[cfg(feature = "cpal")]
pub mod device;
pub mod format;
pub mod output;
pub mod stats;

#[cfg(feature = "cpal")]
pub use device::DeviceOutput;
pub use format::{Format, Frame, SampleRate, SILENCE};
pub use output::{NullOutput, OutputConfig, OutputError};
pub use stats::{PlaybackStats, StatsReport};
