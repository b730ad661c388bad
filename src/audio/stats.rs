//! Playback statistics
//!
//! Collected inside the output callback, so every update is a single relaxed
//! atomic operation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Output callback counters
///
/// All operations are lock-free and safe to call from the audio callback.
#[derive(Debug, Default)]
pub struct PlaybackStats {
    callback_count: AtomicU64,
    frames_streamed: AtomicU64,
    // frames the device asked for while nothing was audible (empty queue or paused)
    silence_frames: AtomicU64,
}

impl PlaybackStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per output callback
    #[inline]
    pub fn on_callback(&self, frames: usize, silent: usize) {
        self.callback_count.fetch_add(1, Ordering::Relaxed);
        self.frames_streamed
            .fetch_add(frames as u64, Ordering::Relaxed);
        if silent > 0 {
            self.silence_frames.fetch_add(silent as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn callback_count(&self) -> u64 {
        self.callback_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn frames_streamed(&self) -> u64 {
        self.frames_streamed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn silence_frames(&self) -> u64 {
        self.silence_frames.load(Ordering::Relaxed)
    }

    /// Snapshot for display/logging
    pub fn report(&self) -> StatsReport {
        StatsReport {
            callbacks: self.callback_count(),
            frames_streamed: self.frames_streamed(),
            silence_frames: self.silence_frames(),
        }
    }
}

/// Statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    pub callbacks: u64,
    pub frames_streamed: u64,
    pub silence_frames: u64,
}

impl std::fmt::Display for StatsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "callbacks: {} | frames: {} | silence: {}",
            self.callbacks, self.frames_streamed, self.silence_frames
        )
    }
}
