//! Playback engine
//!
//! Ties the queue, progress and refresh pieces together behind [`Player`].
//! Core design: a single coarse lock (the exclusion lock) guards the queue.
//! The output callback holds it while streaming; every outside mutation
//! (enqueue, pause, skip) takes the same lock, so the callback never sees a
//! half-updated queue.

pub mod progress;
pub mod queue;
pub mod refresh;
pub mod slot;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::audio::{Format, Frame};
use crate::decode::DecodedSource;

pub use progress::{compute, format_clock, Mailbox, Progress, ProgressPublisher, ProgressState};
pub use queue::PlaybackQueue;
pub use refresh::{Display, DisplayError, RefreshConfig, RefreshLoop, RefreshState};
pub use slot::TrackSlot;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Queue empty, output is silent
    Idle,
    Playing,
    Paused,
}

/// Shared handle to the playback queue
///
/// Cheap to clone; all clones drive the same queue.
#[derive(Clone, Default)]
pub struct Player {
    queue: Arc<Mutex<PlaybackQueue>>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the exclusion lock
    ///
    /// A panic on another thread while holding the lock does not stop
    /// playback: the queue is still structurally valid, so the poison is
    /// ignored.
    pub fn lock(&self) -> MutexGuard<'_, PlaybackQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a ready source under `name`
    pub fn add(&self, source: Box<dyn DecodedSource>, name: impl Into<String>) {
        self.lock().add(source, name);
    }

    /// Output callback entry point, see [`PlaybackQueue::stream`]
    pub fn stream(&self, buf: &mut [Frame]) -> (usize, bool) {
        self.lock().stream(buf)
    }

    /// See [`PlaybackQueue::fill`]
    pub fn fill(&self, buf: &mut [Frame]) -> usize {
        self.lock().fill(buf)
    }

    /// Pause/resume the current track; `None` when nothing is queued
    pub fn toggle_pause(&self) -> Option<bool> {
        self.lock().toggle_pause()
    }

    /// Drop the current track
    pub fn skip(&self) -> Option<String> {
        self.lock().skip()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Queued track names, head first
    pub fn names(&self) -> Vec<String> {
        self.lock().names()
    }

    pub fn current_name(&self) -> String {
        self.lock().current_name().to_string()
    }

    pub fn current_format(&self) -> Format {
        self.lock().current_format()
    }

    pub fn progress(&self) -> Progress {
        compute(&self.lock())
    }

    pub fn state(&self) -> PlaybackState {
        let queue = self.lock();
        if queue.is_empty() {
            PlaybackState::Idle
        } else if queue.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    /// Last decode failure, rendered for display
    pub fn last_error(&self) -> Option<String> {
        self.lock().err().map(ToString::to_string)
    }
}
