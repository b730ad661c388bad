//! Periodic display refresh
//!
//! A dedicated thread wakes up every period, rebuilds the rendering side's
//! queue listing, publishes fresh progress and asks for a redraw. It owns no
//! playback state. Stopping wakes the thread immediately; a tick already in
//! flight finishes, no new tick starts.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_utils::sync::{Parker, Unparker};

use super::progress::ProgressPublisher;
use super::Player;

/// Rendering layer as seen by the refresh loop
pub trait Display: Send + 'static {
    /// Replace the displayed queue listing (head first)
    fn sync_queue(&mut self, names: Vec<String>);

    /// Ask for a redraw; an error stops the loop
    fn request_redraw(&mut self) -> Result<(), DisplayError>;
}

/// Rendering failures
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("redraw failed: {0}")]
    Redraw(String),
    #[error("display is gone")]
    Closed,
}

/// Refresh loop configuration
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    pub period: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

/// Refresh loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Running,
    Stopped,
}

/// Fixed-interval driver for the rendering layer
pub struct RefreshLoop {
    stop: Arc<AtomicBool>,
    unparker: Unparker,
    handle: Option<JoinHandle<Result<(), DisplayError>>>,
}

impl RefreshLoop {
    /// Spawn the refresh thread; the first tick happens one period from now
    pub fn start<D: Display>(
        player: Player,
        publisher: ProgressPublisher,
        mut display: D,
        config: RefreshConfig,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let parker = Parker::new();
        let unparker = parker.unparker().clone();
        let period = config.period.max(Duration::from_millis(1));

        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("refresh".to_string())
            .spawn(move || {
                let mut next = Instant::now() + period;
                loop {
                    loop {
                        if thread_stop.load(Ordering::Acquire) {
                            return Ok(());
                        }
                        let now = Instant::now();
                        if now >= next {
                            break;
                        }
                        parker.park_timeout(next - now);
                    }

                    if let Err(e) = Self::refresh(&player, &publisher, &mut display) {
                        log::error!("Refresh stopped: {}", e);
                        thread_stop.store(true, Ordering::Release);
                        return Err(e);
                    }

                    // missed ticks are dropped, not replayed
                    next += period;
                    let now = Instant::now();
                    if next <= now {
                        next = now + period;
                    }
                }
            })?;

        log::debug!("Refresh loop started, period {:?}", period);

        Ok(Self {
            stop,
            unparker,
            handle: Some(handle),
        })
    }

    /// One refresh: queue listing, progress, redraw
    pub fn refresh<D: Display + ?Sized>(
        player: &Player,
        publisher: &ProgressPublisher,
        display: &mut D,
    ) -> Result<(), DisplayError> {
        let names = {
            let queue = player.lock();
            publisher.publish(&queue);
            queue.names()
        };
        display.sync_queue(names);
        display.request_redraw()
    }

    pub fn state(&self) -> RefreshState {
        let finished = self.handle.as_ref().map_or(true, JoinHandle::is_finished);
        if finished || self.stop.load(Ordering::Acquire) {
            RefreshState::Stopped
        } else {
            RefreshState::Running
        }
    }

    /// Stop ticking and wait for the thread
    ///
    /// Returns the redraw error that ended the loop early, if any.
    pub fn stop(mut self) -> Result<(), DisplayError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), DisplayError> {
        self.stop.store(true, Ordering::Release);
        self.unparker.unpark();
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(DisplayError::Redraw("refresh thread panicked".to_string())),
            },
            None => Ok(()),
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Refresh loop ended with error: {}", e);
        }
    }
}
