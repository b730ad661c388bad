//! Audio output drivers
//!
//! An output repeatedly asks the [`Player`] for exactly the number of frames
//! it needs. Two drivers:
//! - [`NullOutput`]: a thread that paces calls in real time without any
//!   device (headless runs, tests)
//! - `DeviceOutput` (feature `cpal`): the system's default output device

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::format::{SampleRate, SILENCE};
use super::stats::PlaybackStats;
use crate::engine::Player;

/// Output configuration
#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub sample_rate: SampleRate,
    /// Audio requested per callback
    pub period: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::OUTPUT,
            period: Duration::from_millis(100),
        }
    }
}

impl OutputConfig {
    pub fn frames_per_period(&self) -> usize {
        self.sample_rate.frames(self.period).max(1)
    }
}

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to spawn output thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("no output device available")]
    NoDevice,
    #[error("output device error: {0}")]
    Device(String),
}

/// Device-less output clocked by the system timer
pub struct NullOutput {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<PlaybackStats>,
}

impl NullOutput {
    /// Start pulling `config.period` worth of frames every period
    pub fn start(player: Player, config: &OutputConfig) -> Result<Self, OutputError> {
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(PlaybackStats::new());
        let frames = config.frames_per_period();
        let period = config.period;

        let thread_running = Arc::clone(&running);
        let thread_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name("output".to_string())
            .spawn(move || {
                // allocated once, reused for every callback
                let mut buf = vec![SILENCE; frames];
                let mut next = Instant::now();

                while thread_running.load(Ordering::Acquire) {
                    let audible = player.fill(&mut buf);
                    thread_stats.on_callback(frames, frames - audible);

                    next += period;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        // fell behind, resync instead of bursting
                        next = now;
                    }
                }
            })?;

        log::info!(
            "Null output started: {} frames every {:?} at {}",
            frames,
            period,
            config.sample_rate
        );

        Ok(Self {
            running,
            handle: Some(handle),
            stats,
        })
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Output thread panicked");
            }
            log::info!("Null output stopped | {}", self.stats.report());
        }
    }
}

impl Drop for NullOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
