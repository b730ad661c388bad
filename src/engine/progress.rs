//! Playback progress
//!
//! Progress is recomputed from the head slot on every refresh and handed to
//! the rendering side through a [`Mailbox`]: one slot, newest value wins, so
//! a slow consumer only ever sees the latest state and never stalls the
//! publisher.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_utils::atomic::AtomicCell;

use crate::audio::format::round_duration;

use super::queue::PlaybackQueue;

/// Clock resolution of elapsed/total
const CLOCK_UNIT: Duration = Duration::from_millis(10);

/// Progress of the head track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub elapsed: Duration,
    pub total: Duration,
    /// 0..=100
    pub percent: u8,
    pub paused: bool,
}

/// Progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Progress {
    /// Nothing queued; render a placeholder
    #[default]
    Empty,
    Playing(ProgressState),
}

impl ProgressState {
    /// Track length, `None` when the source does not know it
    pub fn known_total(&self) -> Option<Duration> {
        (!self.total.is_zero()).then_some(self.total)
    }
}

impl Progress {
    pub fn state(&self) -> Option<&ProgressState> {
        match self {
            Self::Empty => None,
            Self::Playing(state) => Some(state),
        }
    }

    pub fn percent(&self) -> u8 {
        self.state().map_or(0, |s| s.percent)
    }
}

/// Compute progress for the head of `queue`
pub fn compute(queue: &PlaybackQueue) -> Progress {
    let Some(head) = queue.current() else {
        return Progress::Empty;
    };

    let rate = head.format().sample_rate;
    let elapsed = round_duration(rate.duration(head.position()), CLOCK_UNIT);
    let total = round_duration(rate.duration(head.len()), CLOCK_UNIT);

    Progress::Playing(ProgressState {
        elapsed,
        total,
        percent: percent_of(elapsed, total),
        paused: head.is_paused(),
    })
}

/// `floor(elapsed / total * 100)`, 0 for an empty or unknown total
fn percent_of(elapsed: Duration, total: Duration) -> u8 {
    let total = total.as_nanos();
    if total == 0 {
        return 0;
    }
    (elapsed.as_nanos() * 100 / total).min(100) as u8
}

/// Render a clock as `mm:ss`, `--:--` when unknown
pub fn format_clock(d: Option<Duration>) -> String {
    match d {
        Some(d) => {
            let secs = d.as_secs();
            format!("{:02}:{:02}", secs / 60, secs % 60)
        }
        None => "--:--".to_string(),
    }
}

/// Single-slot, latest-value-wins handoff
pub struct Mailbox<T: Copy> {
    slot: AtomicCell<Option<T>>,
}

impl<T: Copy> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: AtomicCell::new(None),
        }
    }

    /// Store `value`, replacing an unconsumed one
    ///
    /// Returns true if a previous value was dropped unread.
    pub fn publish(&self, value: T) -> bool {
        self.slot.swap(Some(value)).is_some()
    }

    /// Take the latest value, leaving the slot empty
    pub fn take(&self) -> Option<T> {
        self.slot.swap(None)
    }

    /// Copy of the latest value without consuming it
    pub fn peek(&self) -> Option<T> {
        self.slot.load()
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes progress and publishes it for the rendering side
#[derive(Clone, Default)]
pub struct ProgressPublisher {
    mailbox: Arc<Mailbox<Progress>>,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer end
    pub fn mailbox(&self) -> Arc<Mailbox<Progress>> {
        Arc::clone(&self.mailbox)
    }

    pub fn publish(&self, queue: &PlaybackQueue) -> Progress {
        let progress = compute(queue);
        if self.mailbox.publish(progress) {
            log::trace!("Progress overwritten before it was read");
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Format, Frame};
    use crate::decode::DecodedSource;

    struct Fixed {
        rate: u32,
        len: u64,
        pos: u64,
    }

    impl DecodedSource for Fixed {
        fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
            let n = buf.len().min((self.len - self.pos) as usize);
            self.pos += n as u64;
            (n, self.pos < self.len)
        }

        fn position(&self) -> u64 {
            self.pos
        }

        fn len(&self) -> u64 {
            self.len
        }

        fn format(&self) -> Format {
            Format::new(self.rate, 2, 16)
        }
    }

    fn queue_with(rate: u32, len: u64) -> PlaybackQueue {
        let mut queue = PlaybackQueue::new();
        queue.add(Box::new(Fixed { rate, len, pos: 0 }), "t");
        queue
    }

    #[test]
    fn test_empty_queue_has_no_progress() {
        let queue = PlaybackQueue::new();
        assert_eq!(compute(&queue), Progress::Empty);
        assert_eq!(compute(&queue).percent(), 0);
    }

    #[test]
    fn test_progress_of_head() {
        // 10s track, 2.5s played
        let mut queue = queue_with(44_100, 441_000);
        let mut buf = vec![[0.0f32; 2]; 110_250];
        queue.stream(&mut buf);

        let Progress::Playing(state) = compute(&queue) else {
            panic!("expected progress");
        };
        assert_eq!(state.elapsed, Duration::from_millis(2_500));
        assert_eq!(state.total, Duration::from_secs(10));
        assert_eq!(state.percent, 25);
        assert!(!state.paused);

        queue.toggle_pause();
        assert!(compute(&queue).state().unwrap().paused);
    }

    #[test]
    fn test_percent_is_monotonic() {
        let mut queue = queue_with(44_100, 44_100);
        let mut buf = vec![[0.0f32; 2]; 4_410];
        let mut last = 0;
        for _ in 0..9 {
            queue.stream(&mut buf);
            let percent = compute(&queue).percent();
            assert!(percent >= last);
            last = percent;
        }
        assert_eq!(last, 90);
    }

    #[test]
    fn test_zero_length_track() {
        let queue = queue_with(44_100, 0);
        let state = *compute(&queue).state().unwrap();
        assert_eq!(state.total, Duration::ZERO);
        assert_eq!(state.percent, 0);
        assert_eq!(state.known_total(), None);
        assert_eq!(format_clock(state.known_total()), "--:--");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(None), "--:--");
        assert_eq!(format_clock(Some(Duration::from_millis(125_990))), "02:05");
    }

    #[test]
    fn test_mailbox_latest_wins() {
        let mailbox = Mailbox::new();
        assert!(!mailbox.publish(1));
        assert!(mailbox.publish(2));
        assert_eq!(mailbox.peek(), Some(2));
        assert_eq!(mailbox.take(), Some(2));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_publisher_feeds_mailbox() {
        let publisher = ProgressPublisher::new();
        let mailbox = publisher.mailbox();
        let queue = queue_with(44_100, 44_100);

        publisher.publish(&PlaybackQueue::new());
        publisher.publish(&queue);
        assert!(matches!(mailbox.take(), Some(Progress::Playing(_))));
        assert!(matches!(mailbox.take(), None));
    }
}
