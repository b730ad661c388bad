//! Sequential playback queue
//!
//! The head slot is the only one streamed from. When it reports its end it
//! is closed and removed before `stream` returns, and the same call carries
//! on with the next slot, so track boundaries neither drop nor repeat frames.
//!
//! `stream` always fills the whole buffer: missing content (empty queue,
//! paused head, stalled source) becomes silence.

use std::collections::VecDeque;

use crate::audio::{Format, Frame, SILENCE};
use crate::decode::{DecodeError, DecodedSource};

use super::slot::TrackSlot;

/// Ordered list of tracks feeding the audio output
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    slots: VecDeque<TrackSlot>,
    last_error: Option<DecodeError>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track; it starts playing right away if the queue was empty
    pub fn add(&mut self, source: Box<dyn DecodedSource>, name: impl Into<String>) {
        let slot = TrackSlot::new(source, name);
        log::info!("Queued: {} ({} ahead)", slot.name(), self.slots.len());
        self.slots.push_back(slot);
        self.last_error = None;
    }

    /// Output callback entry point
    ///
    /// Fills every frame of `buf` and always returns `(buf.len(), true)`.
    pub fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
        self.fill(buf);
        (buf.len(), true)
    }

    /// Same as [`stream`](Self::stream), returning how many frames came from
    /// a track (the rest is silence)
    pub fn fill(&mut self, buf: &mut [Frame]) -> usize {
        let mut filled = 0;

        while filled < buf.len() {
            let Some(head) = self.slots.front_mut() else {
                break;
            };
            if head.is_paused() {
                break;
            }

            let remaining = buf.len() - filled;
            let (n, ok) = head.adapter_mut().stream(&mut buf[filled..]);
            let n = if n > remaining {
                if head.first_warning() {
                    log::warn!("'{}' reported {} frames for a {} frame request", head.name(), n, remaining);
                }
                remaining
            } else {
                n
            };
            filled += n;

            if !ok {
                self.evict_head();
                continue;
            }
            if n == 0 {
                // neither progress nor end: give up on this call instead of spinning
                if head.first_warning() {
                    log::warn!("'{}' stalled, filling with silence", head.name());
                }
                break;
            }
        }

        buf[filled..].fill(SILENCE);
        filled
    }

    fn evict_head(&mut self) {
        if let Some(slot) = self.slots.pop_front() {
            let name = slot.name().to_string();
            match slot.close() {
                Some(e) => {
                    log::error!("'{}' ended with a decode failure: {}", name, e);
                    self.last_error = Some(e);
                }
                None => log::info!("Finished: {}", name),
            }
        }
    }

    /// Drop the head track; returns its name
    pub fn skip(&mut self) -> Option<String> {
        let name = self.slots.front()?.name().to_string();
        self.evict_head();
        log::info!("Skipped: {}", name);
        Some(name)
    }

    /// Flip the pause flag of the head track
    ///
    /// Returns the new flag, `None` if nothing is queued.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        let head = self.slots.front_mut()?;
        let paused = !head.is_paused();
        head.set_paused(paused);
        log::info!("{}: {}", if paused { "Paused" } else { "Resumed" }, head.name());
        Some(paused)
    }

    pub fn is_paused(&self) -> bool {
        self.slots.front().is_some_and(TrackSlot::is_paused)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Head slot, if any
    pub fn current(&self) -> Option<&TrackSlot> {
        self.slots.front()
    }

    pub fn current_source(&self) -> Option<&dyn DecodedSource> {
        self.current().map(TrackSlot::source)
    }

    /// Head track name, empty when the queue is empty
    pub fn current_name(&self) -> &str {
        self.current().map(TrackSlot::name).unwrap_or("")
    }

    /// Head track format, `Format::default()` when the queue is empty
    pub fn current_format(&self) -> Format {
        self.current().map(TrackSlot::format).unwrap_or_default()
    }

    /// Last decode failure seen while streaming
    ///
    /// Sticky until the next successful [`add`](Self::add).
    pub fn err(&self) -> Option<&DecodeError> {
        self.last_error.as_ref()
    }

    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant-valued source that can end with a decode failure
    struct Tone {
        value: f32,
        len: u64,
        pos: u64,
        fail: bool,
    }

    impl Tone {
        fn new(value: f32, len: u64) -> Box<Self> {
            Box::new(Self {
                value,
                len,
                pos: 0,
                fail: false,
            })
        }
    }

    impl DecodedSource for Tone {
        fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
            let n = buf.len().min((self.len - self.pos) as usize);
            buf[..n].fill([self.value, self.value]);
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
            Format::new(44_100, 2, 16)
        }

        fn take_err(&mut self) -> Option<DecodeError> {
            std::mem::take(&mut self.fail).then(|| DecodeError::DecodeFailed("bad frame".into()))
        }
    }

    /// Never finishes, never produces
    struct Stuck;

    impl DecodedSource for Stuck {
        fn stream(&mut self, _buf: &mut [Frame]) -> (usize, bool) {
            (0, true)
        }

        fn position(&self) -> u64 {
            0
        }

        fn len(&self) -> u64 {
            0
        }

        fn format(&self) -> Format {
            Format::new(44_100, 2, 16)
        }
    }

    /// Reports more frames than it was asked for
    struct Overcount {
        pos: u64,
    }

    impl DecodedSource for Overcount {
        fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
            buf.fill([0.5, 0.5]);
            self.pos += buf.len() as u64;
            (buf.len() + 5, true)
        }

        fn position(&self) -> u64 {
            self.pos
        }

        fn len(&self) -> u64 {
            0
        }

        fn format(&self) -> Format {
            Format::new(44_100, 2, 16)
        }
    }

    #[test]
    fn test_empty_queue_streams_silence() {
        let mut queue = PlaybackQueue::new();
        for n in [0usize, 1, 7, 4_410] {
            let mut buf = vec![[1.0f32; 2]; n];
            assert_eq!(queue.stream(&mut buf), (n, true));
            assert!(buf.iter().all(|f| *f == SILENCE));
        }
    }

    #[test]
    fn test_add_to_empty_becomes_head() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.current_name(), "");
        assert!(queue.current_format().is_empty());
        assert!(queue.current_source().is_none());

        queue.add(Tone::new(0.5, 10), "a.mp3");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current_name(), "a.mp3");
        assert_eq!(queue.current_format().sample_rate.hz(), 44_100);
    }

    #[test]
    fn test_boundary_keeps_every_frame() {
        let mut queue = PlaybackQueue::new();
        queue.add(Tone::new(1.0, 150), "a");
        queue.add(Tone::new(2.0, 100), "b");

        let mut buf = vec![[0.0f32; 2]; 100];
        assert_eq!(queue.fill(&mut buf), 100);
        assert!(buf.iter().all(|f| *f == [1.0, 1.0]));

        assert_eq!(queue.fill(&mut buf), 100);
        assert!(buf[..50].iter().all(|f| *f == [1.0, 1.0]));
        assert!(buf[50..].iter().all(|f| *f == [2.0, 2.0]));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current_name(), "b");
        assert_eq!(queue.current_source().map(|s| s.position()), Some(50));
    }

    #[test]
    fn test_tail_is_silence_after_last_track() {
        let mut queue = PlaybackQueue::new();
        queue.add(Tone::new(1.0, 30), "a");

        let mut buf = vec![[9.0f32; 2]; 100];
        assert_eq!(queue.stream(&mut buf), (100, true));
        assert!(buf[..30].iter().all(|f| *f == [1.0, 1.0]));
        assert!(buf[30..].iter().all(|f| *f == SILENCE));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pause_outputs_silence_without_advancing() {
        let mut queue = PlaybackQueue::new();
        queue.add(Tone::new(1.0, 1_000), "a");

        let mut buf = vec![[0.0f32; 2]; 100];
        queue.stream(&mut buf);
        assert_eq!(queue.toggle_pause(), Some(true));
        assert!(queue.is_paused());

        buf.fill([5.0, 5.0]);
        assert_eq!(queue.stream(&mut buf), (100, true));
        assert!(buf.iter().all(|f| *f == SILENCE));
        assert_eq!(queue.current().map(TrackSlot::position), Some(100));

        assert_eq!(queue.toggle_pause(), Some(false));
        assert_eq!(queue.fill(&mut buf), 100);
        assert_eq!(queue.current().map(TrackSlot::position), Some(200));
    }

    #[test]
    fn test_toggle_pause_on_empty_is_noop() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.toggle_pause(), None);
        assert!(!queue.is_paused());
    }

    #[test]
    fn test_skip_drops_head() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.skip(), None);

        queue.add(Tone::new(1.0, 100), "a");
        queue.add(Tone::new(2.0, 100), "b");
        assert_eq!(queue.skip().as_deref(), Some("a"));
        assert_eq!(queue.names(), vec!["b".to_string()]);
    }

    #[test]
    fn test_decode_failure_is_sticky_until_add() {
        let mut queue = PlaybackQueue::new();
        let mut bad = Tone::new(1.0, 10);
        bad.fail = true;
        queue.add(bad, "bad");

        let mut buf = vec![[0.0f32; 2]; 20];
        queue.stream(&mut buf);
        assert!(queue.is_empty());
        assert!(matches!(queue.err(), Some(DecodeError::DecodeFailed(_))));

        queue.stream(&mut buf);
        assert!(queue.err().is_some());

        queue.add(Tone::new(1.0, 10), "good");
        assert!(queue.err().is_none());
    }

    #[test]
    fn test_stalled_source_does_not_hang() {
        let mut queue = PlaybackQueue::new();
        queue.add(Box::new(Stuck), "stuck");

        let mut buf = vec![[3.0f32; 2]; 64];
        assert_eq!(queue.fill(&mut buf), 0);
        assert!(buf.iter().all(|f| *f == SILENCE));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_overcount_is_clamped() {
        let mut queue = PlaybackQueue::new();
        queue.add(Box::new(Overcount { pos: 0 }), "loud");
        queue.add(Tone::new(2.0, 100), "next");

        let mut buf = vec![[0.0f32; 2]; 64];
        assert_eq!(queue.fill(&mut buf), 64);
        assert!(buf.iter().all(|f| *f == [0.5, 0.5]));
        assert_eq!(queue.current_name(), "loud");
        assert_eq!(queue.current_source().map(|s| s.position()), Some(64));

        // still streaming, and the second track was not touched
        assert_eq!(queue.stream(&mut buf), (64, true));
        assert!(buf.iter().all(|f| *f == [0.5, 0.5]));
        assert_eq!(queue.current_source().map(|s| s.position()), Some(128));
        assert_eq!(queue.len(), 2);
    }
}
