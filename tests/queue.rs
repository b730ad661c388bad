use std::thread;

use tcha_player::audio::{Format, Frame, SILENCE};
use tcha_player::decode::{DecodeError, DecodedSource};
use tcha_player::engine::{PlaybackState, Progress};
use tcha_player::{PlaybackQueue, Player};

/// Finite constant-value track that reports the end together with its last frames
struct Track {
    value: f32,
    len: u64,
    pos: u64,
    fail_at_end: bool,
    err: Option<DecodeError>,
}

impl Track {
    fn new(value: f32, len: u64) -> Box<Self> {
        Box::new(Self {
            value,
            len,
            pos: 0,
            fail_at_end: false,
            err: None,
        })
    }

    fn failing(value: f32, len: u64) -> Box<Self> {
        let mut track = Self::new(value, len);
        track.fail_at_end = true;
        track
    }
}

impl DecodedSource for Track {
    fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
        let n = ((self.len - self.pos) as usize).min(buf.len());
        buf[..n].fill([self.value, -self.value]);
        self.pos += n as u64;

        let done = self.pos >= self.len;
        if done && self.fail_at_end {
            self.err = Some(DecodeError::DecodeFailed("corrupt frame".to_string()));
        }
        (n, !done)
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
        self.err.take()
    }
}

#[test]
fn test_second_track_starts_after_first_ends() {
    let mut queue = PlaybackQueue::new();
    queue.add(Track::new(0.1, 500), "A");
    queue.add(Track::new(0.2, 44_100), "B");

    let mut buf = vec![SILENCE; 100];
    for call in 1..=5 {
        assert_eq!(queue.stream(&mut buf), (100, true));
        assert!(buf.iter().all(|f| *f == [0.1, -0.1]), "call {}", call);
        if call < 5 {
            assert_eq!(queue.current_name(), "A");
        }
    }

    assert_eq!(queue.current_name(), "B");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.current().map(|slot| slot.position()), Some(0));

    queue.stream(&mut buf);
    assert!(buf.iter().all(|f| *f == [0.2, -0.2]));
}

#[test]
fn test_track_boundary_inside_one_buffer() {
    let mut queue = PlaybackQueue::new();
    queue.add(Track::new(0.1, 30), "A");
    queue.add(Track::new(0.2, 50), "B");

    let mut buf = vec![[9.0; 2]; 100];
    assert_eq!(queue.fill(&mut buf), 80);
    assert!(buf[..30].iter().all(|f| *f == [0.1, -0.1]));
    assert!(buf[30..80].iter().all(|f| *f == [0.2, -0.2]));
    assert!(buf[80..].iter().all(|f| *f == SILENCE));
    assert!(queue.is_empty());
}

#[test]
fn test_always_fills_whole_buffer() {
    let mut queue = PlaybackQueue::new();
    for size in [1usize, 7, 64, 441, 4410] {
        let mut buf = vec![[5.0; 2]; size];
        assert_eq!(queue.stream(&mut buf), (size, true));
        assert!(buf.iter().all(|f| *f == SILENCE));
    }
}

#[test]
fn test_paused_head_outputs_silence_and_keeps_position() {
    let mut queue = PlaybackQueue::new();
    queue.add(Track::new(0.5, 1_000), "A");

    let mut buf = vec![SILENCE; 100];
    queue.stream(&mut buf);
    assert_eq!(queue.toggle_pause(), Some(true));

    for _ in 0..3 {
        assert_eq!(queue.stream(&mut buf), (100, true));
        assert!(buf.iter().all(|f| *f == SILENCE));
    }
    assert_eq!(queue.current().map(|slot| slot.position()), Some(100));

    assert_eq!(queue.toggle_pause(), Some(false));
    queue.stream(&mut buf);
    assert_eq!(queue.current().map(|slot| slot.position()), Some(200));
}

#[test]
fn test_decode_failure_is_kept_until_next_add() {
    let mut queue = PlaybackQueue::new();
    queue.add(Track::failing(0.3, 40), "broken");
    queue.add(Track::new(0.4, 40), "fine");

    let mut buf = vec![SILENCE; 100];
    assert_eq!(queue.fill(&mut buf), 80);
    assert!(matches!(queue.err(), Some(DecodeError::DecodeFailed(_))));

    // still reported once the queue has drained
    queue.stream(&mut buf);
    assert!(queue.err().is_some());

    queue.add(Track::new(0.4, 40), "again");
    assert!(queue.err().is_none());
}

/// 22.05 kHz track that returns (0, true) once halfway through
struct Hiccup {
    pos: u64,
    len: u64,
    stalled: bool,
}

impl DecodedSource for Hiccup {
    fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
        let half = self.len / 2;
        if self.pos == half && !self.stalled {
            self.stalled = true;
            return (0, true);
        }
        let end = if self.pos < half { half } else { self.len };
        let n = ((end - self.pos) as usize).min(buf.len());
        buf[..n].fill([0.3, 0.3]);
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
        Format::new(22_050, 2, 16)
    }
}

#[test]
fn test_resampled_track_survives_stall() {
    let mut queue = PlaybackQueue::new();
    queue.add(
        Box::new(Hiccup {
            pos: 0,
            len: 20,
            stalled: false,
        }),
        "slow",
    );

    let mut buf = vec![SILENCE; 64];
    let audible = queue.fill(&mut buf);
    assert!(audible > 0 && audible < 64);
    assert!(buf[audible..].iter().all(|f| *f == SILENCE));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.current().map(|slot| slot.position()), Some(10));

    // the rest of the track plays on the next call
    let audible = queue.fill(&mut buf);
    assert!(audible > 0);
    assert!(queue.is_empty());
}

#[test]
fn test_player_shared_between_threads() {
    let player = Player::new();
    let output = player.clone();

    let callback = thread::spawn(move || {
        let mut buf = vec![SILENCE; 256];
        let mut audible = 0;
        for _ in 0..1_000_000 {
            audible += output.fill(&mut buf);
            if audible >= 10_000 {
                break;
            }
            thread::yield_now();
        }
        audible
    });

    for i in 0..10 {
        player.add(Track::new(0.1, 1_000), format!("track {}", i));
    }

    let audible = callback.join().unwrap();
    // every frame of every track went out exactly once
    assert_eq!(audible, 10_000);
    assert!(player.is_empty());
    assert_eq!(player.state(), PlaybackState::Idle);
    assert_eq!(player.progress(), Progress::Empty);
}
