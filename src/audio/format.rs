//! Audio format and time math
//!
//! Internal representation: every track is streamed as interleaved stereo
//! `f32` frames in `[-1.0, 1.0]`, whatever the source layout was.
//! - mono sources are duplicated onto both channels
//! - sources with more than two channels keep their first two

use std::time::Duration;

/// One stereo sample pair (left, right)
pub type Frame = [f32; 2];

/// Silent frame
pub const SILENCE: Frame = [0.0, 0.0];

/// Sample rate in frames per second
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Fixed rate every track is normalized to before reaching the output
    pub const OUTPUT: SampleRate = SampleRate(44_100);

    #[inline]
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Duration of `frames` frames at this rate
    ///
    /// A zero rate has no meaningful clock, so it maps to zero.
    pub fn duration(self, frames: u64) -> Duration {
        if self.0 == 0 {
            return Duration::ZERO;
        }
        let rate = self.0 as u64;
        let secs = frames / rate;
        let rem = frames % rate;
        Duration::from_secs(secs) + Duration::from_nanos(rem * 1_000_000_000 / rate)
    }

    /// Number of frames spanning `duration` (rounded down)
    pub fn frames(self, duration: Duration) -> usize {
        (duration.as_nanos() * self.0 as u128 / 1_000_000_000) as usize
    }
}

impl std::fmt::Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}

/// Source audio format
///
/// `Format::default()` is the "no track" value returned by queue accessors
/// when nothing is playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Format {
    pub sample_rate: SampleRate,
    /// Channel count of the original source (frames are always stereo)
    pub channels: u16,
    /// Bits per sample of the original encoding, 0 when unknown
    pub precision: u16,
}

impl Format {
    pub fn new(sample_rate: u32, channels: u16, precision: u16) -> Self {
        Self {
            sample_rate: SampleRate(sample_rate),
            channels,
            precision,
        }
    }

    /// Whether this is the empty sentinel
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample_rate.0 == 0
    }
}

/// Round `d` to the nearest multiple of `unit`
pub fn round_duration(d: Duration, unit: Duration) -> Duration {
    let unit_ns = unit.as_nanos();
    if unit_ns == 0 {
        return d;
    }
    let ns = d.as_nanos();
    let rounded = (ns + unit_ns / 2) / unit_ns * unit_ns;
    Duration::from_nanos(rounded as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_whole_seconds() {
        let rate = SampleRate(44_100);
        assert_eq!(rate.duration(44_100), Duration::from_secs(1));
        assert_eq!(rate.duration(22_050), Duration::from_millis(500));
    }

    #[test]
    fn test_duration_zero_rate() {
        assert_eq!(SampleRate(0).duration(1_000), Duration::ZERO);
    }

    #[test]
    fn test_frames_for_period() {
        // 100ms callback period at the output rate
        assert_eq!(SampleRate::OUTPUT.frames(Duration::from_millis(100)), 4_410);
    }

    #[test]
    fn test_round_to_hundredths() {
        let unit = Duration::from_millis(10);
        assert_eq!(
            round_duration(Duration::from_micros(1_234_567), unit),
            Duration::from_millis(1_230)
        );
        assert_eq!(
            round_duration(Duration::from_micros(1_235_000), unit),
            Duration::from_millis(1_240)
        );
    }

    #[test]
    fn test_default_format_is_empty() {
        assert!(Format::default().is_empty());
        assert!(!Format::new(48_000, 2, 16).is_empty());
    }
}
