//! Rate normalization
//!
//! Every track reaching the queue is adapted to [`SampleRate::OUTPUT`]:
//! - source already at the output rate: passthrough, frames are copied as is
//! - otherwise: linear interpolation between neighbouring source frames
//!
//! The interpolation window is allocated once per track; streaming never
//! allocates.

use crate::audio::{Format, Frame, SampleRate};
use crate::decode::{DecodeError, DecodedSource};

/// Source frames pulled per refill
const CHUNK_FRAMES: usize = 1024;

/// Adapts a [`DecodedSource`] to a fixed output rate
///
/// Owns the source; closing the adapter closes the source. `position`/`len`
/// are reported in source frames, so progress math uses the source format.
pub struct RateAdapter<S: DecodedSource> {
    source: S,
    mode: Mode,
}

enum Mode {
    Passthrough,
    Linear(Linear),
}

/// Linear interpolation state
struct Linear {
    /// Source frames consumed per output frame
    step: f64,
    window: Box<[Frame]>,
    /// Valid frames in `window`
    len: usize,
    /// Read position relative to `window[0]`
    pos: f64,
    /// Source has reported its end
    drained: bool,
    /// Source stalled after some frames went out; reported on the next call
    stalled: bool,
}

impl<S: DecodedSource> RateAdapter<S> {
    pub fn new(source: S, to: SampleRate) -> Self {
        let from = source.format().sample_rate;
        let mode = if from == to || from.hz() == 0 || to.hz() == 0 {
            Mode::Passthrough
        } else {
            log::debug!("Resampling {} -> {}", from, to);
            Mode::Linear(Linear {
                step: from.hz() as f64 / to.hz() as f64,
                // one extra frame carries the interpolation neighbour across refills
                window: vec![[0.0; 2]; CHUNK_FRAMES + 1].into_boxed_slice(),
                len: 0,
                pos: 0.0,
                drained: false,
                stalled: false,
            })
        };
        Self { source, mode }
    }

    /// Adapter to [`SampleRate::OUTPUT`]
    pub fn to_output(source: S) -> Self {
        Self::new(source, SampleRate::OUTPUT)
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.mode, Mode::Passthrough)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn format(&self) -> Format {
        self.source.format()
    }

    /// Fill `out` with frames at the target rate
    ///
    /// Same contract as [`DecodedSource::stream`].
    pub fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        match &mut self.mode {
            Mode::Passthrough => self.source.stream(out),
            Mode::Linear(linear) => linear.stream(&mut self.source, out),
        }
    }

    pub fn take_err(&mut self) -> Option<DecodeError> {
        self.source.take_err()
    }

    pub fn close(&mut self) -> Result<(), DecodeError> {
        self.source.close()
    }
}

impl Linear {
    fn stream<S: DecodedSource>(&mut self, source: &mut S, out: &mut [Frame]) -> (usize, bool) {
        if std::mem::take(&mut self.stalled) {
            return (0, true);
        }

        let mut filled = 0;

        while filled < out.len() {
            let i = self.pos as usize;

            if i + 1 < self.len {
                let frac = (self.pos - i as f64) as f32;
                let (a, b) = (self.window[i], self.window[i + 1]);
                out[filled] = [
                    a[0] + (b[0] - a[0]) * frac,
                    a[1] + (b[1] - a[1]) * frac,
                ];
                filled += 1;
                self.pos += self.step;
                continue;
            }

            if self.drained {
                // last source frame has no right neighbour, hold it
                if i < self.len {
                    out[filled] = self.window[i];
                    filled += 1;
                    self.pos += self.step;
                    continue;
                }
                break;
            }

            if self.refill(source, i) == 0 && !self.drained {
                // no progress and no end: the caller decides what to do with a stall
                self.stalled = filled > 0;
                break;
            }
        }

        let exhausted = self.drained && (self.pos as usize) >= self.len;
        (filled, !exhausted)
    }

    /// Keep the frames from `keep_from` on and pull more from the source
    ///
    /// Returns the number of frames pulled.
    fn refill<S: DecodedSource>(&mut self, source: &mut S, keep_from: usize) -> usize {
        let keep_from = keep_from.min(self.len);
        self.window.copy_within(keep_from..self.len, 0);
        self.len -= keep_from;
        self.pos -= keep_from as f64;

        let (n, ok) = source.stream(&mut self.window[self.len..]);
        let n = n.min(self.window.len() - self.len);
        self.len += n;
        if !ok {
            self.drained = true;
        }
        n
    }
}
