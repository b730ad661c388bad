use crate::audio::Format;
use crate::decode::{DecodeError, DecodedSource};
use crate::resample::RateAdapter;

/// One queued track
///
/// Owns its source through the rate adapter. `paused` is only touched while
/// the queue's exclusion lock is held.
pub struct TrackSlot {
    adapter: RateAdapter<Box<dyn DecodedSource>>,
    name: String,
    paused: bool,
    /// A contract violation has already been reported for this slot
    warned: bool,
}

impl TrackSlot {
    pub fn new(source: Box<dyn DecodedSource>, name: impl Into<String>) -> Self {
        Self {
            adapter: RateAdapter::to_output(source),
            name: name.into(),
            paused: false,
            warned: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn format(&self) -> Format {
        self.adapter.format()
    }

    /// Source frames played so far
    pub fn position(&self) -> u64 {
        self.adapter.source().position()
    }

    /// Total source frames, 0 when unknown
    pub fn len(&self) -> u64 {
        self.adapter.source().len()
    }

    pub fn source(&self) -> &dyn DecodedSource {
        &**self.adapter.source()
    }

    pub(crate) fn adapter_mut(&mut self) -> &mut RateAdapter<Box<dyn DecodedSource>> {
        &mut self.adapter
    }

    /// Returns true the first time it is called
    pub(crate) fn first_warning(&mut self) -> bool {
        !std::mem::replace(&mut self.warned, true)
    }

    /// Close the source, keeping any decode failure it ended with
    pub(crate) fn close(mut self) -> Option<DecodeError> {
        let failure = self.adapter.take_err();
        if let Err(e) = self.adapter.close() {
            log::warn!("Failed to close '{}': {}", self.name, e);
        }
        failure
    }
}

impl std::fmt::Debug for TrackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSlot")
            .field("name", &self.name)
            .field("paused", &self.paused)
            .field("position", &self.position())
            .field("len", &self.len())
            .finish()
    }
}
