//! Decoding collaborators
//!
//! The playback core only sees [`DecodedSource`]: a pull-based producer of
//! stereo frames. How a file becomes a source is decided here, once, by
//! extension through [`DecoderRegistry`].

pub mod decoder;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

use crate::audio::{Format, Frame};

pub use decoder::SymphoniaSource;

/// Decode errors
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),
    #[error("unsupported audio format: {0}")]
    Unsupported(String),
    #[error("no audio track found")]
    NoAudioTrack,
    #[error("failed to create decoder: {0}")]
    DecoderCreation(String),
    #[error("decode failed: {0}")]
    DecodeFailed(String),
}

/// A decoded audio track that can be pulled frame by frame
///
/// `stream` fills `buf` from the front and returns `(n, ok)`. `ok == false`
/// means the source is finished; it may come together with the last `n > 0`
/// frames. A source that stops because of a decode failure reports
/// `ok == false` and hands the failure out once through `take_err`.
pub trait DecodedSource: Send {
    fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool);

    /// Frames produced so far
    fn position(&self) -> u64;

    /// Total frames in the track, 0 when unknown
    fn len(&self) -> u64;

    fn format(&self) -> Format;

    fn take_err(&mut self) -> Option<DecodeError> {
        None
    }

    fn close(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl<S: DecodedSource + ?Sized> DecodedSource for Box<S> {
    fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
        (**self).stream(buf)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    fn format(&self) -> Format {
        (**self).format()
    }

    fn take_err(&mut self) -> Option<DecodeError> {
        (**self).take_err()
    }

    fn close(&mut self) -> Result<(), DecodeError> {
        (**self).close()
    }
}

/// Opens a file as a ready-to-stream source
pub type Opener = fn(&Path) -> Result<Box<dyn DecodedSource>, DecodeError>;

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg"];

/// Maps file extensions to decoders
pub struct DecoderRegistry {
    openers: HashMap<String, Opener>,
}

impl DecoderRegistry {
    /// Registry with no decoders
    pub fn empty() -> Self {
        Self {
            openers: HashMap::new(),
        }
    }

    /// Register `opener` for `ext` (case-insensitive, without the dot)
    pub fn register(&mut self, ext: &str, opener: Opener) {
        self.openers.insert(ext.to_lowercase(), opener);
    }

    pub fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.openers.contains_key(&ext))
    }

    /// Open `path` with the decoder registered for its extension
    pub fn open(&self, path: &Path) -> Result<Box<dyn DecodedSource>, DecodeError> {
        let ext = extension_of(path).unwrap_or_default();
        let opener = self
            .openers
            .get(&ext)
            .ok_or_else(|| DecodeError::Unsupported(path.display().to_string()))?;
        opener(path)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for ext in AUDIO_EXTENSIONS {
            registry.register(ext, SymphoniaSource::open_boxed);
        }
        registry
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_lowercase())
}
