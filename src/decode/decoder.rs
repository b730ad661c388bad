//! Audio file decoder
//!
//! Uses symphonia to decode MP3, WAV, FLAC and Ogg Vorbis into stereo `f32`
//! frames.
//!
//! Design goals:
//! - pull based: packets are decoded only when the output asks for frames
//! - precise end of stream: the call that hands out the last frames already
//!   reports `ok == false`
//! - allocation settles after the first packet (buffers are reused)

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{DecodeError, DecodedSource};
use crate::audio::{Format, Frame};

/// Audio file information
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u32,
    /// Bit depth of the original encoding
    pub bit_depth: Option<u32>,
    /// Total frames (if known)
    pub total_frames: Option<u64>,
    pub duration_secs: Option<f64>,
    /// Container name (taken from the extension)
    pub format: String,
    pub codec: String,
}

/// Symphonia-backed [`DecodedSource`]
pub struct SymphoniaSource {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: AudioInfo,
    /// Interleaved conversion buffer, sized on the first packet
    sample_buf: Option<SampleBuffer<f32>>,
    /// Decoded frames of the current packet
    pending: Vec<Frame>,
    cursor: usize,
    position: u64,
    eof: bool,
    error: Option<DecodeError>,
}

impl SymphoniaSource {
    /// Open an audio file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let path = path.as_ref();

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions {
            enable_gapless: true,
            ..Default::default()
        };
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|_| DecodeError::Unsupported(path.display().to_string()))?;

        let reader = probed.format;
        // symphonia's container debug names are not user friendly
        let format_name = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| "Unknown".to_string());

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params.sample_rate.ok_or(DecodeError::NoAudioTrack)?;
        let channels = codec_params
            .channels
            .map(|c| c.count() as u32)
            .unwrap_or(2);
        let bit_depth = codec_params.bits_per_sample;
        let total_frames = codec_params.n_frames;
        let duration_secs = total_frames.map(|f| f as f64 / sample_rate as f64);

        let codec_name = symphonia::default::get_codecs()
            .get_codec(codec_params.codec)
            .map(|c| c.short_name.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::DecoderCreation(e.to_string()))?;

        let info = AudioInfo {
            sample_rate,
            channels,
            bit_depth,
            total_frames,
            duration_secs,
            format: format_name,
            codec: codec_name,
        };

        log::info!(
            "Opened {} | {} {} | {}Hz {}ch | {:.1}s",
            path.display(),
            info.format,
            info.codec,
            info.sample_rate,
            info.channels,
            info.duration_secs.unwrap_or(0.0)
        );

        Ok(Self {
            reader,
            decoder,
            track_id,
            info,
            sample_buf: None,
            pending: Vec::new(),
            cursor: 0,
            position: 0,
            eof: false,
            error: None,
        })
    }

    /// [`Opener`](super::Opener) for the decoder registry
    pub fn open_boxed(path: &Path) -> Result<Box<dyn DecodedSource>, DecodeError> {
        Ok(Box::new(Self::open(path)?))
    }

    /// Decode the next packet of our track into `pending`
    ///
    /// Returns `Ok(false)` at end of stream.
    fn decode_next(&mut self) -> Result<bool, DecodeError> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                // chained streams are not followed
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => return Err(DecodeError::DecodeFailed(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(msg)) => {
                    // corrupt frame, skip it
                    log::warn!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(DecodeError::DecodeFailed(e.to_string())),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            if decoded.frames() == 0 || channels == 0 {
                continue;
            }

            let needed = decoded.capacity() * channels;
            if self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < needed)
            {
                self.sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = self.sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            self.pending.clear();
            self.cursor = 0;
            self.pending.extend(buf.samples().chunks_exact(channels).map(|frame| {
                let left = frame[0];
                let right = if channels > 1 { frame[1] } else { left };
                [left, right]
            }));
            return Ok(true);
        }
    }

    /// Make sure `pending` has frames, decoding if needed
    ///
    /// Returns false once the stream has ended (normally or by error).
    fn ensure_pending(&mut self) -> bool {
        while self.cursor >= self.pending.len() {
            if self.eof {
                return false;
            }
            match self.decode_next() {
                Ok(true) => {}
                Ok(false) => self.eof = true,
                Err(e) => {
                    log::error!("Decoding stopped: {}", e);
                    self.error = Some(e);
                    self.eof = true;
                }
            }
        }
        true
    }
}

impl DecodedSource for SymphoniaSource {
    fn stream(&mut self, buf: &mut [Frame]) -> (usize, bool) {
        let mut filled = 0;
        while filled < buf.len() {
            if !self.ensure_pending() {
                break;
            }
            let n = (self.pending.len() - self.cursor).min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.pending[self.cursor..self.cursor + n]);
            self.cursor += n;
            filled += n;
        }
        self.position += filled as u64;

        // look ahead so the call delivering the final frames also reports the end
        let more = self.ensure_pending();
        (filled, more)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn len(&self) -> u64 {
        self.info.total_frames.unwrap_or(0)
    }

    fn format(&self) -> Format {
        Format::new(
            self.info.sample_rate,
            self.info.channels as u16,
            self.info.bit_depth.unwrap_or(0) as u16,
        )
    }

    fn take_err(&mut self) -> Option<DecodeError> {
        self.error.take()
    }

    fn close(&mut self) -> Result<(), DecodeError> {
        self.eof = true;
        self.pending = Vec::new();
        self.cursor = 0;
        self.sample_buf = None;
        Ok(())
    }
}
