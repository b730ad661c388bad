//! System audio device output (cpal)
//!
//! The data callback streams straight from the [`Player`] under its lock and
//! maps the stereo frames onto whatever channel count the device has:
//! - mono device: average of left and right
//! - stereo and wider: left/right on the first two channels, silence elsewhere

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::format::{Frame, SILENCE};
use super::output::{OutputConfig, OutputError};
use super::stats::PlaybackStats;
use crate::engine::Player;

/// Frames preallocated for the callback scratch buffer
const SCRATCH_FRAMES: usize = 8192;

/// Playing cpal stream; dropping it stops playback
pub struct DeviceOutput {
    _stream: cpal::Stream,
    stats: Arc<PlaybackStats>,
}

impl DeviceOutput {
    pub fn start(player: Player, config: &OutputConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| OutputError::Device(e.to_string()))?;

        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: config.sample_rate.hz(),
            buffer_size: cpal::BufferSize::Default,
        };
        let stats = Arc::new(PlaybackStats::new());

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, player, &stats),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, player, &stats),
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, player, &stats),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, player, &stats),
            other => Err(OutputError::Device(format!("unsupported sample format: {other:?}"))),
        }?;
        stream
            .play()
            .map_err(|e| OutputError::Device(e.to_string()))?;

        log::info!(
            "Device output started: {}ch at {}",
            stream_config.channels,
            config.sample_rate
        );

        Ok(Self {
            _stream: stream,
            stats,
        })
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.stats)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    player: Player,
    stats: &Arc<PlaybackStats>,
) -> Result<cpal::Stream, OutputError>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let stats = Arc::clone(stats);
    let mut scratch: Vec<Frame> = vec![SILENCE; SCRATCH_FRAMES];

    let err_fn = |err| log::warn!("Output stream error: {}", err);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                if scratch.len() < frames {
                    // device block larger than expected; grows once
                    scratch.resize(frames, SILENCE);
                }
                let buf = &mut scratch[..frames];
                let audible = player.fill(buf);
                stats.on_callback(frames, frames - audible);

                for (out, frame) in data.chunks_exact_mut(channels).zip(buf.iter()) {
                    for (ch, sample) in out.iter_mut().enumerate() {
                        let value = match (channels, ch) {
                            (1, _) => 0.5 * (frame[0] + frame[1]),
                            (_, 0) | (_, 1) => frame[ch],
                            _ => 0.0,
                        };
                        *sample = <T as cpal::Sample>::from_sample::<f32>(value);
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| OutputError::Device(e.to_string()))
}
