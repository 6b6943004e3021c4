//! # Audio Capture Module
//!
//! Real-time capture from the default input device using CPAL
//! (Cross-Platform Audio Library).
//!
//! The capture callback accumulates interleaved `f32` frames and, whenever a
//! full block is available, de-interleaves it into a planar [`SampleBlock`]
//! and hands it to the processing thread. The callback never blocks: if the
//! processing thread falls behind, blocks are dropped.

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Sender, TrySendError};

use crate::config::PitchConfig;
use crate::pipeline::SampleBlock;

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `sender` - Channel for delivering blocks to the processing thread
/// * `config` - Supplies the requested sample rate and the block size
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and the actual rate
/// * `Err(e)` - No device, no `f32` format, or the stream failed to start
pub fn start_audio_capture(
    sender: Sender<SampleBlock>,
    config: &PitchConfig,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, config.sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = cpal::SampleRate(config.sample_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    ));
    let stream_config = supported_config.with_sample_rate(sample_rate);
    let sample_rate_val = stream_config.sample_rate().0;
    let channel_count = stream_config.channels() as usize;
    let stream_config: cpal::StreamConfig = stream_config.into();

    log::info!(
        "[AUDIO] {} Hz, {} channel(s), {} frames per block",
        sample_rate_val,
        channel_count,
        config.block_size
    );

    let err_fn = |err| log::error!("[AUDIO] Stream error: {}", err);

    let block_samples = config.block_size * channel_count;
    let mut pending: Vec<f32> = Vec::with_capacity(block_samples * 2);
    let mut dropped: u64 = 0;

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            pending.extend_from_slice(data);

            while pending.len() >= block_samples {
                let block = SampleBlock::from_interleaved(&pending[..block_samples], channel_count);
                pending.drain(..block_samples);

                match sender.try_send(block) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        if dropped.is_power_of_two() {
                            log::warn!("[AUDIO] Processing is behind, {} blocks dropped", dropped);
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Picks the `f32` input configuration whose rate range is closest to
/// `target_rate`, preferring fewer channels on a tie.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            (
                rate_distance(c.min_sample_rate().0, c.max_sample_rate().0, target_rate),
                c.channels(),
            )
        })
}

/// Distance from `target` to the closed range `[min, max]`.
fn rate_distance(min: u32, max: u32, target: u32) -> u32 {
    if target < min {
        min - target
    } else {
        target.saturating_sub(max)
    }
}
