//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! The capture callback assembles the device's input into fixed-size mono PCM blocks
//! and hands them to the analysis pipeline through a blocking pull interface.
//!
//! ## Audio Configuration
//! - Sample Rate: 44.1 kHz
//! - Format: signed 16-bit
//! - Channels: Mono (1 channel)
//! - Block Size: 4096 samples (~93ms at 44.1kHz)

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use thiserror::Error;

/// Capture sample rate in Hz. Fixed system parameter.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of samples per analysis block.
///
/// Larger blocks provide more frequency resolution but increase latency.
pub const BLOCK_SIZE: usize = 4096;

/// Capture channel count. The pipeline only understands mono input.
pub const CHANNELS: u16 = 1;

/// One block of mono signed 16-bit PCM, exactly [`BLOCK_SIZE`] samples long.
pub type SampleBlock = Vec<i16>;

/// Errors originating from the audio input device.
///
/// All variants are fatal to the analysis cycle: a failed or partial read
/// must surface to the pipeline driver instead of feeding garbled PCM to
/// the estimator.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No audio input device found.
    #[error("no audio input device available")]
    NoInputDevice,

    /// The device offers no mono 16-bit layout covering the fixed rate.
    #[error("input device has no mono 16-bit layout covering {SAMPLE_RATE} Hz")]
    UnsupportedFormat,

    /// Querying the device's supported formats failed.
    #[error("failed to enumerate input formats: {0}")]
    Formats(#[from] cpal::SupportedStreamConfigsError),

    /// Opening the input stream failed.
    #[error("failed to open input stream: {0}")]
    Open(#[from] cpal::BuildStreamError),

    /// Starting the input stream failed.
    #[error("failed to start input stream: {0}")]
    Start(#[from] cpal::PlayStreamError),

    /// The running stream reported an error (device disconnected,
    /// unrecoverable underrun).
    #[error("input stream failed: {0}")]
    Stream(#[from] cpal::StreamError),

    /// The capture side hung up.
    #[error("input stream closed")]
    Closed,
}

/// A blocking source of fixed-size mono PCM sample blocks.
///
/// `read_block` waits until a full fresh block is available. Implementations
/// must never return a partial block; on any device failure they return a
/// [`DeviceError`] instead.
pub trait AudioSource {
    fn read_block(&mut self) -> Result<SampleBlock, DeviceError>;
}

/// Production [`AudioSource`] over the default CPAL input device.
///
/// The stream callback accumulates samples and forwards whole blocks over a
/// bounded channel holding at most one block; when the consumer lags, a
/// block is dropped rather than buffered. Stream errors travel over a
/// second channel so [`AudioSource::read_block`] can surface them.
pub struct CpalSource {
    // Held only to keep the capture stream alive.
    _stream: cpal::Stream,
    blocks: Receiver<SampleBlock>,
    errors: Receiver<cpal::StreamError>,
}

impl CpalSource {
    /// Opens the default input device and starts capturing.
    pub fn open() -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(DeviceError::NoInputDevice)?;

        log::info!(
            "using audio input device: {}",
            device.name().unwrap_or_else(|_| "<unknown>".to_string())
        );

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported =
            find_supported_config(configs).ok_or(DeviceError::UnsupportedFormat)?;
        let config: cpal::StreamConfig = supported
            .with_sample_rate(cpal::SampleRate(SAMPLE_RATE))
            .into();

        let (block_tx, block_rx) = crossbeam_channel::bounded::<SampleBlock>(1);
        let (err_tx, err_rx) = crossbeam_channel::bounded::<cpal::StreamError>(1);

        // This buffer accumulates audio data from the callback.
        let mut pending: Vec<i16> = Vec::with_capacity(BLOCK_SIZE * 2);

        let stream = device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                pending.extend_from_slice(data);

                // While we have enough data for a full block, hand it over.
                while pending.len() >= BLOCK_SIZE {
                    let block: SampleBlock = pending.drain(..BLOCK_SIZE).collect();
                    if block_tx.try_send(block).is_err() {
                        log::debug!("dropped a sample block, consumer is behind");
                    }
                }
            },
            move |err| {
                let _ = err_tx.try_send(err);
            },
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            blocks: block_rx,
            errors: err_rx,
        })
    }
}

impl AudioSource for CpalSource {
    fn read_block(&mut self) -> Result<SampleBlock, DeviceError> {
        crossbeam_channel::select! {
            recv(self.blocks) -> block => block.map_err(|_| DeviceError::Closed),
            recv(self.errors) -> err => match err {
                Ok(err) => Err(DeviceError::Stream(err)),
                Err(_) => Err(DeviceError::Closed),
            },
        }
    }
}

/// Finds an input configuration matching the fixed capture parameters:
/// mono, signed 16-bit, with a sample-rate range covering [`SAMPLE_RATE`].
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
) -> Option<SupportedStreamConfigRange> {
    configs.into_iter().find(|c| {
        c.channels() == CHANNELS
            && c.sample_format() == cpal::SampleFormat::I16
            && c.min_sample_rate().0 <= SAMPLE_RATE
            && c.max_sample_rate().0 >= SAMPLE_RATE
    })
}
