//! Microphone capture backed by cpal.
//!
//! The capture callback pushes mono samples into a bounded queue that the
//! graph drains once per tick through the [`SampleStream`] contract.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use soundwavez_core::{LiveStream, MicBackend, Result, SampleStream, VizError};

/// Roughly half a second of audio at 48 kHz; older samples are discarded.
const QUEUE_CAPACITY: usize = 24_000;

type SharedQueue = Arc<Mutex<VecDeque<f32>>>;

/// [`MicBackend`] that opens the host's default input device.
///
/// `request_stream` fails with `SourceUnavailable` when no device exists or
/// the platform denies capture access, leaving the graph without a source.
#[derive(Debug, Default)]
pub struct CpalMicBackend;

impl MicBackend for CpalMicBackend {
    fn request_stream(&mut self) -> Result<Box<dyn LiveStream>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| VizError::unavailable("no input device available"))?;
        let config = device
            .default_input_config()
            .map_err(|err| VizError::unavailable(format!("input config: {err}")))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels().max(1) as usize;
        let queue: SharedQueue = Arc::new(Mutex::new(VecDeque::new()));

        let stream = match config.sample_format() {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config.into(), channels, queue.clone())
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config.into(), channels, queue.clone())
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config.into(), channels, queue.clone())
            }
            other => Err(VizError::unavailable(format!(
                "unsupported sample format {other:?}"
            ))),
        }?;
        stream
            .play()
            .map_err(|err| VizError::unavailable(format!("capture start: {err}")))?;

        tracing::info!(sample_rate, channels, "microphone capture started");
        Ok(Box::new(CpalMicStream {
            stream: Some(stream),
            queue,
            sample_rate,
        }))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    queue: SharedQueue,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut queue) = queue.lock() {
                    for frame in data.chunks(channels) {
                        queue.push_back(frame[0].to_sample::<f32>());
                    }
                    while queue.len() > QUEUE_CAPACITY {
                        queue.pop_front();
                    }
                }
            },
            |err| tracing::warn!(%err, "mic stream error"),
            None,
        )
        .map_err(|err| VizError::unavailable(format!("microphone unavailable: {err}")))
}

struct CpalMicStream {
    stream: Option<cpal::Stream>,
    queue: SharedQueue,
    sample_rate: u32,
}

impl SampleStream for CpalMicStream {
    fn next_block(&mut self, out: &mut [f32]) -> usize {
        let Ok(mut queue) = self.queue.lock() else {
            return 0;
        };
        let count = queue.len().min(out.len());
        for slot in out[..count].iter_mut() {
            *slot = queue.pop_front().unwrap_or(0.0);
        }
        count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl LiveStream for CpalMicStream {
    fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("microphone capture stopped");
        }
    }
}

impl Drop for CpalMicStream {
    fn drop(&mut self) {
        self.stop();
    }
}
