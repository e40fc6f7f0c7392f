use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::{info, warn};

use crate::config::AudioSection;
use crate::engine::OutputSink;
use crate::error::{Error, Result};

/// Blocks of headroom between the render thread and the device callback.
const RING_BLOCKS: usize = 8;

/// Output sink feeding the default (or a named) audio device.
///
/// Mono blocks go into a lock-free ring; the device callback pulls from it
/// and copies each sample to every channel. `write` waits up to the
/// configured timeout for room, which is what paces the render loop.
pub struct CpalSink {
    _stream: cpal::Stream,
    tx: Producer<i16>,
    timeout: Duration,
    starved: Arc<AtomicU64>,
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    let Some(name) = name else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };
    let devices = host
        .output_devices()
        .map_err(|e| Error::Audio(e.to_string()))?;
    for device in devices {
        if device.name().is_ok_and(|n| n == name) {
            return Ok(device);
        }
    }
    Err(Error::NoDevice)
}

impl CpalSink {
    pub fn open(audio: &AudioSection) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_device(&host, audio.device.as_deref())?;
        let default = device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?;

        let channels = default.channels() as usize;
        if default.sample_rate().0 != audio.sample_rate {
            warn!(
                device_rate = default.sample_rate().0,
                requested = audio.sample_rate,
                "device default rate differs, requesting configured rate"
            );
        }
        let config = cpal::StreamConfig {
            channels: default.channels(),
            sample_rate: cpal::SampleRate(audio.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, mut rx) = RingBuffer::<i16>::new(audio.block_size * RING_BLOCKS);
        let starved = Arc::new(AtomicU64::new(0));
        let starved_cb = starved.clone();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    let mut missing = 0;
                    for frame in data.chunks_mut(channels) {
                        let s = match rx.pop() {
                            Ok(s) => f32::from(s) / 32_768.0,
                            Err(_) => {
                                missing += 1;
                                0.0
                            }
                        };
                        frame.fill(s);
                    }
                    if missing > 0 {
                        starved_cb.fetch_add(missing, Ordering::Relaxed);
                    }
                },
                |err| warn!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = audio.sample_rate,
            channels,
            "audio output open"
        );

        Ok(Self {
            _stream: stream,
            tx,
            timeout: Duration::from_millis(audio.write_timeout_ms),
            starved,
        })
    }

}

impl OutputSink for CpalSink {
    fn write(&mut self, samples: &[i16]) -> usize {
        let deadline = Instant::now() + self.timeout;
        let mut written = 0;
        while written < samples.len() {
            let room = self.tx.slots().min(samples.len() - written);
            if room == 0 {
                if Instant::now() >= deadline {
                    break;
                }
                thread::sleep(Duration::from_millis(1));
                continue;
            }
            if let Ok(chunk) = self.tx.write_chunk_uninit(room) {
                let n = chunk.fill_from_iter(samples[written..].iter().copied());
                written += n;
            }
        }
        written
    }

    /// Frames the device asked for while the ring was empty.
    fn starved_frames(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }
}
