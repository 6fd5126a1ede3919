//! cpal output path: buffer registry, frame-locked clock, and the mixer
//! that renders scheduled claps.
//!
//! The scheduler and the mixer share one timebase: an atomic frame counter
//! advanced by the audio callback. `FrameClock` divides it by the sample
//! rate, so "now" in scheduling code is exactly the instant the device is
//! rendering, and emission instants convert to frame positions losslessly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use ovation_core::config::SourceMode;
use ovation_core::error::PlaybackError;
use ovation_core::schedule::{BufferHandle, Clock, PlaybackSink, SoundSource};

use crate::claps::{self, CLAP_VARIANTS};

/// Immutable pool of playable buffers, shared by the bank and the sink.
pub struct BufferRegistry {
    buffers: Vec<Arc<Vec<f32>>>,
}

impl BufferRegistry {
    fn get(&self, handle: BufferHandle) -> Option<Arc<Vec<f32>>> {
        self.buffers.get(handle.0).cloned()
    }
}

/// One clap in flight: sample playback with linear-interpolated pitch step.
struct ActiveClap {
    buffer: Arc<Vec<f32>>,
    position: f64,
    step: f64,
    volume: f32,
    start_frame: u64,
}

#[derive(Default)]
struct MixerState {
    active: Vec<ActiveClap>,
}

/// Clock derived from the output stream's frame counter.
#[derive(Clone)]
pub struct FrameClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl Clock for FrameClock {
    fn now_sec(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64 / self.sample_rate
    }
}

/// Resolves variants and modes into registry handles.
pub struct ClapBank {
    registry: Arc<BufferRegistry>,
    sample_base: usize,
    stomp: usize,
    custom: Option<usize>,
}

impl SoundSource for ClapBank {
    fn variant_count(&self) -> usize {
        CLAP_VARIANTS
    }

    fn resolve(&mut self, variant: usize, mode: SourceMode, beat: u64) -> Option<BufferHandle> {
        match mode {
            SourceMode::Synthesized => Some(BufferHandle(variant % CLAP_VARIANTS)),
            SourceMode::Sample => Some(BufferHandle(self.sample_base + variant % CLAP_VARIANTS)),
            SourceMode::Footstomp => Some(BufferHandle(self.stomp)),
            // Custom stays silent until a sample is actually loaded.
            SourceMode::CustomUpload => self.custom.map(BufferHandle),
            SourceMode::Pattern => match beat % 4 {
                0 | 1 => Some(BufferHandle(self.stomp)),
                2 => Some(BufferHandle(variant % CLAP_VARIANTS)),
                _ => None, // rest
            },
        }
    }
}

/// Pushes scheduled claps into the mixer, clamping past instants to now.
pub struct MixerSink {
    registry: Arc<BufferRegistry>,
    shared: Arc<Mutex<MixerState>>,
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl PlaybackSink for MixerSink {
    fn play(
        &mut self,
        handle: BufferHandle,
        pitch: f32,
        volume: f32,
        when_sec: f64,
    ) -> Result<(), PlaybackError> {
        let buffer = self
            .registry
            .get(handle)
            .ok_or(PlaybackError::UnknownBuffer(handle))?;
        let now_frame = self.frames.load(Ordering::Relaxed);
        let start_frame = ((when_sec * self.sample_rate) as u64).max(now_frame);
        let mut state = self
            .shared
            .lock()
            .map_err(|_| PlaybackError::Backend("mixer state poisoned".into()))?;
        state.active.push(ActiveClap {
            buffer,
            position: 0.0,
            step: pitch as f64,
            volume,
            start_frame,
        });
        Ok(())
    }
}

/// Sink for `--dry-run`: counts and logs emissions without a device.
#[derive(Default)]
pub struct LoggingSink {
    pub emitted: usize,
}

impl PlaybackSink for LoggingSink {
    fn play(
        &mut self,
        handle: BufferHandle,
        pitch: f32,
        volume: f32,
        when_sec: f64,
    ) -> Result<(), PlaybackError> {
        self.emitted += 1;
        log::debug!(
            "clap {handle:?} pitch {pitch:.3} volume {volume:.3} at {when_sec:.3}s"
        );
        Ok(())
    }
}

/// Build the shared buffer registry and its mode-aware bank.
pub fn build_bank(sample_rate: u32, custom: Option<Vec<f32>>) -> (Arc<BufferRegistry>, ClapBank) {
    let mut buffers: Vec<Arc<Vec<f32>>> = Vec::new();
    for buf in claps::clap_pool(sample_rate) {
        buffers.push(Arc::new(buf));
    }
    let sample_base = buffers.len();
    for buf in claps::sample_pool(sample_rate) {
        buffers.push(Arc::new(buf));
    }
    let stomp = buffers.len();
    buffers.push(Arc::new(claps::footstomp(sample_rate)));
    let custom = custom.map(|buf| {
        buffers.push(Arc::new(buf));
        buffers.len() - 1
    });
    let registry = Arc::new(BufferRegistry { buffers });
    let bank = ClapBank {
        registry: Arc::clone(&registry),
        sample_base,
        stomp,
        custom,
    };
    (registry, bank)
}

/// Running output stream plus the injected services built around it.
pub struct AudioOutput {
    // Held for its Drop; the stream stops when this is dropped.
    _stream: cpal::Stream,
    pub clock: FrameClock,
    pub bank: ClapBank,
    pub sink: MixerSink,
}

/// Open the default output device and wire the mixer to it.
pub fn start_output(custom: Option<Vec<f32>>) -> anyhow::Result<AudioOutput> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no audio output device available")?;
    let config = device
        .default_output_config()
        .context("querying default output config")?;
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    log::info!(
        "audio output: {} Hz, {} channel(s), {:?}",
        sample_rate,
        channels,
        config.sample_format()
    );

    let (registry, bank) = build_bank(sample_rate, custom);
    let shared = Arc::new(Mutex::new(MixerState::default()));
    let frames = Arc::new(AtomicU64::new(0));

    let err_fn = |err| log::error!("audio stream error: {err}");
    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream_f32(
            &device,
            &config.into(),
            channels,
            Arc::clone(&shared),
            Arc::clone(&frames),
            err_fn,
        )?,
        cpal::SampleFormat::I16 => build_stream_i16(
            &device,
            &config.into(),
            channels,
            Arc::clone(&shared),
            Arc::clone(&frames),
            err_fn,
        )?,
        other => anyhow::bail!("unsupported output sample format {other:?}"),
    };
    stream.play().context("starting output stream")?;

    let clock = FrameClock {
        frames: Arc::clone(&frames),
        sample_rate: sample_rate as f64,
    };
    let sink = MixerSink {
        registry,
        shared,
        frames,
        sample_rate: sample_rate as f64,
    };
    Ok(AudioOutput {
        _stream: stream,
        clock,
        bank,
        sink,
    })
}

/// Render one mono frame and advance every active clap.
fn mix_frame(state: &mut MixerState, frame: u64) -> f32 {
    let mut acc = 0.0f32;
    let mut i = 0usize;
    while i < state.active.len() {
        let clap = &mut state.active[i];
        if frame < clap.start_frame {
            i += 1;
            continue;
        }
        let pos = clap.position as usize;
        if pos + 1 >= clap.buffer.len() {
            state.active.swap_remove(i);
            continue;
        }
        let frac = (clap.position - pos as f64) as f32;
        let s = clap.buffer[pos] * (1.0 - frac) + clap.buffer[pos + 1] * frac;
        acc += s * clap.volume;
        clap.position += clap.step;
        i += 1;
    }
    // Soft-clip the sum; hundreds of coincident claps otherwise fold over.
    acc.tanh()
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    shared: Arc<Mutex<MixerState>>,
    frames: Arc<AtomicU64>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, anyhow::Error> {
    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _| {
            let mut state = match shared.lock() {
                Ok(state) => state,
                Err(_) => return,
            };
            for frame_samples in data.chunks_mut(channels) {
                let frame = frames.fetch_add(1, Ordering::Relaxed);
                let s = mix_frame(&mut state, frame);
                for out in frame_samples {
                    *out = s;
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    shared: Arc<Mutex<MixerState>>,
    frames: Arc<AtomicU64>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, anyhow::Error> {
    let stream = device.build_output_stream(
        config,
        move |data: &mut [i16], _| {
            let mut state = match shared.lock() {
                Ok(state) => state,
                Err(_) => return,
            };
            for frame_samples in data.chunks_mut(channels) {
                let frame = frames.fetch_add(1, Ordering::Relaxed);
                let s = (mix_frame(&mut state, frame) * i16::MAX as f32) as i16;
                for out in frame_samples {
                    *out = s;
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
