//! Procedural clap and stomp buffers.
//!
//! Each variant is a short seeded noise burst with an exponential decay and
//! a per-variant brightness, so a crowd of identical generators still reads
//! as many different hands. Generation is deterministic per seed.

use std::path::Path;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of distinct clap variants in the synthesized pool.
pub const CLAP_VARIANTS: usize = 8;

const CLAP_DURATION_SEC: f32 = 0.08;
const STOMP_DURATION_SEC: f32 = 0.14;

/// Generate the synthesized clap pool: brighter, snappier variants first.
pub fn clap_pool(sample_rate: u32) -> Vec<Vec<f32>> {
    (0..CLAP_VARIANTS)
        .map(|v| {
            let brightness = 0.35 + 0.06 * v as f32;
            let decay = 55.0 + 4.0 * v as f32;
            clap_burst(sample_rate, 0xC1A9 + v as u64, brightness, decay)
        })
        .collect()
}

/// A darker, rounder pool standing in for recorded clap samples.
pub fn sample_pool(sample_rate: u32) -> Vec<Vec<f32>> {
    (0..CLAP_VARIANTS)
        .map(|v| {
            let brightness = 0.12 + 0.03 * v as f32;
            let decay = 35.0 + 3.0 * v as f32;
            clap_burst(sample_rate, 0x5A3E + v as u64, brightness, decay)
        })
        .collect()
}

/// One clap: white noise through a one-pole lowpass with exponential decay.
fn clap_burst(sample_rate: u32, seed: u64, brightness: f32, decay: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * CLAP_DURATION_SEC) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(num_samples);
    let mut lp = 0.0f32;
    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let noise: f32 = rng.gen_range(-1.0..1.0);
        lp += brightness * (noise - lp);
        out.push(lp * (-t * decay).exp());
    }
    out
}

/// A foot stomp: a pitch-dropping low sine plus a soft noise transient.
pub fn footstomp(sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * STOMP_DURATION_SEC) as usize;
    let mut rng = StdRng::seed_from_u64(0xF007);
    let mut out = Vec::with_capacity(num_samples);
    let mut phase = 0.0f32;
    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let freq = 110.0 * (-t * 9.0).exp() + 45.0;
        phase += 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        let thump = phase.sin() * (-t * 22.0).exp();
        let scuff: f32 = rng.gen_range(-1.0..1.0) * 0.15 * (-t * 90.0).exp();
        out.push(thump * 0.9 + scuff);
    }
    out
}

/// Load a user-supplied clap from a WAV file, mixed down to mono and
/// normalized to peak 1.0.
pub fn load_wav(path: &Path) -> anyhow::Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening clap sample {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("decoding float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("decoding integer samples")?
        }
    };
    let mut mono: Vec<f32> = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    let peak = mono.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        for s in &mut mono {
            *s /= peak;
        }
    }
    anyhow::ensure!(!mono.is_empty(), "clap sample {} is empty", path.display());
    Ok(mono)
}
