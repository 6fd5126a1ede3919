//! Native frontend: hear what a probability distribution sounds like.
//!
//! Runs the crowd-clap engine against the default audio output, polling the
//! scheduler on its coarse tick interval while the cpal callback renders
//! the scheduled claps. Finishes with a summary of the offsets actually
//! drawn so the audible texture can be compared with the theoretical shape.

mod audio;
mod claps;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;

use ovation_core::config::{EngineConfig, SourceMode};
use ovation_core::constants::TICK_INTERVAL_MS;
use ovation_core::events::ClapEvent;
use ovation_core::sampler::OffsetDistribution;
use ovation_core::schedule::{ClapScheduler, Clock, PlaybackSink, SoundSource, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "ovation", about = "Simulated crowd clapping in rhythm")]
struct Args {
    /// Tempo in beats per minute (40-240)
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,

    /// Number of clappers (1-500)
    #[arg(long, default_value_t = 30)]
    crowd: usize,

    /// Timing spread in milliseconds (0-200)
    #[arg(long, default_value_t = 20.0)]
    spread: f64,

    /// Offset distribution: normal, uniform, exponential, laplace, beta
    #[arg(long, default_value = "normal")]
    distribution: String,

    /// Beta shape parameter alpha (beta distribution only)
    #[arg(long, default_value_t = 2.0)]
    alpha: f64,

    /// Beta shape parameter beta (beta distribution only)
    #[arg(long, default_value_t = 2.0)]
    beta: f64,

    /// Sound source: synthesized, sample, footstomp, custom, pattern
    #[arg(long, default_value = "synthesized")]
    mode: String,

    /// Master volume (0-1)
    #[arg(long, default_value_t = 0.8)]
    volume: f32,

    /// How long to run, in seconds
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// RNG seed; omit for a different crowd every run
    #[arg(long)]
    seed: Option<u64>,

    /// WAV file used by the custom sound mode
    #[arg(long)]
    clap_wav: Option<PathBuf>,

    /// Schedule without opening an audio device, logging emissions instead
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let args = Args::parse();

    let mut distribution = OffsetDistribution::from_name(&args.distribution);
    if let OffsetDistribution::Beta { alpha, beta } = &mut distribution {
        *alpha = args.alpha;
        *beta = args.beta;
    }
    let config = EngineConfig {
        bpm: args.bpm,
        crowd_size: args.crowd,
        spread_ms: args.spread,
        distribution,
        source_mode: SourceMode::from_name(&args.mode),
        master_volume: args.volume,
    }
    .clamped();
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!(
        "{} clappers at {} bpm, {:?} spread {} ms, seed {seed}",
        config.crowd_size,
        config.bpm,
        config.distribution,
        config.spread_ms
    );

    let custom = match &args.clap_wav {
        Some(path) => Some(claps::load_wav(path)?),
        None => None,
    };

    let events = if args.dry_run {
        let (_registry, mut bank) = audio::build_bank(48000, custom);
        let mut sink = audio::LoggingSink::default();
        let events = run(SystemClock::new(), &config, &mut bank, &mut sink, args.duration, seed);
        log::info!("dry run emitted {} claps", sink.emitted);
        events
    } else {
        let mut output = audio::start_output(custom)?;
        let clock = output.clock.clone();
        let events = run(clock, &config, &mut output.bank, &mut output.sink, args.duration, seed);
        // Let the last scheduled claps ring out before the stream drops.
        thread::sleep(Duration::from_millis(400));
        events
    };

    print_summary(&config, &events);
    Ok(())
}

/// Drive the scheduler at its polling period for `duration` seconds.
fn run<C: Clock>(
    clock: C,
    config: &EngineConfig,
    source: &mut dyn SoundSource,
    sink: &mut dyn PlaybackSink,
    duration: f64,
    seed: u64,
) -> Vec<ClapEvent> {
    let mut scheduler = ClapScheduler::new(clock, seed);
    scheduler.start();
    while scheduler.is_running() {
        scheduler.tick(config, source, sink);
        if scheduler.next_beat_time() > duration {
            scheduler.stop();
            break;
        }
        thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
    }
    scheduler.recent_events().to_vec()
}

/// Compare the drawn offsets against the configured distribution.
fn print_summary(config: &EngineConfig, events: &[ClapEvent]) {
    let beats: usize = {
        let mut distinct = 0usize;
        let mut last = f64::NEG_INFINITY;
        for ev in events {
            if ev.beat_time != last {
                distinct += 1;
                last = ev.beat_time;
            }
        }
        distinct
    };
    println!("beats scheduled:  {beats}");
    println!("claps emitted:    {}", events.len());
    if events.is_empty() {
        return;
    }
    let n = events.len() as f64;
    let mean = events.iter().map(|e| e.offset_ms).sum::<f64>() / n;
    let var = events
        .iter()
        .map(|e| (e.offset_ms - mean) * (e.offset_ms - mean))
        .sum::<f64>()
        / n;
    println!("offset mean:      {mean:+.2} ms");
    println!("offset std dev:   {:.2} ms", var.sqrt());
    println!(
        "configured:       {:?}, spread {} ms",
        config.distribution, config.spread_ms
    );
}
