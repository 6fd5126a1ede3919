// Transport and scheduling behavior under a hand-driven test clock.

use std::cell::Cell;
use std::rc::Rc;

use ovation_core::config::{EngineConfig, SourceMode};
use ovation_core::constants::{LOD_SAMPLE_COUNT, LOD_THRESHOLD};
use ovation_core::error::PlaybackError;
use ovation_core::sampler::OffsetDistribution;
use ovation_core::schedule::{BufferHandle, ClapScheduler, Clock, PlaybackSink, SoundSource};

/// Clock the test advances by hand.
#[derive(Clone)]
struct TestClock(Rc<Cell<f64>>);

impl TestClock {
    fn new() -> Self {
        TestClock(Rc::new(Cell::new(0.0)))
    }
    fn set(&self, t: f64) {
        self.0.set(t);
    }
}

impl Clock for TestClock {
    fn now_sec(&self) -> f64 {
        self.0.get()
    }
}

/// Source with eight variants; pattern mode resolves the shared
/// stomp/stomp/clap/rest cycle, everything else maps variants directly.
struct TestSource;

impl SoundSource for TestSource {
    fn variant_count(&self) -> usize {
        8
    }
    fn resolve(&mut self, variant: usize, mode: SourceMode, beat: u64) -> Option<BufferHandle> {
        match mode {
            SourceMode::Pattern => match beat % 4 {
                0 | 1 => Some(BufferHandle(100)), // stomp
                2 => Some(BufferHandle(101)),     // clap
                _ => None,                        // rest
            },
            _ => Some(BufferHandle(variant)),
        }
    }
}

/// Source whose assets never finish loading.
struct UnloadedSource;

impl SoundSource for UnloadedSource {
    fn variant_count(&self) -> usize {
        8
    }
    fn resolve(&mut self, _: usize, _: SourceMode, _: u64) -> Option<BufferHandle> {
        None
    }
}

#[derive(Default)]
struct RecordingSink {
    plays: Vec<(BufferHandle, f32, f32, f64)>,
}

impl PlaybackSink for RecordingSink {
    fn play(
        &mut self,
        handle: BufferHandle,
        pitch: f32,
        volume: f32,
        when_sec: f64,
    ) -> Result<(), PlaybackError> {
        self.plays.push((handle, pitch, volume, when_sec));
        Ok(())
    }
}

struct FailingSink;

impl PlaybackSink for FailingSink {
    fn play(&mut self, _: BufferHandle, _: f32, _: f32, _: f64) -> Result<(), PlaybackError> {
        Err(PlaybackError::Backend("device lost".into()))
    }
}

fn config(bpm: f64, crowd: usize, spread: f64) -> EngineConfig {
    EngineConfig {
        bpm,
        crowd_size: crowd,
        spread_ms: spread,
        distribution: OffsetDistribution::Uniform,
        source_mode: SourceMode::Synthesized,
        master_volume: 1.0,
    }
}

/// Poll ticks at the driver period until the clock passes `until`.
fn run_until(
    sched: &mut ClapScheduler<TestClock>,
    clock: &TestClock,
    cfg: &EngineConfig,
    source: &mut dyn SoundSource,
    sink: &mut dyn PlaybackSink,
    until: f64,
) {
    let mut step = 0u64;
    loop {
        let t = step as f64 * 0.025;
        if t > until {
            break;
        }
        clock.set(t);
        sched.tick(cfg, source, sink);
        step += 1;
    }
}

#[test]
fn two_seconds_at_120_bpm_schedules_exactly_four_zero_offset_beats() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 42);
    let cfg = config(120.0, 1, 0.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 1.9);

    // Beats land at 0.05 + 0.5k; four of them fall inside 2.0s of draining.
    assert_eq!(sched.current_beat(), 4);
    assert_eq!(sink.plays.len(), 4);
    assert_eq!(sched.recent_events().len(), 4);
    for ev in sched.recent_events() {
        assert_eq!(ev.offset_ms, 0.0, "zero spread must yield zero offsets");
    }
    let beat_times: Vec<f64> = sched.recent_events().iter().map(|e| e.beat_time).collect();
    for (k, bt) in beat_times.iter().enumerate() {
        assert!(
            (bt - (0.05 + 0.5 * k as f64)).abs() < 1e-9,
            "beat {k} landed at {bt}"
        );
    }
}

#[test]
fn beat_count_tracks_duration_within_one_boundary_beat() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 1);
    let cfg = config(100.0, 1, 0.0); // 0.6s interval
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 10.0);

    let expected = (10.0f64 / 0.6).floor() as u64; // 16
    let scheduled = sched.current_beat();
    assert!(
        scheduled >= expected && scheduled <= expected + 1,
        "scheduled {scheduled} beats, expected {expected} +/- 1"
    );
}

#[test]
fn stop_freezes_transport_and_start_resets_it() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 9);
    let cfg = config(120.0, 2, 10.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 1.0);
    assert!(sched.is_running());
    let beat_at_stop = sched.current_beat();
    let next_at_stop = sched.next_beat_time();
    assert!(beat_at_stop > 0);

    sched.stop();
    assert!(!sched.is_running());
    // Ticks after stop must not move the transport.
    clock.set(5.0);
    sched.tick(&cfg, &mut source, &mut sink);
    assert_eq!(sched.current_beat(), beat_at_stop);
    assert_eq!(sched.next_beat_time(), next_at_stop);

    // A fresh start resets beat zero, clears history, and re-arms the lead-in.
    sched.start();
    assert_eq!(sched.current_beat(), 0);
    assert!(sched.recent_events().is_empty());
    assert!((sched.next_beat_time() - 5.05).abs() < 1e-9);
}

#[test]
fn start_while_running_is_a_no_op() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 10);
    let cfg = config(120.0, 1, 0.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 1.0);
    let beat = sched.current_beat();
    let next = sched.next_beat_time();
    sched.start();
    assert_eq!(sched.current_beat(), beat);
    assert_eq!(sched.next_beat_time(), next);
}

#[test]
fn stalled_driver_drops_unhearable_claps_but_keeps_beat_order() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 11);
    let cfg = config(120.0, 1, 0.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    // Driver stalls for five seconds, then one tick drains the backlog.
    clock.set(5.0);
    sched.tick(&cfg, &mut source, &mut sink);

    // All beats up to the horizon advanced the transport...
    assert!(sched.current_beat() >= 10);
    // ...but only the claps still hearable near t=5.0 were emitted.
    assert!(!sched.recent_events().is_empty());
    for ev in sched.recent_events() {
        assert!(
            ev.beat_time >= 5.0 - 0.1 - 1e-9,
            "beat at {} should have been dropped as unhearable",
            ev.beat_time
        );
    }
    // Emission instants were clamped to now, never scheduled in the past.
    for &(_, _, _, when) in &sink.plays {
        assert!(when >= 5.0);
    }
    // Beat times are non-decreasing across the drained backlog.
    let times: Vec<f64> = sched.recent_events().iter().map(|e| e.beat_time).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn unloaded_buffers_skip_events_without_stopping_the_transport() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 12);
    let cfg = config(120.0, 5, 0.0);
    let mut source = UnloadedSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 1.9);

    assert!(sched.current_beat() >= 4, "transport must keep advancing");
    assert!(sink.plays.is_empty(), "nothing resolvable, nothing played");
    assert!(sched.recent_events().is_empty(), "silent events are not logged");
}

#[test]
fn pattern_mode_cycles_stomp_stomp_clap_rest() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 13);
    let mut cfg = config(120.0, 1, 0.0);
    cfg.source_mode = SourceMode::Pattern;
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    // Eight beats: two full pattern cycles.
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 3.9);
    assert_eq!(sched.current_beat(), 8);

    // Rest beats emit nothing, so six of eight beats play.
    assert_eq!(sink.plays.len(), 6);
    assert_eq!(sched.recent_events().len(), 6);
    let handles: Vec<usize> = sink.plays.iter().map(|&(h, _, _, _)| h.0).collect();
    assert_eq!(handles, vec![100, 100, 101, 100, 100, 101]);
}

#[test]
fn crowds_above_threshold_are_subsampled_with_compensating_gain() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 14);
    let cfg = config(120.0, 500, 0.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    clock.set(0.1);
    sched.tick(&cfg, &mut source, &mut sink); // one beat drained

    assert!(cfg.crowd_size > LOD_THRESHOLD);
    assert_eq!(sched.crowd().len(), 500);
    assert_eq!(sink.plays.len(), LOD_SAMPLE_COUNT);

    let gain = (500.0f32 / LOD_SAMPLE_COUNT as f32).sqrt();
    for &(_, pitch, volume, _) in &sink.plays {
        assert!((0.92..=1.08).contains(&pitch));
        // volume = person.volume_factor in [0.6, 1.0] times the LOD gain
        assert!(
            volume >= 0.6 * gain - 1e-4 && volume <= gain + 1e-4,
            "volume {volume} outside the gain-compensated range"
        );
    }
}

#[test]
fn sink_failures_are_contained_per_event() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 15);
    let cfg = config(120.0, 3, 0.0);
    let mut source = TestSource;
    let mut sink = FailingSink;

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 1.9);

    // Every event failed at the sink, but the loop never aborted and the
    // history still records the scheduled claps.
    assert_eq!(sched.current_beat(), 4);
    assert_eq!(sched.recent_events().len(), 4 * 3);
}

#[test]
fn crowd_size_changes_regenerate_the_pool_on_the_next_tick() {
    let clock = TestClock::new();
    let mut sched = ClapScheduler::new(clock.clone(), 16);
    let mut cfg = config(120.0, 10, 0.0);
    let mut source = TestSource;
    let mut sink = RecordingSink::default();

    sched.start();
    run_until(&mut sched, &clock, &cfg, &mut source, &mut sink, 0.5);
    assert_eq!(sched.crowd().len(), 10);

    cfg.crowd_size = 250;
    clock.set(0.6);
    sched.tick(&cfg, &mut source, &mut sink);
    assert_eq!(sched.crowd().len(), 250);
    for p in sched.crowd() {
        assert!(p.variant_index < 8, "variants drawn from the source's pool");
    }
}
