use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{EngineConfig, SourceMode};
use crate::constants::{LATE_TOLERANCE_SEC, LEAD_IN_SEC, LOD_SAMPLE_COUNT, LOD_THRESHOLD, LOOKAHEAD_SEC};
use crate::crowd::CrowdRegistry;
use crate::error::PlaybackError;
use crate::events::{ClapEvent, EventLog};
use crate::lod;

/// Opaque reference to a playable buffer owned by the audio backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferHandle(pub usize);

/// Monotonic, high-resolution time source in seconds.
///
/// The scheduler and the playback sink must observe the same clock, or the
/// emission instants it computes are meaningless to the sink.
pub trait Clock {
    fn now_sec(&self) -> f64;
}

/// Wall-clock `Clock` backed by a monotonic origin instant.
pub struct SystemClock {
    origin: instant::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_sec(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Resolves a person's variant and the active source mode to a playable
/// buffer. `None` means silence: a rest position in pattern mode, or an
/// asset that is not loaded yet. Silence is never an error.
pub trait SoundSource {
    /// Number of distinct clap variants available; person identities draw
    /// their `variant_index` uniformly from this pool.
    fn variant_count(&self) -> usize;

    fn resolve(&mut self, variant_index: usize, mode: SourceMode, beat: u64)
        -> Option<BufferHandle>;
}

/// Emits a buffer at a target instant on the shared clock, best-effort.
/// Sinks clamp instants already in the past to "now".
pub trait PlaybackSink {
    fn play(
        &mut self,
        handle: BufferHandle,
        pitch: f32,
        volume: f32,
        when_sec: f64,
    ) -> Result<(), PlaybackError>;
}

/// Lookahead clap scheduler.
///
/// A coarse external driver polls [`ClapScheduler::tick`] every
/// [`crate::constants::TICK_INTERVAL_MS`] milliseconds; each tick drains
/// every beat whose nominal time falls inside the rolling lookahead window
/// and fans it out into per-person clap emissions. Draining the whole
/// backlog in one tick is what keeps timing honest: at high BPM the beat
/// spacing drops below the polling period, and a missed or jittered tick
/// must not translate into drift.
///
/// All state mutation happens synchronously inside `tick`; the scheduler
/// owns its crowd registry, event log, and RNG exclusively, and external
/// readers only see snapshots through the accessor methods.
pub struct ClapScheduler<C: Clock> {
    clock: C,
    rng: StdRng,
    crowd: CrowdRegistry,
    log: EventLog,
    next_beat_time: f64,
    current_beat: u64,
    running: bool,
}

impl<C: Clock> ClapScheduler<C> {
    pub fn new(clock: C, seed: u64) -> Self {
        Self {
            clock,
            rng: StdRng::seed_from_u64(seed),
            crowd: CrowdRegistry::new(),
            log: EventLog::new(),
            next_beat_time: 0.0,
            current_beat: 0,
            running: false,
        }
    }

    /// Begin playback: reset the transport to a short lead-in past "now",
    /// clear the event history, and accept ticks. A `start` while already
    /// running is a no-op, which is what guards against duplicate drivers.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.next_beat_time = self.clock.now_sec() + LEAD_IN_SEC;
        self.current_beat = 0;
        self.log.clear();
        self.running = true;
        log::info!("transport started, first beat at {:.3}s", self.next_beat_time);
    }

    /// Stop playback. Transport position is frozen, not reset, so callers
    /// inspecting state afterwards see the final position.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        log::info!("transport stopped at beat {}", self.current_beat);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_beat(&self) -> u64 {
        self.current_beat
    }

    pub fn next_beat_time(&self) -> f64 {
        self.next_beat_time
    }

    pub fn recent_events(&self) -> &[ClapEvent] {
        self.log.recent()
    }

    pub fn crowd(&self) -> &[crate::crowd::Person] {
        self.crowd.persons()
    }

    /// One poll of the scheduling loop.
    ///
    /// The config snapshot is read fresh here and never cached, so slider
    /// changes land on the next beat. Crowd-size changes regenerate the
    /// person pool wholesale before any beat is scheduled.
    pub fn tick(
        &mut self,
        config: &EngineConfig,
        source: &mut dyn SoundSource,
        sink: &mut dyn PlaybackSink,
    ) {
        if !self.running {
            return;
        }
        if self.crowd.len() != config.crowd_size {
            self.crowd
                .regenerate(config.crowd_size, source.variant_count(), &mut self.rng);
            log::debug!("crowd regenerated to {} persons", config.crowd_size);
        }
        let beat_interval = 60.0 / config.bpm;
        while self.next_beat_time < self.clock.now_sec() + LOOKAHEAD_SEC {
            let beat_time = self.next_beat_time;
            let beat = self.current_beat;
            self.schedule_beat(beat_time, beat, config, source, sink);
            self.next_beat_time += beat_interval;
            self.current_beat += 1;
        }
    }

    /// Fan one beat out into per-person clap emissions.
    fn schedule_beat(
        &mut self,
        beat_time: f64,
        beat: u64,
        config: &EngineConfig,
        source: &mut dyn SoundSource,
        sink: &mut dyn PlaybackSink,
    ) {
        let now = self.clock.now_sec();
        let (subset, lod_gain) = if self.crowd.len() > LOD_THRESHOLD {
            lod::select(self.crowd.len(), LOD_SAMPLE_COUNT, &mut self.rng)
        } else {
            ((0..self.crowd.len()).collect(), 1.0)
        };
        for (batch_index, &person_index) in subset.iter().enumerate() {
            let person = self.crowd.persons()[person_index];
            let offset_ms = config
                .distribution
                .sample_ms(config.spread_ms, &mut self.rng);
            let clap_instant = beat_time + offset_ms / 1000.0;
            if clap_instant < now - LATE_TOLERANCE_SEC {
                // Unhearable; a pathological draw or a stalled driver.
                log::debug!("dropping clap {offset_ms:.1}ms off beat {beat}: too far in the past");
                continue;
            }
            let Some(handle) = source.resolve(person.variant_index, config.source_mode, beat)
            else {
                continue;
            };
            let volume = person.volume_factor * lod_gain * config.master_volume;
            if let Err(err) = sink.play(handle, person.pitch_factor, volume, clap_instant.max(now))
            {
                // Contained per event; the rest of the beat still plays.
                log::warn!("clap playback failed on beat {beat}: {err}");
            }
            self.log.append(ClapEvent {
                beat_time,
                offset_ms,
                person_index: batch_index,
                timestamp: now,
            });
        }
    }
}
