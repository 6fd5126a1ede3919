// Engine tuning constants shared by the scheduler, LOD selector, and frontends.

// Transport timing
pub const LEAD_IN_SEC: f64 = 0.05; // gap between start() and the first beat
pub const LOOKAHEAD_SEC: f64 = 0.1; // rolling window drained by each tick
pub const TICK_INTERVAL_MS: u64 = 25; // polling period for the external driver
pub const LATE_TOLERANCE_SEC: f64 = 0.1; // claps older than this are dropped

// Crowd sizing and level-of-detail
pub const MAX_CROWD: usize = 500;
pub const LOD_THRESHOLD: usize = 200; // crowds above this are subsampled per beat
pub const LOD_SAMPLE_COUNT: usize = 40; // audible subset size when subsampling

// Fixed per-person variation ranges
pub const PITCH_FACTOR_MIN: f32 = 0.92;
pub const PITCH_FACTOR_MAX: f32 = 1.08;
pub const VOLUME_FACTOR_MIN: f32 = 0.6;
pub const VOLUME_FACTOR_MAX: f32 = 1.0;

// Event history: trimmed in one batch to RETAIN once CAP is exceeded
pub const EVENT_LOG_CAP: usize = 5000;
pub const EVENT_LOG_RETAIN: usize = 3500;

// Configuration clamp ranges (applied by EngineConfig, not the scheduler)
pub const BPM_MIN: f64 = 40.0;
pub const BPM_MAX: f64 = 240.0;
pub const SPREAD_MS_MAX: f64 = 200.0;
