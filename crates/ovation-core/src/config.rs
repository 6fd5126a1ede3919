use crate::constants::{BPM_MAX, BPM_MIN, MAX_CROWD, SPREAD_MS_MAX};
use crate::sampler::OffsetDistribution;

/// Where clap buffers come from for a given person and beat.
///
/// `Pattern` is the one mode that is beat-aware: `beat % 4` selects a fixed
/// stomp/stomp/clap/rest cycle shared by the whole crowd, with the rest
/// position resolving to silence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceMode {
    Synthesized,
    Sample,
    Footstomp,
    CustomUpload,
    Pattern,
}

impl SourceMode {
    /// Parse a mode name; unrecognized names fall back to `Synthesized`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "synthesized" => SourceMode::Synthesized,
            "sample" => SourceMode::Sample,
            "footstomp" => SourceMode::Footstomp,
            "custom" => SourceMode::CustomUpload,
            "pattern" => SourceMode::Pattern,
            _ => SourceMode::Synthesized,
        }
    }
}

/// Configuration snapshot, owned by the caller and read fresh on every tick.
///
/// The scheduler never copies or caches this, so parameter changes take
/// effect on the next scheduled beat. Range enforcement lives here, at the
/// configuration boundary: the scheduler itself trusts its inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub bpm: f64,
    pub crowd_size: usize,
    pub spread_ms: f64,
    pub distribution: OffsetDistribution,
    pub source_mode: SourceMode,
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            crowd_size: 30,
            spread_ms: 20.0,
            distribution: OffsetDistribution::Normal,
            source_mode: SourceMode::Synthesized,
            master_volume: 0.8,
        }
    }
}

impl EngineConfig {
    /// Clamp every field into its supported range.
    pub fn clamped(mut self) -> Self {
        self.bpm = self.bpm.clamp(BPM_MIN, BPM_MAX);
        self.crowd_size = self.crowd_size.clamp(1, MAX_CROWD);
        self.spread_ms = self.spread_ms.clamp(0.0, SPREAD_MS_MAX);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        if let OffsetDistribution::Beta { alpha, beta } = &mut self.distribution {
            *alpha = alpha.max(f64::MIN_POSITIVE);
            *beta = beta.max(f64::MIN_POSITIVE);
        }
        self
    }
}
