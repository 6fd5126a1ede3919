//! Crowd-clap scheduling engine.
//!
//! Generates the timing of a crowd clapping in rhythm, where each
//! participant's clap is offset from a shared beat by a random draw from a
//! selectable statistical distribution. The crate is pure scheduling and
//! statistics: audio output, clock, and buffer resolution are injected
//! through the traits in [`schedule`], so the same engine runs under a
//! native frontend or a test harness.

pub mod config;
pub mod constants;
pub mod crowd;
pub mod error;
pub mod events;
pub mod lod;
pub mod sampler;
pub mod schedule;

pub use config::*;
pub use constants::*;
pub use crowd::*;
pub use error::*;
pub use events::*;
pub use sampler::*;
pub use schedule::*;
