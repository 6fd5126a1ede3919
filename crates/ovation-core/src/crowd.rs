use rand::Rng;

use crate::constants::{
    PITCH_FACTOR_MAX, PITCH_FACTOR_MIN, VOLUME_FACTOR_MAX, VOLUME_FACTOR_MIN,
};

/// One simulated clapper. Immutable once created.
///
/// - `variant_index` selects which pre-rendered sound buffer this person uses
/// - `pitch_factor` is a playback-rate multiplier in [0.92, 1.08]
/// - `volume_factor` is a gain multiplier in [0.6, 1.0]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Person {
    pub variant_index: usize,
    pub pitch_factor: f32,
    pub volume_factor: f32,
}

/// Pool of clapper identities, owned exclusively by the scheduler.
///
/// The pool is replaced wholesale on any crowd-size change rather than
/// resized in place; regeneration is cheap and sidesteps the bugs that
/// come with incremental diffing.
#[derive(Debug, Default)]
pub struct CrowdRegistry {
    persons: Vec<Person>,
}

impl CrowdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the pool and allocate `count` fresh persons, each with an
    /// independently drawn variant and fixed pitch/volume variation.
    pub fn regenerate<R: Rng>(&mut self, count: usize, variant_pool_size: usize, rng: &mut R) {
        self.persons.clear();
        self.persons.reserve(count);
        for _ in 0..count {
            self.persons.push(Person {
                variant_index: if variant_pool_size > 0 {
                    rng.gen_range(0..variant_pool_size)
                } else {
                    0
                },
                pitch_factor: rng.gen_range(PITCH_FACTOR_MIN..=PITCH_FACTOR_MAX),
                volume_factor: rng.gen_range(VOLUME_FACTOR_MIN..=VOLUME_FACTOR_MAX),
            });
        }
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
