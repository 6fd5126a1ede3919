use fnv::FnvHashSet;
use rand::Rng;
use smallvec::SmallVec;

/// Indices of the persons audible on one beat. The inline capacity is the
/// smallest smallvec-supported size that holds a subsampled selection
/// without spilling; full-crowd selections spill to the heap.
pub type AudibleSubset = SmallVec<[usize; 64]>;

/// Pick the audible subset of a crowd for one beat.
///
/// Small pools are returned whole with unit gain. Larger pools are
/// subsampled to `sample_count` distinct indices, drawn by rejection
/// against a hash set (cheap: the sample is always small relative to the
/// 500-person cap). The returned gain, `sqrt(pool / sample)`, compensates
/// loudness on the intuition that independent sources sum with amplitude
/// growing roughly as the square root of their count.
pub fn select<R: Rng>(pool_len: usize, sample_count: usize, rng: &mut R) -> (AudibleSubset, f32) {
    if pool_len <= sample_count {
        return ((0..pool_len).collect(), 1.0);
    }
    let mut chosen = FnvHashSet::default();
    let mut subset = AudibleSubset::new();
    while subset.len() < sample_count {
        let idx = rng.gen_range(0..pool_len);
        if chosen.insert(idx) {
            subset.push(idx);
        }
    }
    let gain = (pool_len as f32 / sample_count as f32).sqrt();
    (subset, gain)
}
