use rand::Rng;

/// Stream discriminator for the topology solve, ASCII tag `TOPO`.
pub const TOPOLOGY_STREAM: u32 = 0x544F_504F;
/// Stream discriminator for visual dressing passes, ASCII tag `DRES`.
pub const DRESSING_STREAM: u32 = 0x4452_4553;

/// Derives a 31-bit sub-seed from a master seed and a stream discriminator.
///
/// Distinct discriminators decorrelate the streams, so reseeding one
/// consumer never shifts the random sequence of another. The mixing is a
/// Murmur-style finalizer and the result is always non-negative.
pub fn derive_stream_seed(master_seed: i32, stream_discriminator: u32) -> i32 {
    let mut value = master_seed as u32;
    value ^= stream_discriminator
        .wrapping_add(0x9E37_79B9)
        .wrapping_add(value << 6)
        .wrapping_add(value >> 2);
    value ^= value >> 16;
    value = value.wrapping_mul(0x7FEB_352D);
    value ^= value >> 15;
    value = value.wrapping_mul(0x846C_A68B);
    value ^= value >> 16;
    if value == 0 {
        value = stream_discriminator ^ 0xA511_E9B3;
    }

    (value & 0x7FFF_FFFF) as i32
}

/// In-memory master-seed bookkeeping: the seed in use plus a most-recent-first
/// history of seeds that were used before it.
#[derive(Debug, Clone)]
pub struct SeedSession {
    current_seed: i32,
    recent_seeds: Vec<i32>,
    max_recent_seeds: usize,
}

impl Default for SeedSession {
    fn default() -> Self {
        Self {
            current_seed: 1337,
            recent_seeds: Vec::new(),
            max_recent_seeds: 12,
        }
    }
}

impl SeedSession {
    pub fn new(max_recent_seeds: usize) -> Self {
        Self {
            max_recent_seeds,
            ..Default::default()
        }
    }

    #[inline]
    pub fn current_seed(&self) -> i32 {
        self.current_seed
    }

    /// Most recent first.
    #[inline]
    pub fn recent_seeds(&self) -> &[i32] {
        &self.recent_seeds
    }

    /// Makes `seed` current and records it in the history. Negative seeds are
    /// clamped to 0. Returns the seed actually stored.
    pub fn set_current_seed(&mut self, seed: i32) -> i32 {
        self.current_seed = seed.max(0);
        self.add_recent_seed(self.current_seed);
        self.current_seed
    }

    /// Draws a fresh positive seed, makes it current and returns it.
    pub fn generate_new_seed(&mut self) -> i32 {
        let candidate = (rand::thread_rng().gen::<u32>() & 0x7FFF_FFFF) as i32;
        let new_seed = if candidate > 0 { candidate } else { 1 };
        self.set_current_seed(new_seed)
    }

    /// Empties the history, keeping only the current seed in it.
    pub fn clear_recent_seeds(&mut self) {
        self.recent_seeds.clear();
        self.add_recent_seed(self.current_seed);
    }

    fn add_recent_seed(&mut self, seed: i32) {
        self.recent_seeds.retain(|&recent| recent != seed);
        self.recent_seeds.insert(0, seed);
        self.trim_recent_seeds();
    }

    fn trim_recent_seeds(&mut self) {
        let target_max = self.max_recent_seeds.max(1);
        self.recent_seeds.truncate(target_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_seeds_are_deterministic() {
        for master_seed in [-50_000, -1, 0, 1, 1337, i32::MAX] {
            assert_eq!(
                derive_stream_seed(master_seed, TOPOLOGY_STREAM),
                derive_stream_seed(master_seed, TOPOLOGY_STREAM)
            );
        }
    }

    #[test]
    fn stream_seeds_are_non_negative() {
        for master_seed in (-4096..4096).chain([i32::MIN, i32::MAX]) {
            for stream in [TOPOLOGY_STREAM, DRESSING_STREAM] {
                assert!(derive_stream_seed(master_seed, stream) >= 0);
            }
        }
    }

    #[test]
    fn distinct_streams_decorrelate() {
        for master_seed in 0..256 {
            assert_ne!(
                derive_stream_seed(master_seed, TOPOLOGY_STREAM),
                derive_stream_seed(master_seed, DRESSING_STREAM)
            );
        }
    }

    #[test]
    fn zero_valued_mixes_remap_to_a_nonzero_seed() {
        // 0x61C8_8647 + 0x9E37_79B9 wraps to zero and the avalanche keeps
        // zero at zero, so this discriminator drives the remap branch.
        assert_eq!(derive_stream_seed(0, 0x61C8_8647), 0x44D9_6FF4);
    }

    #[test]
    fn session_clamps_negative_seeds() {
        let mut session = SeedSession::default();
        assert_eq!(session.set_current_seed(-42), 0);
        assert_eq!(session.current_seed(), 0);
    }

    #[test]
    fn recent_seeds_dedupe_to_the_front() {
        let mut session = SeedSession::default();
        session.set_current_seed(10);
        session.set_current_seed(20);
        session.set_current_seed(30);
        session.set_current_seed(10);
        assert_eq!(session.recent_seeds(), &[10, 30, 20]);
    }

    #[test]
    fn recent_seeds_truncate_to_the_configured_maximum() {
        let mut session = SeedSession::new(3);
        for seed in 1..=6 {
            session.set_current_seed(seed);
        }
        assert_eq!(session.recent_seeds(), &[6, 5, 4]);
    }

    #[test]
    fn clearing_keeps_the_current_seed_in_the_history() {
        let mut session = SeedSession::default();
        session.set_current_seed(7);
        session.set_current_seed(8);
        session.clear_recent_seeds();
        assert_eq!(session.recent_seeds(), &[8]);
    }

    #[test]
    fn generated_seeds_are_positive() {
        let mut session = SeedSession::default();
        for _ in 0..32 {
            assert!(session.generate_new_seed() > 0);
        }
    }
}
