use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Range;

/// In-process generator used whenever the remote source is unavailable.
///
/// Owns its RNG state, so a seeded instance yields a reproducible stream.
pub struct LocalIntegerSource {
    rng: StdRng,
    seeded: bool,
}

impl LocalIntegerSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            seeded: false,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seeded: true,
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Uniform draw from `[range.min(), range.max()]`.
    pub fn draw(&mut self, range: Range) -> i64 {
        self.rng.random_range(range.min()..=range.max())
    }
}

impl fmt::Debug for LocalIntegerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalIntegerSource")
            .field("seeded", &self.seeded)
            .finish_non_exhaustive()
    }
}
