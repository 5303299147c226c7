//! Wall-clock RNG seeding for the default entry point.
//!
//! Per the external contract, a caller that wants reproducible runs should
//! go through [`crate::run_bvn_with`] and supply its own seeded RNG; this
//! module only backs the convenience entry point that does not ask for one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// A fresh `StdRng` seeded from a coarse wall-clock source, with the first
/// sample discarded (two processes started in the same tick would otherwise
/// correlate on their very first draw).
pub fn new_rng() -> StdRng {
    let mut rng = StdRng::seed_from_u64(wall_clock_seed());
    let _: f64 = rng.gen();
    rng
}
