//! Seeded random streams for synthetic pool generation.
//!
//! RULE: The engine itself never draws random numbers. Only the pool
//! generator does, and only through a `PoolRng` taken from an `RngBank`.
//!
//! Each stream is seeded from (seed XOR slot-derived constant), so adding a
//! stream never shifts the output of an existing one.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// One deterministic stream.
pub struct PoolRng {
    pub slot: StreamSlot,
    inner:    Pcg64Mcg,
}

impl PoolRng {
    pub fn new(seed: u64, slot: StreamSlot) -> Self {
        let derived = seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { slot, inner: Pcg64Mcg::seed_from_u64(derived) }
    }

    /// Uniform in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform in [lo, hi]. Returns `lo` when the range is empty.
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// One element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.inner.gen_range(0..items.len()))
    }

    /// `count` distinct elements, in slice order.
    pub fn pick_many<'a, T>(&mut self, items: &'a [T], count: usize) -> Vec<&'a T> {
        let count = count.min(items.len());
        let mut chosen = rand::seq::index::sample(&mut self.inner, items.len(), count).into_vec();
        chosen.sort_unstable();
        chosen.into_iter().filter_map(|i| items.get(i)).collect()
    }
}

pub struct RngBank {
    seed: u64,
}

impl RngBank {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn stream(&self, slot: StreamSlot) -> PoolRng {
        PoolRng::new(self.seed, slot)
    }
}

/// Stable stream slots. Append only; reordering changes every seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    DeliveryWorkers = 0,
    TalentWorkers   = 1,
    Roles           = 2,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeliveryWorkers => "delivery_workers",
            Self::TalentWorkers   => "talent_workers",
            Self::Roles           => "roles",
        }
    }
}
