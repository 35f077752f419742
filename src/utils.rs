//! Fixture generation. Random inputs are reproducible: each generator draws
//! its seed from a `SeedAllocator`, and an allocator started at the same seed
//! hands out the same sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::sparse::{SparseMatrix, SparseVector};

/// Hands out distinct, deterministic seeds.
#[derive(Debug, Default)]
pub struct SeedAllocator {
    next: AtomicU64,
}

impl SeedAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    pub fn next_seed(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Uniform samples from `min..max`.
pub struct UniformRandom<T: SampleUniform> {
    rng: StdRng,
    dist: Uniform<T>,
}

impl<T: SampleUniform + PartialOrd + Copy> UniformRandom<T> {
    /// # Panics
    /// Panics unless `min < max`.
    pub fn new(min: T, max: T, seeds: &SeedAllocator) -> Self {
        assert!(min < max, "empty sampling range");
        Self {
            rng: StdRng::seed_from_u64(seeds.next_seed()),
            dist: Uniform::new(min, max),
        }
    }

    pub fn sample(&mut self) -> T {
        self.dist.sample(&mut self.rng)
    }
}

pub fn random_vec(length: usize, min: f64, max: f64, seeds: &SeedAllocator) -> Vec<f64> {
    let mut random = UniformRandom::new(min, max, seeds);
    (0..length).map(|_| random.sample()).collect()
}

/// Vector of logical length `length` where each position holds a non-zero
/// value in `-2.0..2.0` with probability `density`.
pub fn random_sparse_vector(length: usize, density: f64, seeds: &SeedAllocator) -> SparseVector {
    let mut keep = UniformRandom::new(0.0, 1.0, seeds);
    let mut value = UniformRandom::new(-2.0, 2.0, seeds);

    let mut v = SparseVector::with_capacity((length as f64 * density) as usize);
    for i in 0..length {
        if keep.sample() < density {
            let val = value.sample();
            if val != 0.0 {
                v.set(i, val);
            }
        }
    }
    v
}

/// `rows x cols` matrix with per-entry probability `density`. Rows that end
/// up empty are not stored.
pub fn random_sparse_matrix(
    rows: usize,
    cols: usize,
    density: f64,
    seeds: &SeedAllocator,
) -> SparseMatrix {
    let mut mat = SparseMatrix::with_capacity(rows);
    for row in 0..rows {
        let entries = random_sparse_vector(cols, density, seeds);
        if !entries.is_empty() {
            mat.push_row(row, entries);
        }
    }
    trace!(
        "random matrix {}x{}: {} stored rows, {} nnz",
        rows,
        cols,
        mat.len(),
        mat.nnz()
    );
    mat
}
