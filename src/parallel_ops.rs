//! Parallel sparse matrix times sparse vector.
//!
//! Every worker appends the rows it computes to a private `SparseVector`, so
//! a worker must see its rows in ascending order. All schedules below hand
//! out contiguous ranges or strictly increasing chunks, never an earlier row
//! after a later one. Distinct workers cover distinct rows, which makes the
//! private results disjoint and lets them be combined with `merge`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::Result;
use crate::merge::{merge_all, merge_owned};
use crate::sparse::{MatrixRow, SparseMatrix, SparseVector};
use crate::spmv::row_product;
use crate::N_CPUS;

pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// How rows are assigned to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Schedule {
    /// rayon `fold` + `reduce`: each fold accumulator owns a contiguous
    /// sub-range, and idle threads steal whole sub-ranges.
    Adaptive,
    /// One contiguous block of rows per worker.
    Static,
    /// Workers pull the next `chunk_size` unclaimed rows from a shared
    /// counter and merge into a locked total when done.
    Dynamic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    pub threads: usize,
    pub schedule: Schedule,
    /// Smallest run of rows one worker processes in a go.
    pub chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threads: *N_CPUS,
            schedule: Schedule::Adaptive,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ParallelConfig {
    pub fn build_pool(&self) -> Result<ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.max(1))
            .build()?)
    }
}

/// Computes `A * x` on the current rayon pool with the adaptive schedule.
/// The result is identical to `multiply_sequential`.
pub fn multiply_parallel(a: &SparseMatrix, x: &SparseVector) -> SparseVector {
    multiply_scheduled(
        a,
        x,
        Schedule::Adaptive,
        rayon::current_num_threads(),
        DEFAULT_CHUNK_SIZE,
    )
}

/// Computes `A * x` on a dedicated pool of `config.threads` workers.
pub fn multiply_parallel_with(
    a: &SparseMatrix,
    x: &SparseVector,
    config: &ParallelConfig,
) -> Result<SparseVector> {
    let pool = config.build_pool()?;
    Ok(multiply_on(&pool, a, x, config))
}

/// Same as `multiply_parallel_with`, reusing an existing pool. The number of
/// workers is taken from the pool.
pub fn multiply_on(
    pool: &ThreadPool,
    a: &SparseMatrix,
    x: &SparseVector,
    config: &ParallelConfig,
) -> SparseVector {
    pool.install(|| {
        multiply_scheduled(
            a,
            x,
            config.schedule,
            pool.current_num_threads(),
            config.chunk_size,
        )
    })
}

fn multiply_scheduled(
    a: &SparseMatrix,
    x: &SparseVector,
    schedule: Schedule,
    workers: usize,
    chunk_size: usize,
) -> SparseVector {
    if a.is_empty() || x.is_empty() {
        return SparseVector::new();
    }
    let chunk_size = chunk_size.max(1);
    debug!(
        "parallel spmv: {} rows, {} nnz, {} workers, {} schedule",
        a.len(),
        a.nnz(),
        workers,
        schedule
    );

    match schedule {
        Schedule::Adaptive => adaptive(a.rows(), x, chunk_size),
        Schedule::Static => block_partitioned(a.rows(), x, workers),
        Schedule::Dynamic => monotonic_dynamic(a.rows(), x, workers, chunk_size),
    }
}

/// Appends the products of `rows` to `acc`. `rows` must be ascending and lie
/// past whatever `acc` already holds.
fn accumulate<'a, I>(mut acc: SparseVector, rows: I, x: &SparseVector) -> SparseVector
where
    I: IntoIterator<Item = &'a MatrixRow>,
{
    for row in rows {
        if let Some((index, value)) = row_product(row, x) {
            acc.set(index, value);
        }
    }
    acc
}

fn adaptive(rows: &[MatrixRow], x: &SparseVector, chunk_size: usize) -> SparseVector {
    rows.par_iter()
        .with_min_len(chunk_size)
        .fold(SparseVector::new, |acc, row| {
            accumulate(acc, std::iter::once(row), x)
        })
        .reduce(SparseVector::new, merge_owned)
}

fn block_partitioned(rows: &[MatrixRow], x: &SparseVector, workers: usize) -> SparseVector {
    let block = ((rows.len() + workers - 1) / workers).max(1);
    let parts: Vec<SparseVector> = rows
        .par_chunks(block)
        .map(|block| accumulate(SparseVector::new(), block, x))
        .collect();
    trace!("static schedule: {} blocks of {} rows", parts.len(), block);
    merge_all(parts)
}

fn monotonic_dynamic(
    rows: &[MatrixRow],
    x: &SparseVector,
    workers: usize,
    chunk_size: usize,
) -> SparseVector {
    // Keeps `next` far from overflow: every worker makes at most one claim
    // past the end, so it never exceeds `rows.len() * (workers + 1)`.
    let chunk_size = chunk_size.min(rows.len());
    let next = AtomicUsize::new(0);
    let total = Mutex::new(SparseVector::new());

    rayon::scope(|s| {
        for worker in 0..workers {
            let next = &next;
            let total = &total;
            s.spawn(move |_| {
                let mut local = SparseVector::new();
                let mut claimed = 0;
                loop {
                    // Claims from one worker are strictly increasing.
                    let start = next.fetch_add(chunk_size, Ordering::Relaxed);
                    if start >= rows.len() {
                        break;
                    }
                    let end = (start + chunk_size).min(rows.len());
                    local = accumulate(local, &rows[start..end], x);
                    claimed += end - start;
                }
                trace!("worker {} processed {} rows", worker, claimed);

                let mut guard = total.lock().unwrap_or_else(|e| e.into_inner());
                let so_far = std::mem::take(&mut *guard);
                *guard = merge_owned(so_far, local);
            });
        }
    });

    total.into_inner().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
extern crate test_generator;
