//! Sparse matrix times sparse vector (SpMV) over index-sorted row lists.
//!
//! A `SparseVector` stores only its non-zero entries, each an `(index, value)`
//! pair, in strictly increasing index order. A `SparseMatrix` is a list of
//! such vectors, one per non-empty row, tagged with the row index.
//!
//! The product `A * x` is computed one row at a time: the row and `x` are
//! walked together and the values at shared indices are multiplied and
//! summed. `multiply_sequential` visits rows in order and appends each
//! non-zero sum to the output. `multiply_parallel` spreads the rows over a
//! thread pool, lets every worker append to a private vector, and combines
//! the private vectors with `merge`, the sorted union of vectors with
//! disjoint indices. Both produce exactly the same output.

#[macro_use]
extern crate log;

pub mod bench;
pub mod error;
pub mod io;
pub mod merge;
pub mod parallel_ops;
pub mod sparse;
pub mod spmv;
pub mod utils;

pub use error::{Result, SpmvError};
pub use merge::{merge, merge_all};
pub use parallel_ops::{
    multiply_on, multiply_parallel, multiply_parallel_with, ParallelConfig, Schedule,
};
pub use sparse::{Entry, MatrixRow, SparseMatrix, SparseVector};
pub use spmv::multiply_sequential;

use lazy_static::lazy_static;

lazy_static! {
    static ref N_CPUS: usize = num_cpus::get();
}
