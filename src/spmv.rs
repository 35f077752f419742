use crate::sparse::{MatrixRow, SparseMatrix, SparseVector};

/// Row-wise dot product against `x`. `None` when the sum is exactly zero,
/// such rows are left out of the result.
#[inline]
pub(crate) fn row_product(row: &MatrixRow, x: &SparseVector) -> Option<(usize, f64)> {
    let acc = row.entries.dot(x);
    if acc != 0.0 {
        Some((row.index, acc))
    } else {
        None
    }
}

/// Computes `A * x`. Rows are visited in ascending index order, so results
/// are appended straight into the output without sorting.
pub fn multiply_sequential(a: &SparseMatrix, x: &SparseVector) -> SparseVector {
    let mut result = SparseVector::new();
    if x.is_empty() {
        return result;
    }

    for row in a.rows() {
        if let Some((index, value)) = row_product(row, x) {
            result.set(index, value);
        }
    }

    result
}
