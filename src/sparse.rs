//! Row-wise sparse storage. A `SparseVector` is a list of `(index, value)`
//! entries kept in strictly increasing index order, and a `SparseMatrix` is
//! a list of such vectors tagged with their row index.
//!
//! Both types are append-only. Appending out of order is rejected on the spot
//! so every intermediate state is sorted.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpmvError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    index: usize,
    value: f64,
}

impl Entry {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl From<(usize, f64)> for Entry {
    fn from((index, value): (usize, f64)) -> Self {
        Entry::new(index, value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct SparseVector {
    entries: Vec<Entry>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builds a vector from pairs that must already be in strictly increasing
    /// index order.
    ///
    /// # Panics
    /// Panics on the first pair that breaks the ordering.
    pub fn from_pairs(pairs: &[(usize, f64)]) -> Self {
        let mut v = Self::with_capacity(pairs.len());
        for &(index, value) in pairs {
            v.set(index, value);
        }
        v
    }

    /// Keeps every non-zero position of `dense`.
    pub fn from_dense(dense: &[f64]) -> Self {
        dense
            .iter()
            .enumerate()
            .filter(|(_, val)| **val != 0.0)
            .map(|(i, val)| (i, *val))
            .collect()
    }

    /// Appends `(index, value)`.
    ///
    /// # Panics
    /// Panics if `index` is not strictly greater than the last stored index.
    #[inline]
    pub fn set(&mut self, index: usize, value: f64) {
        if let Some(last) = self.entries.last() {
            assert!(
                index > last.index,
                "sparse vector append out of order: index {} after {}",
                index,
                last.index
            );
        }
        self.entries.push(Entry::new(index, value));
    }

    /// Same as `set`, but reports the ordering violation instead of panicking.
    pub fn try_set(&mut self, index: usize, value: f64) -> Result<()> {
        match self.entries.last() {
            Some(last) if index <= last.index => Err(SpmvError::OutOfOrder {
                index,
                last: last.index,
            }),
            _ => {
                self.entries.push(Entry::new(index, value));
                Ok(())
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.entries
            .binary_search_by_key(&index, |e| e.index)
            .ok()
            .map(|pos| self.entries[pos].value)
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.entries.last().map(|e| e.index)
    }

    /// Sum of `self[k] * other[k]` over the indices present in both vectors.
    ///
    /// Walks both entry lists once: whichever side points at the smaller
    /// index is advanced, since nothing left on the other side can match it.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let a = &self.entries;
        let b = &other.entries;
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0;

        while i < a.len() && j < b.len() {
            if a[i].index < b[j].index {
                i += 1;
            } else if a[i].index > b[j].index {
                j += 1;
            } else {
                acc += a[i].value * b[j].value;
                i += 1;
                j += 1;
            }
        }

        acc
    }

    /// `true` if the entries are strictly increasing by index. Always holds
    /// for vectors built through this API.
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].index < w[1].index)
    }
}

impl FromIterator<(usize, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut v = SparseVector::with_capacity(iter.size_hint().0);
        for (index, value) in iter {
            v.set(index, value);
        }
        v
    }
}

impl TryFrom<Vec<Entry>> for SparseVector {
    type Error = SpmvError;

    fn try_from(entries: Vec<Entry>) -> Result<Self> {
        let mut v = SparseVector::with_capacity(entries.len());
        for e in entries {
            v.try_set(e.index, e.value)?;
        }
        Ok(v)
    }
}

impl From<SparseVector> for Vec<Entry> {
    fn from(v: SparseVector) -> Self {
        v.entries
    }
}

impl<'a> IntoIterator for &'a SparseVector {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub index: usize,
    pub entries: SparseVector,
}

/// Sparse at both levels: only rows holding at least one entry need to be
/// stored, so the storage position of a row and its `index` can differ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MatrixRow>", into = "Vec<MatrixRow>")]
pub struct SparseMatrix {
    rows: Vec<MatrixRow>,
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// # Panics
    /// Panics if `index` is not strictly greater than the last row index.
    pub fn push_row(&mut self, index: usize, entries: SparseVector) {
        if let Some(last) = self.rows.last() {
            assert!(
                index > last.index,
                "matrix rows out of order: row {} after {}",
                index,
                last.index
            );
        }
        self.rows.push(MatrixRow { index, entries });
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.entries.len()).sum()
    }
}

impl TryFrom<Vec<MatrixRow>> for SparseMatrix {
    type Error = SpmvError;

    fn try_from(rows: Vec<MatrixRow>) -> Result<Self> {
        for w in rows.windows(2) {
            if w[1].index <= w[0].index {
                return Err(SpmvError::OutOfOrder {
                    index: w[1].index,
                    last: w[0].index,
                });
            }
        }
        Ok(Self { rows })
    }
}

impl From<SparseMatrix> for Vec<MatrixRow> {
    fn from(m: SparseMatrix) -> Self {
        m.rows
    }
}

impl Index<usize> for SparseMatrix {
    type Output = MatrixRow;

    fn index(&self, position: usize) -> &MatrixRow {
        &self.rows[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_in_order_keeps_entries() {
        let mut v = SparseVector::new();
        v.set(0, 1.0);
        v.set(3, -2.0);
        v.set(10, 0.5);

        assert_eq!(v.len(), 3);
        assert!(v.is_sorted());
        assert_eq!(v.indices().collect::<Vec<_>>(), vec![0, 3, 10]);
        assert_eq!(v.get(3), Some(-2.0));
        assert_eq!(v.get(4), None);
        assert_eq!(v.last_index(), Some(10));
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn append_smaller_index_panics() {
        let mut v = SparseVector::new();
        v.set(5, 1.0);
        v.set(2, 1.0);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn append_duplicate_index_panics() {
        let mut v = SparseVector::new();
        v.set(5, 1.0);
        v.set(5, 2.0);
    }

    #[test]
    fn try_set_reports_violation_without_mutating() {
        let mut v = SparseVector::from_pairs(&[(1, 1.0), (4, 2.0)]);
        match v.try_set(4, 3.0) {
            Err(SpmvError::OutOfOrder { index, last }) => {
                assert_eq!(index, 4);
                assert_eq!(last, 4);
            }
            other => panic!("expected OutOfOrder, got {:?}", other),
        }
        assert_eq!(v.len(), 2);
        assert!(v.try_set(7, 3.0).is_ok());
        assert_eq!(v.get(7), Some(3.0));
    }

    #[test]
    fn dot_skips_unmatched_indices() {
        let x = SparseVector::from_pairs(&[(1, 2.0), (3, 5.0)]);
        let r = SparseVector::from_pairs(&[(1, 4.0), (2, 1.0), (3, 2.0)]);
        assert_eq!(r.dot(&x), 18.0);
        assert_eq!(x.dot(&r), 18.0);
        assert_eq!(r.dot(&SparseVector::new()), 0.0);
    }

    #[test]
    fn from_dense_drops_zeros() {
        let v = SparseVector::from_dense(&[0.0, 1.5, 0.0, 0.0, -3.0]);
        assert_eq!(v.entries(), &[Entry::new(1, 1.5), Entry::new(4, -3.0)]);
    }

    #[test]
    #[should_panic(expected = "matrix rows out of order")]
    fn rows_must_ascend() {
        let mut m = SparseMatrix::new();
        m.push_row(3, SparseVector::from_pairs(&[(0, 1.0)]));
        m.push_row(1, SparseVector::from_pairs(&[(0, 1.0)]));
    }

    #[test]
    fn matrix_index_is_storage_position() {
        let mut m = SparseMatrix::new();
        m.push_row(2, SparseVector::from_pairs(&[(0, 1.0), (1, 2.0)]));
        m.push_row(7, SparseVector::from_pairs(&[(4, 1.0)]));

        assert_eq!(m.len(), 2);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m[1].index, 7);
        assert_eq!(m[0].entries.get(1), Some(2.0));
    }

    #[test]
    fn json_shape_is_flat() {
        let v = SparseVector::from_pairs(&[(0, 1.0), (2, 3.0)]);
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, r#"[{"index":0,"value":1.0},{"index":2,"value":3.0}]"#);
    }

    #[test]
    fn unsorted_json_is_rejected() {
        let res: serde_json::Result<SparseVector> =
            serde_json::from_str(r#"[{"index":2,"value":1.0},{"index":2,"value":3.0}]"#);
        assert!(res.is_err());

        let res: serde_json::Result<SparseMatrix> = serde_json::from_str(
            r#"[{"index":4,"entries":[]},{"index":1,"entries":[{"index":0,"value":1.0}]}]"#,
        );
        assert!(res.is_err());
    }
}
