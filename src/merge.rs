//! Combining sparse vectors whose index sets do not overlap. This is the
//! reduction step of the parallel multiplication, where each worker's
//! partial result covers a different set of rows.

use crate::sparse::SparseVector;

/// Sorted union of two vectors with disjoint index sets.
///
/// Every entry is appended with `SparseVector::set`, so an index present in
/// both `a` and `b` panics on the second append instead of producing a
/// vector with a duplicate.
pub fn merge(a: &SparseVector, b: &SparseVector) -> SparseVector {
    let ae = a.entries();
    let be = b.entries();

    let mut result = SparseVector::with_capacity(ae.len() + be.len());
    let (mut i, mut j) = (0, 0);

    while i < ae.len() && j < be.len() {
        if ae[i].index() < be[j].index() {
            result.set(ae[i].index(), ae[i].value());
            i += 1;
        } else {
            result.set(be[j].index(), be[j].value());
            j += 1;
        }
    }

    for e in ae[i..].iter().chain(be[j..].iter()) {
        result.set(e.index(), e.value());
    }

    result
}

/// Owned variant used as the combinator of `rayon`'s `reduce`. An empty side
/// hands the other one back without copying.
pub fn merge_owned(a: SparseVector, b: SparseVector) -> SparseVector {
    if a.is_empty() {
        b
    } else if b.is_empty() {
        a
    } else {
        merge(&a, &b)
    }
}

/// Reduces pairwise-disjoint vectors to one by merging neighbours level by
/// level, so each entry is copied `log2(parts.len())` times.
pub fn merge_all(mut parts: Vec<SparseVector>) -> SparseVector {
    while parts.len() > 1 {
        let mut next = Vec::with_capacity((parts.len() + 1) / 2);
        let mut it = parts.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(merge_owned(a, b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::Entry;
    use crate::utils::{random_sparse_vector, SeedAllocator};

    #[test]
    fn interleaves_by_index() {
        let a = SparseVector::from_pairs(&[(0, 1.0), (4, 2.0)]);
        let b = SparseVector::from_pairs(&[(1, 3.0), (2, 4.0)]);
        let m = merge(&a, &b);
        assert_eq!(
            m,
            SparseVector::from_pairs(&[(0, 1.0), (1, 3.0), (2, 4.0), (4, 2.0)])
        );
    }

    #[test]
    fn remainder_of_longer_side_is_kept() {
        let a = SparseVector::from_pairs(&[(0, 1.0)]);
        let b = SparseVector::from_pairs(&[(1, 2.0), (5, 3.0), (9, 4.0)]);
        let m = merge(&a, &b);
        assert_eq!(m.len(), 4);
        assert_eq!(m.indices().collect::<Vec<_>>(), vec![0, 1, 5, 9]);

        let m = merge(&b, &a);
        assert_eq!(m.indices().collect::<Vec<_>>(), vec![0, 1, 5, 9]);
    }

    #[test]
    fn empty_operands() {
        let a = SparseVector::from_pairs(&[(3, 1.0), (8, 2.0)]);
        let empty = SparseVector::new();
        assert_eq!(merge(&a, &empty), a);
        assert_eq!(merge(&empty, &a), a);
        assert!(merge(&empty, &empty).is_empty());
        assert!(merge_all(Vec::new()).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn overlapping_operands_panic() {
        let a = SparseVector::from_pairs(&[(1, 1.0), (2, 1.0)]);
        let b = SparseVector::from_pairs(&[(2, 5.0)]);
        merge(&a, &b);
    }

    /// Splits a random vector into `parts` disjoint pieces by index modulo,
    /// so the pieces interleave as much as possible.
    fn split(v: &SparseVector, parts: usize) -> Vec<SparseVector> {
        (0..parts)
            .map(|p| {
                v.iter()
                    .filter(|e| e.index() % parts == p)
                    .map(|e| (e.index(), e.value()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn disjoint_merge_properties() {
        let seeds = SeedAllocator::new();
        for _ in 0..20 {
            let v = random_sparse_vector(500, 0.3, &seeds);
            let pieces = split(&v, 2);
            let (a, b) = (&pieces[0], &pieces[1]);

            let ab = merge(a, b);
            let ba = merge(b, a);
            assert_eq!(ab.len(), a.len() + b.len());
            assert!(ab.is_sorted());
            assert_eq!(ab, ba);
            assert_eq!(ab, v);
            for e in a.iter().chain(b.iter()) {
                assert_eq!(ab.get(e.index()), Some(e.value()));
            }
        }
    }

    #[test]
    fn merge_all_reassembles_any_split() {
        let seeds = SeedAllocator::new();
        let v = random_sparse_vector(1000, 0.2, &seeds);
        for parts in [1, 2, 3, 7, 16] {
            let merged = merge_all(split(&v, parts));
            assert_eq!(merged, v, "split into {} parts", parts);
        }
    }

    #[test]
    fn merge_owned_short_circuits() {
        let a = SparseVector::from_pairs(&[(2, 1.0)]);
        let m = merge_owned(SparseVector::new(), a.clone());
        assert_eq!(m.entries(), &[Entry::new(2, 1.0)]);
        let m = merge_owned(a, SparseVector::from_pairs(&[(0, 4.0)]));
        assert_eq!(m.indices().collect::<Vec<_>>(), vec![0, 2]);
    }
}
