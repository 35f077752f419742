//! Reading and writing problems. Matrix Market files are read through `sprs`
//! and converted to sparse rows; our own types go through JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpmvError};
use crate::sparse::{SparseMatrix, SparseVector};

/// A matrix together with the vector it gets multiplied by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub matrix: SparseMatrix,
    pub vector: SparseVector,
}

/// Loads a Matrix Market file. Rows without non-zero entries are not stored.
pub fn load_matrix_market<P: AsRef<Path>>(path: P) -> Result<SparseMatrix> {
    let csr = sprs::io::read_matrix_market::<f64, usize, _>(path.as_ref())?.to_csr::<usize>();

    let mut mat = SparseMatrix::with_capacity(csr.rows());
    for (i, row) in csr.outer_iterator().enumerate() {
        let entries: SparseVector = row
            .iter()
            .filter(|(_, val)| **val != 0.0)
            .map(|(j, val)| (j, *val))
            .collect();
        if !entries.is_empty() {
            mat.push_row(i, entries);
        }
    }
    debug!(
        "loaded {}: {}x{}, {} stored rows, {} nnz",
        path.as_ref().display(),
        csr.rows(),
        csr.cols(),
        mat.len(),
        mat.nnz()
    );
    Ok(mat)
}

pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| SpmvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer(BufWriter::new(file), value)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SpmvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{random_sparse_matrix, random_sparse_vector, SeedAllocator};

    #[test]
    fn small_matrix_market_file() {
        let mat = load_matrix_market("test_matrices/small_general.mtx").unwrap();
        assert_eq!(mat.len(), 3);
        assert_eq!(
            mat.rows().iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 2, 4]
        );
        assert_eq!(mat[0].entries, SparseVector::from_pairs(&[(0, 4.0), (3, -1.0)]));
        assert_eq!(mat[1].entries, SparseVector::from_pairs(&[(1, 2.5), (4, 1.0)]));
        assert_eq!(mat[2].entries, SparseVector::from_pairs(&[(2, 7.0), (4, -3.0)]));
    }

    #[test]
    fn problem_json_round_trip() {
        let seeds = SeedAllocator::new();
        let problem = Problem {
            matrix: random_sparse_matrix(40, 40, 0.1, &seeds),
            vector: random_sparse_vector(40, 0.5, &seeds),
        };
        let path = std::env::temp_dir().join(format!("spmv_problem_{}.json", std::process::id()));
        save_json(&problem, &path).unwrap();
        let loaded: Problem = load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, problem);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_json::<Problem, _>("does/not/exist.json").unwrap_err();
        match err {
            SpmvError::Io { path, .. } => assert_eq!(path, Path::new("does/not/exist.json")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
