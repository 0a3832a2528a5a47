//! Sparse matrix helpers for the canonical `CsrMatrix<f32>` representation

use crate::core::error::{LoomError, Result};
use itertools::Itertools;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ndarray::Array2;

pub struct SparseOps;

impl SparseOps {
    /// Create a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed. Explicit zeros are dropped.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: Vec<(usize, usize, f32)>,
    ) -> Result<CsrMatrix<f32>> {
        if nrows == 0 || ncols == 0 || triplets.is_empty() {
            return Ok(CsrMatrix::zeros(nrows, ncols));
        }

        for &(row, col, _) in &triplets {
            if row >= nrows || col >= ncols {
                return Err(LoomError::InvalidInput(format!(
                    "Index ({}, {}) exceeds matrix dimensions ({}, {})",
                    row, col, nrows, ncols
                )));
            }
        }

        let (row_indices, col_indices, values): (Vec<_>, Vec<_>, Vec<_>) = triplets
            .into_iter()
            .filter(|&(_, _, value)| value != 0.0)
            .multiunzip();

        let coo = CooMatrix::try_from_triplets(nrows, ncols, row_indices, col_indices, values)
            .map_err(|e| LoomError::SparseMatrix(format!("COO creation failed: {:?}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Swap rows and columns. Values are untouched.
    pub fn transpose(matrix: &CsrMatrix<f32>) -> CsrMatrix<f32> {
        matrix.transpose()
    }

    /// Materialise a CSR matrix as a row-major dense array.
    pub fn to_dense(matrix: &CsrMatrix<f32>) -> Array2<f32> {
        let mut dense = Array2::<f32>::zeros((matrix.nrows(), matrix.ncols()));
        for (row, col, &value) in matrix.triplet_iter() {
            dense[[row, col]] = value;
        }
        dense
    }

    /// Sum of every stored value, accumulated in `f64`.
    pub fn total_counts(matrix: &CsrMatrix<f32>) -> f64 {
        matrix.values().iter().map(|&v| v as f64).sum()
    }

    /// Get matrix density statistics
    pub fn get_density_stats(matrix: &CsrMatrix<f32>) -> (f64, usize, usize) {
        let total_elements = matrix.nrows() * matrix.ncols();
        let nnz = matrix.nnz();
        let density = if total_elements > 0 {
            nnz as f64 / total_elements as f64
        } else {
            0.0
        };
        (density, nnz, total_elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(matrix: &CsrMatrix<f32>) -> Vec<(usize, usize, f32)> {
        matrix.triplet_iter().map(|(r, c, v)| (r, c, *v)).collect()
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let matrix =
            SparseOps::from_triplets(2, 2, vec![(0, 1, 1.0), (0, 1, 2.5), (1, 0, 4.0)]).unwrap();
        assert_eq!(entries(&matrix), vec![(0, 1, 3.5), (1, 0, 4.0)]);
    }

    #[test]
    fn out_of_range_triplet_is_rejected() {
        let err = SparseOps::from_triplets(2, 2, vec![(2, 0, 1.0)]).unwrap_err();
        assert!(matches!(err, LoomError::InvalidInput(_)));
    }

    #[test]
    fn transpose_swaps_shape_and_coordinates() {
        let matrix = SparseOps::from_triplets(3, 2, vec![(0, 1, 5.0), (2, 0, 7.0)]).unwrap();
        let transposed = SparseOps::transpose(&matrix);
        assert_eq!((transposed.nrows(), transposed.ncols()), (2, 3));
        assert_eq!(entries(&transposed), vec![(0, 2, 7.0), (1, 0, 5.0)]);
    }

    #[test]
    fn dense_view_keeps_zeros() {
        let matrix = SparseOps::from_triplets(2, 3, vec![(1, 2, 9.0)]).unwrap();
        let dense = SparseOps::to_dense(&matrix);
        assert_eq!(dense.shape(), &[2, 3]);
        assert_eq!(dense[[1, 2]], 9.0);
        assert_eq!(dense.sum(), 9.0);
    }

    #[test]
    fn density_of_empty_matrix_is_zero() {
        let matrix = CsrMatrix::<f32>::zeros(0, 4);
        assert_eq!(SparseOps::get_density_stats(&matrix), (0.0, 0, 0));
    }
}
