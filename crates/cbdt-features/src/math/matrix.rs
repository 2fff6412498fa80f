use ndarray::{Array1, Array2, ArrayView2, Axis};
use sprs::{CsMat, CsMatView, TriMat};

use crate::error::{CbdtError, Result};

/// A 2D feature block, either dense or CSR-sparse.
///
/// Both the per-extractor blocks and the combined design matrix use this
/// type. Rows are instances, columns are features.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureMatrix {
    Dense(Array2<f64>),
    Sparse(CsMat<f64>),
}

impl FeatureMatrix {
    /// An `nrows x 0` dense matrix.
    pub fn empty(nrows: usize) -> Self {
        FeatureMatrix::Dense(Array2::zeros((nrows, 0)))
    }

    /// Build a dense block from row vectors. All rows must have `ncols` entries.
    pub fn from_rows(rows: Vec<Vec<f64>>, ncols: usize) -> Result<Self> {
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(CbdtError::InvalidInput(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
            data.extend(row);
        }
        Array2::from_shape_vec((nrows, ncols), data)
            .map(FeatureMatrix::Dense)
            .map_err(|e| CbdtError::InvalidInput(e.to_string()))
    }

    /// Build a dense single-column block.
    pub fn column(values: Vec<f64>) -> Self {
        FeatureMatrix::Dense(Array1::from(values).insert_axis(Axis(1)))
    }

    /// Build a CSR block from per-row `(column, value)` entries.
    ///
    /// Entries in a row may come in any order; zeros are dropped.
    pub fn from_sparse_rows(rows: Vec<Vec<(usize, f64)>>, ncols: usize) -> Result<Self> {
        let mut triplets = TriMat::new((rows.len(), ncols));
        for (r, mut row) in rows.into_iter().enumerate() {
            row.sort_by_key(|&(col, _)| col);
            if let Some(pair) = row.windows(2).find(|pair| pair[0].0 == pair[1].0) {
                return Err(CbdtError::InvalidInput(format!(
                    "duplicate column index {} in sparse row",
                    pair[0].0
                )));
            }
            for (col, value) in row {
                if col >= ncols {
                    return Err(CbdtError::InvalidInput(format!(
                        "column index {} out of bounds for {} columns",
                        col, ncols
                    )));
                }
                if value != 0.0 {
                    triplets.add_triplet(r, col, value);
                }
            }
        }
        Ok(FeatureMatrix::Sparse(triplets.to_csr()))
    }

    pub fn nrows(&self) -> usize {
        match self {
            FeatureMatrix::Dense(m) => m.nrows(),
            FeatureMatrix::Sparse(m) => m.rows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            FeatureMatrix::Dense(m) => m.ncols(),
            FeatureMatrix::Sparse(m) => m.cols(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, FeatureMatrix::Sparse(_))
    }

    /// Non-zero `(column, value)` pairs of one row, in column order.
    pub fn row_entries(&self, row: usize) -> Vec<(usize, f64)> {
        match self {
            FeatureMatrix::Dense(m) => m
                .row(row)
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(c, v)| (c, *v))
                .collect(),
            FeatureMatrix::Sparse(m) => match m.outer_view(row) {
                Some(view) => view.iter().map(|(c, v)| (c, *v)).collect(),
                None => Vec::new(),
            },
        }
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            FeatureMatrix::Dense(m) => m.clone(),
            FeatureMatrix::Sparse(m) => m.to_dense(),
        }
    }

    /// CSR copy of the matrix.
    pub fn to_sparse(&self) -> CsMat<f64> {
        match self {
            FeatureMatrix::Sparse(m) => m.clone(),
            FeatureMatrix::Dense(m) => CsMat::csr_from_dense(m.view(), 0.0),
        }
    }

    /// Copy of the given rows, in the given order. Panics on an index out
    /// of bounds.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureMatrix {
        match self {
            FeatureMatrix::Dense(m) => FeatureMatrix::Dense(m.select(Axis(0), indices)),
            FeatureMatrix::Sparse(m) if indices.is_empty() => {
                FeatureMatrix::Sparse(CsMat::zero((0, m.cols())))
            }
            FeatureMatrix::Sparse(m) => {
                let rows: Vec<CsMatView<f64>> =
                    indices.iter().map(|&row| m.slice_outer(row..row + 1)).collect();
                FeatureMatrix::Sparse(sprs::vstack(&rows))
            }
        }
    }

    /// Smallest value, implicit sparse zeros included. `None` for a matrix
    /// without cells.
    pub fn min_value(&self) -> Option<f64> {
        match self {
            FeatureMatrix::Dense(m) => m.iter().copied().reduce(f64::min),
            FeatureMatrix::Sparse(m) => {
                let stored = m.data().iter().copied().reduce(f64::min);
                if m.nnz() < m.rows() * m.cols() {
                    Some(stored.map_or(0.0, |v| v.min(0.0)))
                } else {
                    stored
                }
            }
        }
    }
}

/// Horizontally concatenate blocks in order.
///
/// If any block is sparse the result is sparse, otherwise dense. All
/// blocks must have the same number of rows.
pub fn hstack(blocks: &[FeatureMatrix]) -> Result<FeatureMatrix> {
    let Some(first) = blocks.first() else {
        return Ok(FeatureMatrix::empty(0));
    };
    let nrows = first.nrows();
    if let Some(bad) = blocks.iter().find(|b| b.nrows() != nrows) {
        return Err(CbdtError::InvalidInput(format!(
            "cannot stack blocks with {} and {} rows",
            nrows,
            bad.nrows()
        )));
    }

    if blocks.iter().any(FeatureMatrix::is_sparse) {
        let sparse: Vec<CsMat<f64>> = blocks.iter().map(FeatureMatrix::to_sparse).collect();
        let views: Vec<CsMatView<f64>> = sparse.iter().map(|m| m.view()).collect();
        // sprs stacks columns in CSC
        Ok(FeatureMatrix::Sparse(sprs::hstack(&views).to_csr()))
    } else {
        let views: Vec<ArrayView2<f64>> = blocks
            .iter()
            .filter_map(|block| match block {
                FeatureMatrix::Dense(m) => Some(m.view()),
                FeatureMatrix::Sparse(_) => None,
            })
            .collect();
        ndarray::concatenate(Axis(1), &views)
            .map(FeatureMatrix::Dense)
            .map_err(|e| CbdtError::InvalidInput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense() -> FeatureMatrix {
        FeatureMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 4.0]], 2).unwrap()
    }

    fn sparse() -> FeatureMatrix {
        FeatureMatrix::from_sparse_rows(vec![vec![(0, 5.0)], vec![], vec![(1, 6.0), (0, 7.0)]], 3)
            .unwrap()
    }

    #[test]
    fn test_hstack_dense_stays_dense() {
        let stacked = hstack(&[dense(), FeatureMatrix::column(vec![9.0, 8.0, 7.0])]).unwrap();
        assert!(!stacked.is_sparse());
        assert_eq!(stacked.shape(), (3, 3));
        assert_eq!(stacked.to_dense()[(2, 2)], 7.0);
    }

    #[test]
    fn test_hstack_promotes_to_sparse() {
        let stacked = hstack(&[dense(), sparse()]).unwrap();
        assert!(stacked.is_sparse());
        assert_eq!(stacked.shape(), (3, 5));
        let d = stacked.to_dense();
        assert_eq!(d.row(2).to_vec(), vec![3.0, 4.0, 7.0, 6.0, 0.0]);
        assert_eq!(d.row(1).to_vec(), vec![0.0, 2.0, 0.0, 0.0, 0.0]);
        assert_eq!(stacked.row_entries(1), vec![(1, 2.0)]);
    }

    #[test]
    fn test_hstack_zero_rows() {
        let stacked = hstack(&[FeatureMatrix::column(vec![]), sparse().select_rows(&[])]).unwrap();
        assert_eq!(stacked.shape(), (0, 4));
    }

    #[test]
    fn test_hstack_row_mismatch() {
        let short = FeatureMatrix::column(vec![1.0]);
        assert!(hstack(&[dense(), short]).is_err());
    }

    #[test]
    fn test_select_rows_sparse_and_dense_agree() {
        let s = hstack(&[dense(), sparse()]).unwrap();
        let d = FeatureMatrix::Dense(s.to_dense());
        let idx = [2, 0, 2];
        let picked = s.select_rows(&idx);
        assert!(picked.is_sparse());
        assert_eq!(picked.to_dense(), d.select_rows(&idx).to_dense());
    }

    #[test]
    fn test_sparse_rows_validated() {
        assert!(FeatureMatrix::from_sparse_rows(vec![vec![(3, 1.0)]], 3).is_err());
        assert!(FeatureMatrix::from_sparse_rows(vec![vec![(1, 1.0), (1, 2.0)]], 3).is_err());
        let m = FeatureMatrix::from_sparse_rows(vec![vec![(2, 0.0), (0, 1.5)]], 3).unwrap();
        assert_eq!(m.row_entries(0), vec![(0, 1.5)]);
    }

    #[test]
    fn test_to_sparse_drops_zeros() {
        let s = dense().to_sparse();
        assert_eq!(s.nnz(), 4);
        assert_eq!(FeatureMatrix::Sparse(s).to_dense(), dense().to_dense());
    }

    #[test]
    fn test_min_value_accounts_for_implicit_zeros() {
        assert_eq!(sparse().min_value(), Some(0.0));
        let negative = FeatureMatrix::from_rows(vec![vec![-1.0, 2.0]], 2).unwrap();
        assert_eq!(negative.min_value(), Some(-1.0));
    }
}
