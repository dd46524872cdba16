//! Dense row-major matrix shared by the forest and its base learners.

use crate::error::ForestError;

/// A dense, row-major `f64` matrix.
///
/// Value `(r, c)` lives at `values[r * n_cols + c]`. Used both for feature
/// inputs and for per-class probability outputs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

/// Unchecked wire form of [`Matrix`]; decoding goes through [`Matrix::new`].
#[derive(serde::Deserialize)]
struct MatrixParts {
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = ForestError;

    fn try_from(parts: MatrixParts) -> Result<Self, ForestError> {
        Matrix::new(parts.values, parts.n_rows, parts.n_cols)
    }
}

impl Matrix {
    /// Create a matrix from flat row-major storage.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::MatrixSizeMismatch`] when `values.len() != n_rows * n_cols`.
    pub fn new(values: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self, ForestError> {
        if values.len() != n_rows * n_cols {
            return Err(ForestError::MatrixSizeMismatch {
                n_values: values.len(),
                n_rows,
                n_cols,
            });
        }
        Ok(Self {
            values,
            n_rows,
            n_cols,
        })
    }

    /// Create a matrix from a slice of rows.
    ///
    /// An empty slice yields a `(0, 0)` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::RaggedRow`] when a row's length differs from the first row.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ForestError> {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(ForestError::RaggedRow {
                    row_index,
                    expected: n_cols,
                    got: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            n_rows: rows.len(),
            n_cols,
        })
    }

    /// Create a zero-filled matrix.
    #[must_use]
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            values: vec![0.0; n_rows * n_cols],
            n_rows,
            n_cols,
        }
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Borrow one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= n_rows`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.n_rows, "row {row} out of bounds ({})", self.n_rows);
        &self.values[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |r| self.row(r))
    }

    /// Borrow the flat row-major storage.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Build a new matrix from the given rows (repeats allowed) restricted to
    /// the given columns, in the given orders.
    #[must_use]
    pub fn gather(&self, rows: &[usize], cols: &[usize]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for &r in rows {
            let row = self.row(r);
            values.extend(cols.iter().map(|&c| row[c]));
        }
        Self {
            values,
            n_rows: rows.len(),
            n_cols: cols.len(),
        }
    }

    /// Build a new matrix keeping every row but only the given columns.
    #[must_use]
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let mut values = Vec::with_capacity(self.n_rows * cols.len());
        for row in self.rows() {
            values.extend(cols.iter().map(|&c| row[c]));
        }
        Self {
            values,
            n_rows: self.n_rows,
            n_cols: cols.len(),
        }
    }

    /// Add `other` element-wise into `self`. Shapes must already match.
    pub(crate) fn add_assign(&mut self, other: &Matrix) {
        debug_assert_eq!((self.n_rows, self.n_cols), (other.n_rows, other.n_cols));
        for (acc, &v) in self.values.iter_mut().zip(&other.values) {
            *acc += v;
        }
    }

    /// Divide every element by `divisor`.
    pub(crate) fn divide(&mut self, divisor: f64) {
        self.values.iter_mut().for_each(|v| *v /= divisor);
    }
}
