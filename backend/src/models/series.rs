//! Dense time × family matrices
//!
//! Every per-family quantity the engine tracks is stored as one row per
//! generation and one column per family, in row-major order.

use serde::{Deserialize, Serialize};

/// Row-major `T × N` matrix indexed by (generation, family).
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::Series;
///
/// let mut income: Series<f64> = Series::zeros(3, 4);
/// income.row_mut(0).fill(1.0);
/// assert_eq!(income.row(0), &[1.0, 1.0, 1.0, 1.0]);
/// assert_eq!(income.row(1), &[0.0, 0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Series<T> {
    /// Allocate a `rows × cols` matrix filled with `T::default()`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }
}

impl<T: Copy> Series<T> {
    /// Build a matrix from explicit rows.
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n_rows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Some(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    /// Number of generations (rows)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of families (columns)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `t` as a slice.
    ///
    /// # Panics
    /// Panics if `t >= rows()`.
    pub fn row(&self, t: usize) -> &[T] {
        let start = t * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Mutable row `t`.
    ///
    /// # Panics
    /// Panics if `t >= rows()`.
    pub fn row_mut(&mut self, t: usize) -> &mut [T] {
        let start = t * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Overwrite row `t` with `values`.
    ///
    /// # Panics
    /// Panics if `values.len() != cols()`.
    pub fn set_row(&mut self, t: usize, values: &[T]) {
        self.row_mut(t).copy_from_slice(values);
    }

    /// Single cell (generation `t`, family `i`)
    pub fn get(&self, t: usize, i: usize) -> T {
        self.data[t * self.cols + i]
    }

    /// Iterate over rows in generation order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact panics on 0, and an empty-width matrix has no data anyway
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }
}

impl Series<usize> {
    /// Widen an integer matrix into reals for statistics.
    pub fn to_f64(&self) -> Series<f64> {
        Series {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| v as f64).collect(),
        }
    }
}
