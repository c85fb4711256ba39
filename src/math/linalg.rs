//! Linear systems assembled by the finite-difference solvers.
//!
//! [`SparseRowMatrix`] stores each row as a sorted list of `(column, value)` pairs. Rows are
//! short (three entries for an interior 1-D node, nine for a 2-D node with a cross term), so
//! the matrix is cheap to rebuild every time step. Direct solves use the Thomas algorithm
//! when the matrix is tridiagonal and a dense LU decomposition otherwise.

use nalgebra::{DMatrix, DVector};

use crate::core::PdeError;

const PIVOT_EPS: f64 = 1.0e-14;

/// Square matrix with sorted sparse rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRowMatrix {
    dim: usize,
    rows: Vec<Vec<(usize, f64)>>,
}

impl SparseRowMatrix {
    /// Zero matrix of size `dim x dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            rows: vec![Vec::new(); dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Removes every entry of row `i`.
    pub fn clear_row(&mut self, i: usize) {
        self.rows[i].clear();
    }

    /// Sets every entry to zero, keeping row allocations.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    /// Overwrites entry `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.dim && j < self.dim);
        let row = &mut self.rows[i];
        match row.binary_search_by_key(&j, |&(col, _)| col) {
            Ok(pos) => row[pos].1 = value,
            Err(pos) => row.insert(pos, (j, value)),
        }
    }

    /// Adds `value` to entry `(i, j)`.
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.dim && j < self.dim);
        let row = &mut self.rows[i];
        match row.binary_search_by_key(&j, |&(col, _)| col) {
            Ok(pos) => row[pos].1 += value,
            Err(pos) => row.insert(pos, (j, value)),
        }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let row = &self.rows[i];
        row.binary_search_by_key(&j, |&(col, _)| col)
            .map(|pos| row[pos].1)
            .unwrap_or(0.0)
    }

    /// Non-zero pattern of row `i`, sorted by column.
    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.rows[i]
    }

    pub fn diagonal(&self, i: usize) -> f64 {
        self.get(i, i)
    }

    /// Row `i` dotted with `x`.
    #[inline]
    pub fn row_dot(&self, i: usize, x: &[f64]) -> f64 {
        self.rows[i].iter().map(|&(j, v)| v * x[j]).sum()
    }

    /// `out = self * x`.
    pub fn mul_vec(&self, x: &[f64], out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate().take(self.dim) {
            *o = self.row_dot(i, x);
        }
    }

    /// True when every entry lies on the three central diagonals.
    pub fn is_tridiagonal(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .all(|(i, row)| row.iter().all(|&(j, _)| j + 1 >= i && j <= i + 1))
    }

    /// The three bands, when the matrix is tridiagonal.
    pub fn to_tridiagonal(&self) -> Option<Tridiagonal> {
        if !self.is_tridiagonal() {
            return None;
        }
        let mut tri = Tridiagonal::zeros(self.dim);
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, v) in row {
                if j + 1 == i {
                    tri.lower[i] = v;
                } else if j == i {
                    tri.diag[i] = v;
                } else {
                    tri.upper[i] = v;
                }
            }
        }
        Some(tri)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::<f64>::zeros(self.dim, self.dim);
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, v) in row {
                dense[(i, j)] = v;
            }
        }
        dense
    }

    /// Solves `self * x = rhs` directly.
    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, PdeError> {
        if rhs.len() != self.dim {
            return Err(PdeError::invalid(format!(
                "right-hand side has {} entries, matrix dimension is {}",
                rhs.len(),
                self.dim
            )));
        }
        if let Some(tri) = self.to_tridiagonal() {
            let mut out = vec![0.0; self.dim];
            tri.solve_into(rhs, &mut out)?;
            return Ok(out);
        }
        solve_dense(self.to_dense(), rhs)
    }
}

/// LU solve of a dense system.
pub fn solve_dense(matrix: DMatrix<f64>, rhs: &[f64]) -> Result<Vec<f64>, PdeError> {
    let b = DVector::from_column_slice(rhs);
    let Some(x) = matrix.lu().solve(&b) else {
        return Err(PdeError::numerical("system matrix is singular"));
    };
    if x.iter().any(|v| !v.is_finite()) {
        return Err(PdeError::numerical("direct solve produced non-finite values"));
    }
    Ok(x.iter().copied().collect())
}

/// Tridiagonal matrix as three bands. `lower[0]` and `upper[n - 1]` are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Tridiagonal {
    pub lower: Vec<f64>,
    pub diag: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Tridiagonal {
    pub fn zeros(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// Thomas algorithm. Allocates its own scratch space.
    pub fn solve_into(&self, rhs: &[f64], out: &mut [f64]) -> Result<(), PdeError> {
        let n = self.len();
        let mut c_star = vec![0.0; n];
        let mut d_star = vec![0.0; n];
        thomas(
            &self.lower,
            &self.diag,
            &self.upper,
            rhs,
            &mut c_star,
            &mut d_star,
            out,
        )
    }
}

/// Thomas forward sweep and back substitution with caller-provided scratch buffers.
pub fn thomas(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
    c_star: &mut [f64],
    d_star: &mut [f64],
    out: &mut [f64],
) -> Result<(), PdeError> {
    let n = diag.len();
    if n == 0 {
        return Ok(());
    }
    if [lower.len(), upper.len(), rhs.len(), c_star.len(), d_star.len(), out.len()]
        .iter()
        .any(|&len| len != n)
    {
        return Err(PdeError::invalid("tridiagonal band lengths must match"));
    }

    let mut denom = diag[0];
    if denom.abs() <= PIVOT_EPS {
        return Err(PdeError::numerical("zero pivot in tridiagonal solve at row 0"));
    }
    c_star[0] = if n > 1 { upper[0] / denom } else { 0.0 };
    d_star[0] = rhs[0] / denom;

    for i in 1..n {
        denom = diag[i] - lower[i] * c_star[i - 1];
        if denom.abs() <= PIVOT_EPS {
            return Err(PdeError::numerical(format!(
                "zero pivot in tridiagonal solve at row {i}"
            )));
        }
        c_star[i] = if i + 1 < n { upper[i] / denom } else { 0.0 };
        d_star[i] = (rhs[i] - lower[i] * d_star[i - 1]) / denom;
    }

    out[n - 1] = d_star[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d_star[i] - c_star[i] * out[i + 1];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn laplacian(n: usize) -> SparseRowMatrix {
        let mut m = SparseRowMatrix::new(n);
        for i in 0..n {
            m.set(i, i, 4.0);
            if i > 0 {
                m.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                m.set(i, i + 1, -1.0);
            }
        }
        m
    }

    #[test]
    fn tridiagonal_detection_and_thomas_solve() {
        let m = laplacian(6);
        assert!(m.is_tridiagonal());
        let x_true = [1.0, -2.0, 0.5, 3.0, 0.0, 1.5];
        let mut rhs = vec![0.0; 6];
        m.mul_vec(&x_true, &mut rhs);
        let x = m.solve(&rhs).unwrap();
        for (a, b) in x.iter().zip(x_true.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn wide_boundary_row_falls_back_to_lu() {
        let mut m = laplacian(5);
        m.clear_row(0);
        m.set(0, 0, 1.0);
        m.set(0, 1, -2.0);
        m.set(0, 2, 1.0);
        assert!(!m.is_tridiagonal());
        let x_true = [0.3, 0.1, -0.4, 2.0, 1.0];
        let mut rhs = vec![0.0; 5];
        m.mul_vec(&x_true, &mut rhs);
        let x = m.solve(&rhs).unwrap();
        for (a, b) in x.iter().zip(x_true.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn add_accumulates_and_get_reads_missing_as_zero() {
        let mut m = SparseRowMatrix::new(3);
        m.add(1, 2, 0.5);
        m.add(1, 2, 0.25);
        assert_eq!(m.get(1, 2), 0.75);
        assert_eq!(m.get(2, 0), 0.0);
        assert_eq!(m.row(1), &[(2, 0.75)]);
    }

    #[test]
    fn singular_matrix_is_a_numerical_error() {
        let m = SparseRowMatrix::new(3);
        let err = m.solve(&[1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, PdeError::NumericalError(_)));
    }
}
