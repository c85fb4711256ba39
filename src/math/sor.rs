//! Successive over-relaxation, optionally projected onto a lower bound.

use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::linalg::SparseRowMatrix;

/// Relative convergence threshold on `Σ correction² / (Σ value² + ε)`.
pub const SOR_TOLERANCE: f64 = 1.0e-18;
const SCALE_EPS: f64 = 1.0e-10;

/// Gauss-Seidel sweeps with relaxation factor `omega`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SorSolver {
    /// Relaxation factor in `(0, 2)`.
    pub omega: f64,
    /// Sweeps allowed before the solve is abandoned.
    pub max_iterations: usize,
}

impl Default for SorSolver {
    fn default() -> Self {
        Self {
            omega: 1.0,
            max_iterations: 1000,
        }
    }
}

impl SorSolver {
    pub fn new(omega: f64, max_iterations: usize) -> Self {
        Self {
            omega,
            max_iterations,
        }
    }

    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<(), PdeError> {
        if !(self.omega > 0.0 && self.omega < 2.0) {
            return Err(PdeError::Configuration(format!(
                "SOR relaxation factor must lie in (0, 2), got {}",
                self.omega
            )));
        }
        if self.max_iterations == 0 {
            return Err(PdeError::Configuration(
                "SOR needs at least one iteration".to_string(),
            ));
        }
        Ok(())
    }

    /// Iterates `x` towards the solution of `matrix * x = rhs`, starting from its current
    /// contents. With `floor`, every update is clipped so that `x[j] >= floor[j]`.
    ///
    /// Returns the number of sweeps performed.
    pub fn solve(
        &self,
        matrix: &SparseRowMatrix,
        rhs: &[f64],
        x: &mut [f64],
        floor: Option<&[f64]>,
    ) -> Result<usize, PdeError> {
        self.validate()?;
        let n = matrix.dim();
        if rhs.len() != n || x.len() != n || floor.is_some_and(|f| f.len() != n) {
            return Err(PdeError::invalid("SOR vector lengths must match the matrix"));
        }

        let mut inv_diag = Vec::with_capacity(n);
        for j in 0..n {
            let d = matrix.diagonal(j);
            if d == 0.0 || !d.is_finite() {
                return Err(PdeError::numerical(format!(
                    "SOR needs a non-zero diagonal, row {j} has {d}"
                )));
            }
            inv_diag.push(self.omega / d);
        }

        for iteration in 1..=self.max_iterations {
            let mut err_sq = 0.0;
            let mut scale = 0.0;
            for j in 0..n {
                let mut correction = inv_diag[j] * (rhs[j] - matrix.row_dot(j, x));
                if let Some(floor) = floor {
                    correction = correction.max(floor[j] - x[j]);
                }
                x[j] += correction;
                err_sq += correction * correction;
                scale += x[j] * x[j];
            }
            if !err_sq.is_finite() {
                return Err(PdeError::numerical("SOR iteration diverged"));
            }
            if err_sq / (scale + SCALE_EPS) < SOR_TOLERANCE {
                log::trace!("SOR converged after {iteration} sweeps (n = {n})");
                return Ok(iteration);
            }
        }

        Err(PdeError::ConvergenceFailure(format!(
            "SOR did not converge within {} iterations",
            self.max_iterations
        )))
    }
}
