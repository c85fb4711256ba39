//! Theta-method time stepping for one-dimensional convection-diffusion problems.
//!
//! Each step from `t_n` to `t_{n+1}` solves
//!
//! `(I + θ Δt L(t_{n+1})) V_{n+1} = (I - (1 - θ) Δt L(t_n)) V_n`
//!
//! on the interior nodes, with the two edge rows replaced by the boundary conditions.
//! `θ = 0` is explicit, `θ = 1` fully implicit and `θ = 0.5` Crank-Nicolson.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::linalg::SparseRowMatrix;
use crate::math::sor::SorSolver;

use super::boundary::BoundaryCondition;
use super::coefficients::{CoefficientsRef, ConvectionDiffusionCoefficients};
use super::data_bundle::PdeDataBundle1D;
use super::fd_common::OperatorBands;
use super::grid::PdeGrid1D;
use super::results::{PdeFullResults1D, PdeSolution1D, PdeTerminalResults1D};

/// Iteration cap of the projected SOR used for free-boundary problems.
pub const FREE_BOUNDARY_SOR_MAX_ITERATIONS: usize = 5000;

/// A one-dimensional solver that can be wrapped, e.g. by Richardson extrapolation.
pub trait ConvectionDiffusionPdeSolver {
    fn solve<C>(&self, bundle: &PdeDataBundle1D<C>) -> Result<PdeSolution1D, PdeError>
    where
        C: ConvectionDiffusionCoefficients + Clone;
}

/// Theta-method finite-difference solver.
///
/// ```rust
/// use openferric_pde::engines::pde::ThetaMethodFiniteDifference;
///
/// let solver = ThetaMethodFiniteDifference::new()
///     .with_theta(1.0)
///     .with_full_results(true);
/// assert_eq!(solver.theta, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaMethodFiniteDifference {
    /// Implicitness weight in `[0, 1]`.
    pub theta: f64,
    /// Record every time slice instead of only the last one.
    pub show_full_results: bool,
    /// Replace the diffusion coefficient by its exponentially fitted value (standard
    /// coefficients only).
    pub exponential_fitting: bool,
    /// Projected SOR settings used when the bundle carries a free boundary.
    pub sor: SorSolver,
}

impl Default for ThetaMethodFiniteDifference {
    fn default() -> Self {
        Self {
            theta: 0.5,
            show_full_results: false,
            exponential_fitting: true,
            sor: SorSolver::new(1.0, FREE_BOUNDARY_SOR_MAX_ITERATIONS),
        }
    }
}

impl ThetaMethodFiniteDifference {
    /// Crank-Nicolson with exponential fitting, terminal results only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_full_results(mut self, show_full_results: bool) -> Self {
        self.show_full_results = show_full_results;
        self
    }

    pub fn with_exponential_fitting(mut self, exponential_fitting: bool) -> Self {
        self.exponential_fitting = exponential_fitting;
        self
    }

    /// Relaxation factor of the free-boundary SOR.
    pub fn with_sor_omega(mut self, omega: f64) -> Self {
        self.sor.omega = omega;
        self
    }

    pub fn validate(&self) -> Result<(), PdeError> {
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(PdeError::invalid(format!(
                "theta must be in [0, 1], got {}",
                self.theta
            )));
        }
        self.sor.validate()
    }

    fn march<C, F>(
        &self,
        bundle: &PdeDataBundle1D<C>,
        mut fill: F,
    ) -> Result<PdeSolution1D, PdeError>
    where
        C: ConvectionDiffusionCoefficients + Clone,
        F: FnMut(&mut OperatorBands, f64) -> Result<usize, PdeError>,
    {
        let grid = bundle.grid_handle();
        let n = grid.num_space_nodes();
        let nt = grid.num_time_nodes();
        let theta = self.theta;
        let coefficients: &dyn ConvectionDiffusionCoefficients = bundle.coefficients();

        log::debug!(
            "theta-method solve: {n} space nodes, {nt} time nodes, theta = {theta}, free boundary = {}",
            bundle.free_boundary().is_some()
        );

        let mut f = bundle.initial_condition().to_vec();
        let mut full = self.show_full_results.then(|| {
            let mut rows = Vec::with_capacity(nt);
            rows.push(f.clone());
            rows
        });

        let mut old_ops = OperatorBands::zeros(n);
        let mut new_ops = OperatorBands::zeros(n);
        let mut fitting_warned = false;
        let t0 = grid.time_node(0);
        let convection_nodes = fill(&mut old_ops, t0)?;
        warn_convection_once(&mut fitting_warned, convection_nodes, t0);

        let mut rhs = vec![0.0; n];
        let mut matrix = SparseRowMatrix::new(n);
        let mut total_sweeps = 0;

        for step in 0..nt - 1 {
            let t_old = grid.time_node(step);
            let t_new = grid.time_node(step + 1);
            let dt = grid.time_step(step);

            for i in 1..n - 1 {
                rhs[i] = f[i] - (1.0 - theta) * dt * old_ops.apply(&f, i);
            }

            let convection_nodes = fill(&mut new_ops, t_new)?;
            warn_convection_once(&mut fitting_warned, convection_nodes, t_new);

            matrix.clear();
            for i in 1..n - 1 {
                matrix.set(i, i - 1, theta * dt * new_ops.lower[i]);
                matrix.set(i, i, 1.0 + theta * dt * new_ops.diag[i]);
                matrix.set(i, i + 1, theta * dt * new_ops.upper[i]);
            }
            write_boundary_rows(
                bundle.lower_boundary(),
                bundle.upper_boundary(),
                coefficients,
                grid,
                (t_old, t_new),
                &f,
                &mut matrix,
                &mut rhs,
                0,
            )?;

            let mut next = matrix.solve(&rhs)?;
            if let Some(floor) = bundle.free_boundary_values(t_new) {
                total_sweeps += self.sor.solve(&matrix, &rhs, &mut next, Some(&floor))?;
            }
            f = next;

            if let Some(rows) = full.as_mut() {
                rows.push(f.clone());
            }
            std::mem::swap(&mut old_ops, &mut new_ops);
        }

        log::debug!(
            "theta-method solve finished at t = {}, {total_sweeps} projected SOR sweeps",
            grid.time_node(nt - 1)
        );

        Ok(match full {
            Some(rows) => PdeSolution1D::Full(PdeFullResults1D::new(Arc::clone(grid), rows)),
            None => PdeSolution1D::Terminal(PdeTerminalResults1D::new(Arc::clone(grid), f)),
        })
    }
}

impl ConvectionDiffusionPdeSolver for ThetaMethodFiniteDifference {
    fn solve<C>(&self, bundle: &PdeDataBundle1D<C>) -> Result<PdeSolution1D, PdeError>
    where
        C: ConvectionDiffusionCoefficients + Clone,
    {
        self.validate()?;
        let fitting = self.exponential_fitting;
        match bundle.coefficients().variant() {
            CoefficientsRef::Standard(coefficients) => self.march(bundle, |ops, t| {
                ops.fill_standard(coefficients, bundle.grid(), t, fitting)
            }),
            CoefficientsRef::Full(coefficients) => self.march(bundle, |ops, t| {
                ops.fill_full(coefficients, bundle.grid(), t).map(|()| 0)
            }),
            CoefficientsRef::Coupled(_) => Err(PdeError::invalid(
                "coupled coefficients must be solved together with their partner equation by CoupledFiniteDifference",
            )),
        }
    }
}

fn warn_convection_once(warned: &mut bool, convection_nodes: usize, t: f64) {
    if convection_nodes > 0 && !*warned {
        *warned = true;
        log::warn!(
            "convection dominates diffusion at {convection_nodes} nodes (t = {t}); exponential fitting switches to upwind differencing there"
        );
    }
}

/// Overwrites the two edge rows of the block starting at `offset`. Matrix rows use the new
/// time, right rows act on `f_old` at the old time, constants use the new time.
#[allow(clippy::too_many_arguments)]
pub(crate) fn write_boundary_rows(
    lower: &dyn BoundaryCondition,
    upper: &dyn BoundaryCondition,
    coefficients: &dyn ConvectionDiffusionCoefficients,
    grid: &PdeGrid1D,
    (t_old, t_new): (f64, f64),
    f_old: &[f64],
    matrix: &mut SparseRowMatrix,
    rhs: &mut [f64],
    offset: usize,
) -> Result<(), PdeError> {
    let n = grid.num_space_nodes();
    let check = |side: &str, row: &[f64], right: &[f64]| {
        if row.is_empty() || row.len() > n || right.len() > n {
            return Err(PdeError::invalid(format!(
                "{side} boundary rows have lengths {} and {}, grid has {n} space nodes",
                row.len(),
                right.len()
            )));
        }
        Ok(())
    };

    let row = lower.left_matrix_condition(coefficients, grid, t_new);
    let right = lower.right_matrix_condition(coefficients, grid, t_old);
    check("lower", &row, &right)?;
    matrix.clear_row(offset);
    for (k, &v) in row.iter().enumerate() {
        matrix.set(offset, offset + k, v);
    }
    let carried: f64 = right.iter().zip(f_old).map(|(w, v)| w * v).sum();
    rhs[offset] = carried + lower.constant(coefficients, grid, t_new);

    let last = offset + n - 1;
    let row = upper.left_matrix_condition(coefficients, grid, t_new);
    let right = upper.right_matrix_condition(coefficients, grid, t_old);
    check("upper", &row, &right)?;
    matrix.clear_row(last);
    let first_col = offset + n - row.len();
    for (k, &v) in row.iter().enumerate() {
        matrix.set(last, first_col + k, v);
    }
    let carried: f64 = right
        .iter()
        .enumerate()
        .map(|(k, w)| w * f_old[n - 1 - k])
        .sum();
    rhs[last] = carried + upper.constant(coefficients, grid, t_new);
    Ok(())
}
