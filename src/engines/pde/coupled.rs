//! Two linearly coupled one-dimensional equations solved as one block system.
//!
//! `∂V/∂t + L₁ V + λ₁ W = 0` and `∂W/∂t + L₂ W + λ₂ V = 0` share a grid. Each time step
//! assembles the `2N x 2N` theta-method system with the coupling on the off-diagonal blocks and
//! solves it once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::linalg::SparseRowMatrix;
use crate::math::sor::SorSolver;

use super::coefficients::CoupledCoefficients;
use super::data_bundle::PdeDataBundle1D;
use super::fd_common::OperatorBands;
use super::results::{PdeFullResults1D, PdeSolution1D, PdeTerminalResults1D};
use super::theta_method::{write_boundary_rows, FREE_BOUNDARY_SOR_MAX_ITERATIONS};

/// Theta-method solver for a pair of coupled equations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoupledFiniteDifference {
    pub theta: f64,
    pub show_full_results: bool,
    pub sor: SorSolver,
}

impl Default for CoupledFiniteDifference {
    fn default() -> Self {
        Self {
            theta: 0.5,
            show_full_results: false,
            sor: SorSolver::new(1.0, FREE_BOUNDARY_SOR_MAX_ITERATIONS),
        }
    }
}

impl CoupledFiniteDifference {
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

    pub fn with_sor_omega(mut self, omega: f64) -> Self {
        self.sor.omega = omega;
        self
    }

    /// Solves both equations. The bundles must hold the same grid handle; a second grid with
    /// identical nodes is rejected.
    pub fn solve(
        &self,
        first: &PdeDataBundle1D<CoupledCoefficients>,
        second: &PdeDataBundle1D<CoupledCoefficients>,
    ) -> Result<(PdeSolution1D, PdeSolution1D), PdeError> {
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(PdeError::invalid(format!(
                "theta must be in [0, 1], got {}",
                self.theta
            )));
        }
        self.sor.validate()?;
        if !Arc::ptr_eq(first.grid_handle(), second.grid_handle()) {
            return Err(PdeError::Configuration(
                "coupled equations must share one grid instance".to_string(),
            ));
        }

        let grid = first.grid_handle();
        let n = grid.num_space_nodes();
        let nt = grid.num_time_nodes();
        let theta = self.theta;
        let lambda1 = first.coefficients().lambda();
        let lambda2 = second.coefficients().lambda();

        log::debug!(
            "coupled solve: 2 x {n} space nodes, {nt} time nodes, theta = {theta}, lambda = ({lambda1}, {lambda2})"
        );

        let mut v = first.initial_condition().to_vec();
        let mut w = second.initial_condition().to_vec();
        let mut full = self
            .show_full_results
            .then(|| (vec![v.clone()], vec![w.clone()]));

        let mut old1 = OperatorBands::zeros(n);
        let mut old2 = OperatorBands::zeros(n);
        let mut new1 = OperatorBands::zeros(n);
        let mut new2 = OperatorBands::zeros(n);
        let t0 = grid.time_node(0);
        old1.fill_standard(first.coefficients().standard(), grid, t0, false)?;
        old2.fill_standard(second.coefficients().standard(), grid, t0, false)?;

        let mut matrix = SparseRowMatrix::new(2 * n);
        let mut rhs = vec![0.0; 2 * n];
        let has_floor = first.free_boundary().is_some() || second.free_boundary().is_some();

        for step in 0..nt - 1 {
            let t_old = grid.time_node(step);
            let t_new = grid.time_node(step + 1);
            let dt = grid.time_step(step);

            for i in 1..n - 1 {
                rhs[i] = v[i] - (1.0 - theta) * dt * (old1.apply(&v, i) + lambda1 * w[i]);
                rhs[n + i] = w[i] - (1.0 - theta) * dt * (old2.apply(&w, i) + lambda2 * v[i]);
            }

            new1.fill_standard(first.coefficients().standard(), grid, t_new, false)?;
            new2.fill_standard(second.coefficients().standard(), grid, t_new, false)?;

            matrix.clear();
            for (offset, ops, lambda) in [(0, &new1, lambda1), (n, &new2, lambda2)] {
                let partner = if offset == 0 { n } else { 0 };
                for i in 1..n - 1 {
                    let r = offset + i;
                    matrix.set(r, r - 1, theta * dt * ops.lower[i]);
                    matrix.set(r, r, 1.0 + theta * dt * ops.diag[i]);
                    matrix.set(r, r + 1, theta * dt * ops.upper[i]);
                    matrix.set(r, partner + i, theta * dt * lambda);
                }
            }
            write_boundary_rows(
                first.lower_boundary(),
                first.upper_boundary(),
                first.coefficients(),
                grid,
                (t_old, t_new),
                &v,
                &mut matrix,
                &mut rhs,
                0,
            )?;
            write_boundary_rows(
                second.lower_boundary(),
                second.upper_boundary(),
                second.coefficients(),
                grid,
                (t_old, t_new),
                &w,
                &mut matrix,
                &mut rhs,
                n,
            )?;

            let mut next = matrix.solve(&rhs)?;
            if has_floor {
                let mut floor = vec![f64::NEG_INFINITY; 2 * n];
                if let Some(values) = first.free_boundary_values(t_new) {
                    floor[..n].copy_from_slice(&values);
                }
                if let Some(values) = second.free_boundary_values(t_new) {
                    floor[n..].copy_from_slice(&values);
                }
                self.sor.solve(&matrix, &rhs, &mut next, Some(&floor))?;
            }
            v.copy_from_slice(&next[..n]);
            w.copy_from_slice(&next[n..]);

            if let Some((rows_v, rows_w)) = full.as_mut() {
                rows_v.push(v.clone());
                rows_w.push(w.clone());
            }
            std::mem::swap(&mut old1, &mut new1);
            std::mem::swap(&mut old2, &mut new2);
        }

        log::debug!("coupled solve finished");

        Ok(match full {
            Some((rows_v, rows_w)) => (
                PdeSolution1D::Full(PdeFullResults1D::new(Arc::clone(grid), rows_v)),
                PdeSolution1D::Full(PdeFullResults1D::new(Arc::clone(grid), rows_w)),
            ),
            None => (
                PdeSolution1D::Terminal(PdeTerminalResults1D::new(Arc::clone(grid), v)),
                PdeSolution1D::Terminal(PdeTerminalResults1D::new(Arc::clone(grid), w)),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constant_surface;
    use crate::engines::pde::boundary::{BoundaryCondition, DirichletBoundaryCondition};
    use crate::engines::pde::coefficients::StandardCoefficients;
    use crate::engines::pde::grid::PdeGrid1D;
    use crate::engines::pde::results::PdeResults1D;
    use crate::engines::pde::theta_method::{
        ConvectionDiffusionPdeSolver, ThetaMethodFiniteDifference,
    };
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn dirichlet(level: f64) -> Arc<dyn BoundaryCondition> {
        Arc::new(DirichletBoundaryCondition::constant(0.0, level).unwrap())
    }

    fn coupled(lambda: f64) -> CoupledCoefficients {
        CoupledCoefficients::new(
            constant_surface(-1.0),
            constant_surface(0.0),
            constant_surface(0.0),
            lambda,
        )
        .unwrap()
    }

    fn bundle(
        grid: Arc<PdeGrid1D>,
        lambda: f64,
        scale: f64,
    ) -> PdeDataBundle1D<CoupledCoefficients> {
        PdeDataBundle1D::from_initial_function(
            coupled(lambda),
            move |x| scale * (PI * x).sin(),
            dirichlet(0.0),
            dirichlet(1.0),
            grid,
        )
        .unwrap()
    }

    #[test]
    fn bundles_on_distinct_but_equal_grids_are_rejected() {
        let g1 = Arc::new(PdeGrid1D::uniform(5, 11, 0.1, 0.0, 1.0).unwrap());
        let g2 = Arc::new(PdeGrid1D::uniform(5, 11, 0.1, 0.0, 1.0).unwrap());
        assert_eq!(*g1, *g2);
        let err = CoupledFiniteDifference::new()
            .solve(&bundle(g1, 0.1, 1.0), &bundle(g2, 0.1, 1.0))
            .unwrap_err();
        assert!(matches!(err, PdeError::Configuration(_)));
    }

    #[test]
    fn zero_coupling_matches_two_independent_solves() {
        let grid = Arc::new(PdeGrid1D::uniform(11, 21, 0.1, 0.0, 1.0).unwrap());
        let b1 = bundle(Arc::clone(&grid), 0.0, 1.0);
        let b2 = bundle(Arc::clone(&grid), 0.0, 2.0);
        let (v, w) = CoupledFiniteDifference::new().solve(&b1, &b2).unwrap();

        let single = ThetaMethodFiniteDifference::new().with_exponential_fitting(false);
        let standard = StandardCoefficients::new(
            constant_surface(-1.0),
            constant_surface(0.0),
            constant_surface(0.0),
        );
        let v_ref = single.solve(&b1.with_coefficients(standard.clone())).unwrap();
        let w_ref = single.solve(&b2.with_coefficients(standard)).unwrap();
        for i in 0..21 {
            assert_relative_eq!(v.function_value(i), v_ref.function_value(i), epsilon = 1e-12);
            assert_relative_eq!(w.function_value(i), w_ref.function_value(i), epsilon = 1e-12);
        }
    }

    #[test]
    fn symmetric_coupling_acts_on_sum_and_difference() {
        // with equal operators, V + W decays with rate π² + λ and V - W with π² - λ
        let lambda = 2.0;
        let grid = Arc::new(PdeGrid1D::uniform(41, 41, 0.1, 0.0, 1.0).unwrap());
        let b1 = bundle(Arc::clone(&grid), lambda, 1.0);
        let b2 = bundle(Arc::clone(&grid), lambda, 0.5);
        let (v, w) = CoupledFiniteDifference::new().solve(&b1, &b2).unwrap();

        let mid = 20;
        let sum = v.function_value(mid) + w.function_value(mid);
        let diff = v.function_value(mid) - w.function_value(mid);
        let t = 0.1;
        assert_relative_eq!(sum, 1.5 * (-(PI * PI + lambda) * t).exp(), max_relative = 2e-3);
        assert_relative_eq!(diff, 0.5 * (-(PI * PI - lambda) * t).exp(), max_relative = 2e-3);
    }
}
