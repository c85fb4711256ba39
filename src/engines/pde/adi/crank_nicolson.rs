use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::linalg::SparseRowMatrix;
use crate::math::sor::SorSolver;

use super::{
    apply_free_boundary, write_global_boundary_rows, BoundaryPolicy,
    ConvectionDiffusionPdeSolver2D, Grid2D, Operators2D, PdeDataBundle2D, PdeResults2D,
};

/// Theta-weighted implicit step over the whole flattened grid, nine-point stencil with the
/// cross term, edge rows inside the system. One SOR solve per time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrankNicolsonFiniteDifference2D {
    pub theta: f64,
    pub sor: SorSolver,
}

impl Default for CrankNicolsonFiniteDifference2D {
    fn default() -> Self {
        Self {
            theta: 0.5,
            sor: SorSolver::new(1.0, 5000),
        }
    }
}

impl CrankNicolsonFiniteDifference2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_sor(mut self, sor: SorSolver) -> Self {
        self.sor = sor;
        self
    }
}

impl ConvectionDiffusionPdeSolver2D for CrankNicolsonFiniteDifference2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError> {
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(PdeError::invalid(format!(
                "theta must be in [0, 1], got {}",
                self.theta
            )));
        }
        self.sor.validate()?;

        let grid = Grid2D::from_bundle(bundle);
        let theta = self.theta;
        let dt = grid.dt;
        let stride = grid.nx + 1;
        log::debug!(
            "Crank-Nicolson 2-D solve: {} x {} nodes, {} time steps, theta = {theta}",
            grid.nx + 1,
            grid.ny + 1,
            grid.nt
        );

        let mut values = grid.initial_values(bundle)?;
        let mut old_ops = Operators2D::new(&grid);
        let mut new_ops = Operators2D::new(&grid);
        old_ops.fill(bundle, &grid, 0.0)?;

        let mut matrix = SparseRowMatrix::new(grid.len());
        let mut rhs = vec![0.0; grid.len()];
        let mut total_sweeps = 0;

        for step in 0..grid.nt {
            let t_new = grid.time(step + 1);
            new_ops.fill(bundle, &grid, t_new)?;

            matrix.clear();
            for (_, _, p) in grid.interior_nodes() {
                rhs[p] = values[p] - (1.0 - theta) * dt * old_ops.apply_all(&values, p);

                let wx = &new_ops.x[p];
                let wy = &new_ops.y[p];
                let cross = theta * dt * new_ops.cross[p];
                matrix.set(p, p, 1.0 + theta * dt * (wx[1] + wy[1]));
                matrix.set(p, p - 1, theta * dt * wx[0]);
                matrix.set(p, p + 1, theta * dt * wx[2]);
                matrix.set(p, p - stride, theta * dt * wy[0]);
                matrix.set(p, p + stride, theta * dt * wy[2]);
                if cross != 0.0 {
                    matrix.set(p, p + stride + 1, cross);
                    matrix.set(p, p + stride - 1, -cross);
                    matrix.set(p, p - stride + 1, -cross);
                    matrix.set(p, p - stride - 1, cross);
                }
            }
            write_global_boundary_rows(bundle, &grid, t_new, &values, &mut matrix, &mut rhs)?;

            let floor = grid.free_boundary_values(bundle, t_new);
            total_sweeps += self
                .sor
                .solve(&matrix, &rhs, &mut values, floor.as_deref())?;
            apply_free_boundary(&mut values, floor.as_deref());
            std::mem::swap(&mut old_ops, &mut new_ops);
        }

        log::debug!("Crank-Nicolson 2-D solve finished, {total_sweeps} SOR sweeps");
        grid.results(values)
    }

    fn boundary_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::InSystem
    }
}
