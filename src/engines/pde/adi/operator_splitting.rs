use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::sor::SorSolver;

use super::{
    apply_boundaries, apply_free_boundary, sweep, Axis, BoundaryPolicy,
    ConvectionDiffusionPdeSolver2D, Grid2D, Operators2D, PdeDataBundle2D, PdeResults2D,
};

/// Strang-type operator splitting: half an explicit cross-term step, a Crank-Nicolson step in
/// `x`, a Crank-Nicolson step in `y`, and the other explicit half of the cross term. Edges are
/// re-imposed after every sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatorSplittingFiniteDifference2D {
    pub sor: SorSolver,
}

impl Default for OperatorSplittingFiniteDifference2D {
    fn default() -> Self {
        Self {
            sor: SorSolver::new(1.0, 1000),
        }
    }
}

impl OperatorSplittingFiniteDifference2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sor(mut self, sor: SorSolver) -> Self {
        self.sor = sor;
        self
    }
}

impl ConvectionDiffusionPdeSolver2D for OperatorSplittingFiniteDifference2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError> {
        self.sor.validate()?;
        let grid = Grid2D::from_bundle(bundle);
        let half_dt = 0.5 * grid.dt;
        log::debug!(
            "operator splitting 2-D solve: {} x {} nodes, {} time steps",
            grid.nx + 1,
            grid.ny + 1,
            grid.nt
        );

        let mut values = grid.initial_values(bundle)?;
        let mut stage = values.clone();
        let mut rhs = vec![0.0; grid.len()];
        let mut old_ops = Operators2D::new(&grid);
        let mut new_ops = Operators2D::new(&grid);
        let mut total_sweeps = 0;

        for step in 0..grid.nt {
            let t_old = grid.time(step);
            let t_new = grid.time(step + 1);
            old_ops.fill(bundle, &grid, t_old)?;
            new_ops.fill(bundle, &grid, t_new)?;
            let old_floor = grid.free_boundary_values(bundle, t_old);
            let new_floor = grid.free_boundary_values(bundle, t_new);

            // cross term, first half
            stage.copy_from_slice(&values);
            for (_, _, p) in grid.interior_nodes() {
                stage[p] = values[p] - half_dt * old_ops.apply_cross(&values, p);
            }
            apply_boundaries(bundle, &grid, t_old, &values, &mut stage)?;
            apply_free_boundary(&mut stage, old_floor.as_deref());

            // x, then y, Crank-Nicolson
            for axis in [Axis::X, Axis::Y] {
                for (_, _, p) in grid.interior_nodes() {
                    rhs[p] = stage[p] - half_dt * old_ops.apply(axis, &stage, p);
                }
                values.copy_from_slice(&stage);
                total_sweeps += sweep(
                    axis,
                    bundle,
                    &grid,
                    &new_ops,
                    half_dt,
                    t_new,
                    &rhs,
                    &stage,
                    &mut values,
                    &self.sor,
                    new_floor.as_deref(),
                )?;
                apply_boundaries(bundle, &grid, t_new, &stage, &mut values)?;
                apply_free_boundary(&mut values, new_floor.as_deref());
                stage.copy_from_slice(&values);
            }

            // cross term, second half
            for (_, _, p) in grid.interior_nodes() {
                values[p] = stage[p] - half_dt * new_ops.apply_cross(&stage, p);
            }
            apply_boundaries(bundle, &grid, t_new, &stage, &mut values)?;
            apply_free_boundary(&mut values, new_floor.as_deref());
        }

        log::debug!("operator splitting 2-D solve finished, {total_sweeps} SOR sweeps");
        grid.results(values)
    }

    fn boundary_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::EverySubStep
    }
}
