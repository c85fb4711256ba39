use serde::{Deserialize, Serialize};

use crate::core::PdeError;

use super::{
    apply_boundaries, apply_free_boundary, BoundaryPolicy, ConvectionDiffusionPdeSolver2D, Grid2D,
    Operators2D, PdeDataBundle2D, PdeResults2D,
};

/// Forward-Euler stepping `V_{n+1} = V_n - Δt L V_n` on the interior, edges re-imposed after
/// the step. Stable only for small `Δt` relative to `Δx²` and `Δy²`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplicitFiniteDifference2D;

impl ExplicitFiniteDifference2D {
    pub fn new() -> Self {
        Self
    }
}

impl ConvectionDiffusionPdeSolver2D for ExplicitFiniteDifference2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError> {
        let grid = Grid2D::from_bundle(bundle);
        log::debug!(
            "explicit 2-D solve: {} x {} nodes, {} time steps",
            grid.nx + 1,
            grid.ny + 1,
            grid.nt
        );

        let mut values = grid.initial_values(bundle)?;
        let mut next = values.clone();
        let mut ops = Operators2D::new(&grid);

        for step in 0..grid.nt {
            let t_old = grid.time(step);
            let t_new = grid.time(step + 1);
            ops.fill(bundle, &grid, t_old)?;

            next.copy_from_slice(&values);
            for (_, _, p) in grid.interior_nodes() {
                next[p] = values[p] - grid.dt * ops.apply_all(&values, p);
            }
            apply_boundaries(bundle, &grid, t_new, &values, &mut next)?;
            let floor = grid.free_boundary_values(bundle, t_new);
            apply_free_boundary(&mut next, floor.as_deref());
            std::mem::swap(&mut values, &mut next);
        }

        log::debug!("explicit 2-D solve finished");
        grid.results(values)
    }

    fn boundary_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::EndOfStep
    }
}
