use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::sor::SorSolver;

use super::{
    apply_boundaries, apply_free_boundary, sweep, Axis, BoundaryPolicy,
    ConvectionDiffusionPdeSolver2D, Grid2D, Operators2D, PdeDataBundle2D, PdeResults2D,
};

/// Peaceman-Rachford ADI: a half step implicit in `x` followed by a half step implicit in `y`,
/// the other direction and the cross term explicit. All edges are re-imposed after each half
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeacemanRachfordFiniteDifference2D {
    pub sor: SorSolver,
}

impl Default for PeacemanRachfordFiniteDifference2D {
    fn default() -> Self {
        Self {
            sor: SorSolver::new(1.0, 1000),
        }
    }
}

impl PeacemanRachfordFiniteDifference2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sor(mut self, sor: SorSolver) -> Self {
        self.sor = sor;
        self
    }
}

impl ConvectionDiffusionPdeSolver2D for PeacemanRachfordFiniteDifference2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError> {
        self.sor.validate()?;
        let grid = Grid2D::from_bundle(bundle);
        let half_dt = 0.5 * grid.dt;
        log::debug!(
            "Peaceman-Rachford 2-D solve: {} x {} nodes, {} time steps",
            grid.nx + 1,
            grid.ny + 1,
            grid.nt
        );

        let mut values = grid.initial_values(bundle)?;
        let mut half = values.clone();
        let mut rhs = vec![0.0; grid.len()];
        let mut old_ops = Operators2D::new(&grid);
        let mut mid_ops = Operators2D::new(&grid);
        let mut new_ops = Operators2D::new(&grid);
        let mut total_sweeps = 0;

        for step in 0..grid.nt {
            let t_old = grid.time(step);
            let t_mid = t_old + half_dt;
            let t_new = grid.time(step + 1);
            old_ops.fill(bundle, &grid, t_old)?;
            mid_ops.fill(bundle, &grid, t_mid)?;
            new_ops.fill(bundle, &grid, t_new)?;

            // (I + Δt/2 Lx) V* = V - Δt/2 (Ly + Lxy) V
            for (_, _, p) in grid.interior_nodes() {
                rhs[p] = values[p]
                    - half_dt
                        * (old_ops.apply(Axis::Y, &values, p) + old_ops.apply_cross(&values, p));
            }
            half.copy_from_slice(&values);
            let floor = grid.free_boundary_values(bundle, t_mid);
            total_sweeps += sweep(
                Axis::X,
                bundle,
                &grid,
                &mid_ops,
                half_dt,
                t_mid,
                &rhs,
                &values,
                &mut half,
                &self.sor,
                floor.as_deref(),
            )?;
            apply_boundaries(bundle, &grid, t_mid, &values, &mut half)?;
            apply_free_boundary(&mut half, floor.as_deref());

            // (I + Δt/2 Ly) V_new = V* - Δt/2 (Lx + Lxy) V*
            for (_, _, p) in grid.interior_nodes() {
                rhs[p] = half[p]
                    - half_dt * (mid_ops.apply(Axis::X, &half, p) + mid_ops.apply_cross(&half, p));
            }
            values.copy_from_slice(&half);
            let floor = grid.free_boundary_values(bundle, t_new);
            total_sweeps += sweep(
                Axis::Y,
                bundle,
                &grid,
                &new_ops,
                half_dt,
                t_new,
                &rhs,
                &half,
                &mut values,
                &self.sor,
                floor.as_deref(),
            )?;
            apply_boundaries(bundle, &grid, t_new, &half, &mut values)?;
            apply_free_boundary(&mut values, floor.as_deref());
        }

        log::debug!("Peaceman-Rachford 2-D solve finished, {total_sweeps} SOR sweeps");
        grid.results(values)
    }

    fn boundary_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::EverySubStep
    }
}
