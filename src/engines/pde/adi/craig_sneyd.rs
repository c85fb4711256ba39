use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::sor::SorSolver;

use super::{
    apply_boundaries, apply_free_boundary, sweep, Axis, BoundaryPolicy,
    ConvectionDiffusionPdeSolver2D, Grid2D, Operators2D, PdeDataBundle2D, PdeResults2D,
};

/// Craig-Sneyd ADI.
///
/// Per step: explicit predictor `Y0 = V - Δt L V`, implicit corrections
/// `(I + θΔt Lx) Y1 = Y0 + θΔt Lx V` and `(I + θΔt Ly) Y2 = Y1 + θΔt Ly V`, a cross-term
/// correction `Z0 = Y0 - Δt/2 (Lxy Y2 - Lxy V)`, and the same two implicit corrections on `Z`.
/// The sweeps carry their own direction's edge rows; the whole grid edge is re-imposed only at
/// the end of the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraigSneydFiniteDifference2D {
    pub theta: f64,
    pub sor: SorSolver,
}

impl Default for CraigSneydFiniteDifference2D {
    fn default() -> Self {
        Self {
            theta: 0.5,
            sor: SorSolver::new(1.0, 1000),
        }
    }
}

impl CraigSneydFiniteDifference2D {
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

/// Runs the x then y implicit corrections from the predictor `seed` into `out`.
#[allow(clippy::too_many_arguments)]
fn corrections(
    bundle: &PdeDataBundle2D,
    grid: &Grid2D,
    old_ops: &Operators2D,
    new_ops: &Operators2D,
    theta_dt: f64,
    t_new: f64,
    values: &[f64],
    seed: &[f64],
    scratch: &mut [f64],
    out: &mut [f64],
    sor: &SorSolver,
    floor: Option<&[f64]>,
) -> Result<usize, PdeError> {
    let mut rhs = vec![0.0; grid.len()];

    for (_, _, p) in grid.interior_nodes() {
        rhs[p] = seed[p] + theta_dt * old_ops.apply(Axis::X, values, p);
    }
    scratch.copy_from_slice(seed);
    let mut sweeps = sweep(
        Axis::X, bundle, grid, new_ops, theta_dt, t_new, &rhs, values, scratch, sor, floor,
    )?;

    for (_, _, p) in grid.interior_nodes() {
        rhs[p] = scratch[p] + theta_dt * old_ops.apply(Axis::Y, values, p);
    }
    out.copy_from_slice(scratch);
    sweeps += sweep(
        Axis::Y, bundle, grid, new_ops, theta_dt, t_new, &rhs, values, out, sor, floor,
    )?;
    Ok(sweeps)
}

impl ConvectionDiffusionPdeSolver2D for CraigSneydFiniteDifference2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError> {
        if !(self.theta > 0.0 && self.theta <= 1.0) {
            return Err(PdeError::invalid(format!(
                "theta must be in (0, 1], got {}",
                self.theta
            )));
        }
        self.sor.validate()?;

        let grid = Grid2D::from_bundle(bundle);
        let dt = grid.dt;
        let theta_dt = self.theta * dt;
        log::debug!(
            "Craig-Sneyd 2-D solve: {} x {} nodes, {} time steps, theta = {}",
            grid.nx + 1,
            grid.ny + 1,
            grid.nt,
            self.theta
        );

        let mut values = grid.initial_values(bundle)?;
        let mut y0 = values.clone();
        let mut y2 = values.clone();
        let mut z0 = values.clone();
        let mut scratch = values.clone();
        let mut old_ops = Operators2D::new(&grid);
        let mut new_ops = Operators2D::new(&grid);
        let mut total_sweeps = 0;

        for step in 0..grid.nt {
            let t_old = grid.time(step);
            let t_new = grid.time(step + 1);
            old_ops.fill(bundle, &grid, t_old)?;
            new_ops.fill(bundle, &grid, t_new)?;
            let floor = grid.free_boundary_values(bundle, t_new);

            y0.copy_from_slice(&values);
            for (_, _, p) in grid.interior_nodes() {
                y0[p] = values[p] - dt * old_ops.apply_all(&values, p);
            }
            total_sweeps += corrections(
                bundle,
                &grid,
                &old_ops,
                &new_ops,
                theta_dt,
                t_new,
                &values,
                &y0,
                &mut scratch,
                &mut y2,
                &self.sor,
                floor.as_deref(),
            )?;

            z0.copy_from_slice(&y0);
            for (_, _, p) in grid.interior_nodes() {
                z0[p] = y0[p]
                    - 0.5 * dt * (new_ops.apply_cross(&y2, p) - old_ops.apply_cross(&values, p));
            }
            let previous = values.clone();
            total_sweeps += corrections(
                bundle,
                &grid,
                &old_ops,
                &new_ops,
                theta_dt,
                t_new,
                &previous,
                &z0,
                &mut scratch,
                &mut values,
                &self.sor,
                floor.as_deref(),
            )?;

            apply_boundaries(bundle, &grid, t_new, &previous, &mut values)?;
            apply_free_boundary(&mut values, floor.as_deref());
        }

        log::debug!("Craig-Sneyd 2-D solve finished, {total_sweeps} SOR sweeps");
        grid.results(values)
    }

    fn boundary_policy(&self) -> BoundaryPolicy {
        BoundaryPolicy::EndOfStep
    }
}
