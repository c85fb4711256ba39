use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::PdeError;

use super::coefficients::ConvectionDiffusionCoefficients;
use super::data_bundle::PdeDataBundle1D;
use super::results::{PdeFullResults1D, PdeResults1D, PdeSolution1D, PdeTerminalResults1D};
use super::theta_method::ConvectionDiffusionPdeSolver;

/// Richardson extrapolation in time around any one-dimensional solver.
///
/// The wrapped solver runs on the bundle's grid and on the same grid with every time step
/// halved; the two are combined as `2 V_fine - V_coarse`, which removes the leading
/// first-order time error. With full results from the wrapped solver, every coarse time row
/// is extrapolated against the matching fine row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RichardsonExtrapolationFiniteDifference<S> {
    pub base_solver: S,
}

impl<S: ConvectionDiffusionPdeSolver> RichardsonExtrapolationFiniteDifference<S> {
    pub fn new(base_solver: S) -> Self {
        Self { base_solver }
    }
}

impl<S: ConvectionDiffusionPdeSolver> ConvectionDiffusionPdeSolver
    for RichardsonExtrapolationFiniteDifference<S>
{
    fn solve<C>(&self, bundle: &PdeDataBundle1D<C>) -> Result<PdeSolution1D, PdeError>
    where
        C: ConvectionDiffusionCoefficients + Clone,
    {
        let grid = bundle.grid_handle();
        let fine_bundle = bundle.with_grid(Arc::new(grid.with_double_time_steps()))?;

        log::debug!(
            "richardson extrapolation: {} and {} time nodes",
            grid.num_time_nodes(),
            fine_bundle.grid().num_time_nodes()
        );

        let coarse = self.base_solver.solve(bundle)?;
        let fine = self.base_solver.solve(&fine_bundle)?;

        let extrapolate = |fine: &[f64], coarse: &[f64]| -> Vec<f64> {
            fine.iter().zip(coarse).map(|(f, c)| 2.0 * f - c).collect()
        };

        Ok(match (coarse, fine) {
            (PdeSolution1D::Full(coarse), PdeSolution1D::Full(fine)) => {
                let rows = coarse
                    .values()
                    .iter()
                    .enumerate()
                    .map(|(n, row)| extrapolate(fine.time_slice(2 * n), row))
                    .collect();
                PdeSolution1D::Full(PdeFullResults1D::new(Arc::clone(grid), rows))
            }
            (coarse, fine) => PdeSolution1D::Terminal(PdeTerminalResults1D::new(
                Arc::clone(grid),
                extrapolate(fine.terminal_values(), coarse.terminal_values()),
            )),
        })
    }
}
