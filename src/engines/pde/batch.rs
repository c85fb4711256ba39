#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::PdeError;

use super::coefficients::ConvectionDiffusionCoefficients;
use super::data_bundle::PdeDataBundle1D;
use super::results::PdeSolution1D;
use super::theta_method::ConvectionDiffusionPdeSolver;

/// Solves independent bundles with one solver, in parallel with the `parallel` feature.
///
/// Results keep the order of `bundles`; each entry carries its own error.
pub fn solve_batch<S, C>(
    solver: &S,
    bundles: &[PdeDataBundle1D<C>],
) -> Vec<Result<PdeSolution1D, PdeError>>
where
    S: ConvectionDiffusionPdeSolver + Sync,
    C: ConvectionDiffusionCoefficients + Clone,
{
    log::debug!("batch solve of {} bundles", bundles.len());

    #[cfg(feature = "parallel")]
    let results = bundles.par_iter().map(|bundle| solver.solve(bundle)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = bundles.iter().map(|bundle| solver.solve(bundle)).collect();

    results
}
