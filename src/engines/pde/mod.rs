//! Finite-difference solvers for convection-diffusion PDEs.
//!
//! One-dimensional problems take the form
//! `∂V/∂t + a(t, x) V'' + b(t, x) V' + c(t, x) V = 0` with `t` running forward from the
//! initial condition (time to expiry for pricing problems). A [`PdeDataBundle1D`] carries the
//! coefficients, the initial condition, two boundary conditions, an optional free boundary and
//! the [`PdeGrid1D`]; [`ThetaMethodFiniteDifference`] solves it.
//!
//! Two-dimensional problems on uniform rectangular grids live in [`adi`].

pub mod adi;
pub mod batch;
pub mod boundary;
pub mod coefficients;
pub mod coupled;
pub mod data_bundle;
pub(crate) mod fd_common;
pub mod grid;
pub mod providers;
pub mod results;
pub mod richardson;
pub mod theta_method;

pub use batch::solve_batch;
pub use boundary::{
    BoundaryCondition, DirichletBoundaryCondition, FixedSecondDerivativeBoundaryCondition,
    NeumannBoundaryCondition,
};
pub use coefficients::{
    CoefficientsRef, ConvectionDiffusionCoefficients, CoupledCoefficients, FullCoefficients,
    Pde1dCoefficients, StandardCoefficients,
};
pub use coupled::CoupledFiniteDifference;
pub use data_bundle::PdeDataBundle1D;
pub use grid::PdeGrid1D;
pub use results::{PdeFullResults1D, PdeResults1D, PdeSolution1D, PdeTerminalResults1D};
pub use richardson::RichardsonExtrapolationFiniteDifference;
pub use theta_method::{
    ConvectionDiffusionPdeSolver, ThetaMethodFiniteDifference, FREE_BOUNDARY_SOR_MAX_ITERATIONS,
};
