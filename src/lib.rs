//! `openferric-pde` is a finite-difference toolkit for the convection-diffusion equations that
//! arise in derivative pricing.
//!
//! The crate solves
//! `∂V/∂t + a V'' + b V' + c V = 0` on non-uniform one-dimensional grids with a θ-scheme
//! (explicit, Crank-Nicolson, implicit Euler and anything in between), exponential fitting in
//! convection-dominated regions, projected SOR for free-boundary (early-exercise) problems,
//! coupled pairs of equations and Richardson extrapolation in time. Two-dimensional problems
//! with a mixed derivative are solved by explicit, Crank-Nicolson, Peaceman-Rachford,
//! Craig-Sneyd and operator-splitting schemes.
//!
//! References used across modules include:
//! - Duffy, *Finite Difference Methods in Financial Engineering* (2006), Ch. 9-12 and 19-21.
//! - Craig and Sneyd (1988) for the mixed-derivative ADI correction.
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15 and 21 for the
//!   Black-Scholes benchmarks used in tests.
//!
//! Numerical considerations:
//! - `θ < 0.5` is only conditionally stable; the explicit schemes need `Δt a / Δx² ≲ 0.5`.
//! - Free-boundary solves iterate PSOR to a fixed tolerance and fail with
//!   [`PdeError::ConvergenceFailure`](core::PdeError::ConvergenceFailure) at the iteration cap.
//! - Boundary rows are written at the new time level; Neumann and second-derivative rows use
//!   one-sided differences of first order.
//!
//! # Feature Flags
//! - `parallel`: solves independent bundles on the Rayon pool in
//!   [`solve_batch`](engines::pde::solve_batch).
//!
//! # Quick Start
//! Price a European call on a hyperbolic spot mesh:
//! ```rust
//! use std::sync::Arc;
//! use openferric_pde::core::OptionType;
//! use openferric_pde::engines::pde::providers::european_option_bundle;
//! use openferric_pde::engines::pde::{
//!     ConvectionDiffusionPdeSolver, PdeGrid1D, PdeResults1D, ThetaMethodFiniteDifference,
//! };
//! use openferric_pde::math::{HyperbolicMeshing, UniformMeshing};
//!
//! let time = UniformMeshing::new(0.0, 1.0, 50).unwrap();
//! let space = HyperbolicMeshing::new(0.0, 500.0, 100.0, 100, 10.0).unwrap();
//! let grid = Arc::new(PdeGrid1D::from_meshing(&time, &space).unwrap());
//! let bundle = european_option_bundle(OptionType::Call, 100.0, 0.05, 0.0, 0.2, grid).unwrap();
//!
//! let solution = ThetaMethodFiniteDifference::new().solve(&bundle).unwrap();
//! let px = solution.value_at(100.0);
//! assert!(px > 10.0 && px < 11.0);
//! ```

pub mod core;
pub mod engines;
pub mod math;
pub mod pricing;

/// Common imports for building and solving one-dimensional problems.
pub mod prelude {
    pub use crate::core::{
        constant_curve, constant_surface, curve, surface, Curve, OptionType, PdeError, Surface,
    };
    pub use crate::engines::pde::{
        BoundaryCondition, ConvectionDiffusionPdeSolver, DirichletBoundaryCondition,
        NeumannBoundaryCondition, PdeDataBundle1D, PdeGrid1D, PdeResults1D, PdeSolution1D,
        StandardCoefficients, ThetaMethodFiniteDifference,
    };
}
