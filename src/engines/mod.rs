//! Numerical engines.

pub mod pde;
