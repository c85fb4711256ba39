//! Closed-form references for the finite-difference engines.

pub mod european;

pub use crate::core::types::OptionType;
