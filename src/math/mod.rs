//! Numerical building blocks shared by the finite-difference solvers.

pub mod linalg;
pub mod meshing;
pub mod sor;

pub use linalg::{SparseRowMatrix, Tridiagonal};
pub use meshing::{
    ChebyshevMeshing, DoubleExponentialMeshing, ExponentialMeshing, HyperbolicMeshing,
    MeshingFunction, UniformMeshing,
};
pub use sor::SorSolver;

/// Piecewise-linear interpolation of `values` sampled on the increasing `nodes`.
/// Queries outside the node range return the nearest end value.
pub fn interpolate_linear(x: f64, nodes: &[f64], values: &[f64]) -> f64 {
    debug_assert_eq!(nodes.len(), values.len());
    let n = nodes.len() - 1;
    if x <= nodes[0] {
        return values[0];
    }
    if x >= nodes[n] {
        return values[n];
    }

    let hi = nodes.partition_point(|&v| v < x).clamp(1, n);
    let lo = hi - 1;
    let w = (x - nodes[lo]) / (nodes[hi] - nodes[lo]);
    (1.0 - w) * values[lo] + w * values[hi]
}

/// Index `i` with `nodes[i] <= x < nodes[i + 1]`, clamped to `[0, len - 2]`.
pub fn lower_bound_index(nodes: &[f64], x: f64) -> usize {
    let last = nodes.len().saturating_sub(2);
    if x.is_nan() {
        return 0;
    }
    nodes.partition_point(|&v| v <= x).saturating_sub(1).min(last)
}
