//! Edge conditions of the one-dimensional solvers.
//!
//! A boundary condition replaces the first (lower edge) or last (upper edge) row of the time-step
//! system. Its left row is written at columns `0..len` for the lower edge and `N-len..N` for the
//! upper edge; its right row is dotted with the previous solution, read from the edge inwards;
//! the constant is added to the right-hand side.

use std::fmt;
use std::sync::Arc;

use crate::core::{constant_curve, Curve, PdeError};

use super::coefficients::ConvectionDiffusionCoefficients;
use super::grid::PdeGrid1D;

/// One edge of a one-dimensional problem.
pub trait BoundaryCondition: fmt::Debug + Send + Sync {
    /// Row written into the system matrix at time `t`.
    fn left_matrix_condition(
        &self,
        coefficients: &dyn ConvectionDiffusionCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> Vec<f64>;

    /// Row applied to the previous time step's solution.
    fn right_matrix_condition(
        &self,
        coefficients: &dyn ConvectionDiffusionCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> Vec<f64>;

    /// Additive right-hand-side constant at time `t`.
    fn constant(
        &self,
        coefficients: &dyn ConvectionDiffusionCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> f64;

    /// Space coordinate of the edge.
    fn level(&self) -> f64;
}

/// Spacing of the grid cell touching the edge at `level`.
fn edge_spacing(grid: &PdeGrid1D, level: f64) -> f64 {
    let n = grid.num_space_nodes();
    let lower = grid.space_node(0);
    let upper = grid.space_node(n - 1);
    if (level - lower).abs() <= (level - upper).abs() {
        grid.space_step(0)
    } else {
        grid.space_step(n - 2)
    }
}

fn check_level(level: f64) -> Result<(), PdeError> {
    if !level.is_finite() {
        return Err(PdeError::invalid("boundary level must be finite"));
    }
    Ok(())
}

macro_rules! curve_debug {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("value", &Arc::as_ptr(&self.value))
                    .field("level", &self.level)
                    .finish()
            }
        }
    };
}

/// Fixes the solution value on the edge: `V(t, level) = g(t)`.
#[derive(Clone)]
pub struct DirichletBoundaryCondition {
    value: Curve,
    level: f64,
}

impl DirichletBoundaryCondition {
    pub fn new(value: Curve, level: f64) -> Result<Self, PdeError> {
        check_level(level)?;
        Ok(Self { value, level })
    }

    /// A time-independent edge value.
    pub fn constant(value: f64, level: f64) -> Result<Self, PdeError> {
        Self::new(constant_curve(value), level)
    }
}

curve_debug!(DirichletBoundaryCondition);

impl BoundaryCondition for DirichletBoundaryCondition {
    fn left_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        vec![1.0]
    }

    fn right_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        Vec::new()
    }

    fn constant(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        t: f64,
    ) -> f64 {
        (self.value)(t)
    }

    fn level(&self) -> f64 {
        self.level
    }
}

/// Fixes the first spatial derivative on the edge, discretised as a one-sided first difference
/// over the edge cell.
#[derive(Clone)]
pub struct NeumannBoundaryCondition {
    value: Curve,
    level: f64,
}

impl NeumannBoundaryCondition {
    pub fn new(value: Curve, level: f64) -> Result<Self, PdeError> {
        check_level(level)?;
        Ok(Self { value, level })
    }

    pub fn constant(value: f64, level: f64) -> Result<Self, PdeError> {
        Self::new(constant_curve(value), level)
    }
}

curve_debug!(NeumannBoundaryCondition);

impl BoundaryCondition for NeumannBoundaryCondition {
    fn left_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        vec![-1.0, 1.0]
    }

    fn right_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        Vec::new()
    }

    fn constant(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> f64 {
        (self.value)(t) * edge_spacing(grid, self.level)
    }

    fn level(&self) -> f64 {
        self.level
    }
}

/// Fixes the second spatial derivative on the edge using the three nodes nearest to it.
///
/// The row `{1, -2, 1}` with constant `value · dx²`, `dx` the edge interval, is the uniform
/// stencil. It is exact for quadratics when the two intervals next to the edge are equal and
/// only first-order accurate when they differ.
#[derive(Clone)]
pub struct FixedSecondDerivativeBoundaryCondition {
    value: Curve,
    level: f64,
}

impl FixedSecondDerivativeBoundaryCondition {
    pub fn new(value: Curve, level: f64) -> Result<Self, PdeError> {
        check_level(level)?;
        Ok(Self { value, level })
    }

    pub fn constant(value: f64, level: f64) -> Result<Self, PdeError> {
        Self::new(constant_curve(value), level)
    }
}

curve_debug!(FixedSecondDerivativeBoundaryCondition);

impl BoundaryCondition for FixedSecondDerivativeBoundaryCondition {
    fn left_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        vec![1.0, -2.0, 1.0]
    }

    fn right_matrix_condition(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        _grid: &PdeGrid1D,
        _t: f64,
    ) -> Vec<f64> {
        Vec::new()
    }

    fn constant(
        &self,
        _coefficients: &dyn ConvectionDiffusionCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> f64 {
        let dx = edge_spacing(grid, self.level);
        (self.value)(t) * dx * dx
    }

    fn level(&self) -> f64 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{constant_surface, curve};
    use crate::engines::pde::coefficients::StandardCoefficients;

    fn coefficients() -> StandardCoefficients {
        StandardCoefficients::new(
            constant_surface(-1.0),
            constant_surface(0.0),
            constant_surface(0.0),
        )
    }

    #[test]
    fn rows_and_constants_follow_the_edge_spacing() {
        let grid = PdeGrid1D::new(vec![0.0, 1.0], vec![0.0, 0.5, 2.0, 4.0]).unwrap();
        let coeff = coefficients();

        let dirichlet = DirichletBoundaryCondition::new(curve(|t| 2.0 + t), 0.0).unwrap();
        assert_eq!(dirichlet.left_matrix_condition(&coeff, &grid, 0.3), vec![1.0]);
        assert!(dirichlet.right_matrix_condition(&coeff, &grid, 0.3).is_empty());
        assert_eq!(dirichlet.constant(&coeff, &grid, 0.5), 2.5);

        let lower = NeumannBoundaryCondition::constant(3.0, 0.0).unwrap();
        let upper = NeumannBoundaryCondition::constant(3.0, 4.0).unwrap();
        assert_eq!(lower.left_matrix_condition(&coeff, &grid, 0.0), vec![-1.0, 1.0]);
        assert_eq!(lower.constant(&coeff, &grid, 0.0), 1.5);
        assert_eq!(upper.constant(&coeff, &grid, 0.0), 6.0);

        let curvature = FixedSecondDerivativeBoundaryCondition::constant(2.0, 4.0).unwrap();
        assert_eq!(
            curvature.left_matrix_condition(&coeff, &grid, 0.0),
            vec![1.0, -2.0, 1.0]
        );
        assert_eq!(curvature.constant(&coeff, &grid, 0.0), 8.0);
        assert_eq!(curvature.level(), 4.0);
    }

    #[test]
    fn second_derivative_row_is_exact_only_on_equal_edge_intervals() {
        // equal intervals at the lower edge, stretched at the upper edge
        let grid = PdeGrid1D::new(vec![0.0, 1.0], vec![0.0, 0.5, 1.0, 4.0]).unwrap();
        let coeff = coefficients();
        let f: Vec<f64> = grid.space_nodes().iter().map(|x| x * x).collect();
        let row_value = |nodes: &[f64], row: &[f64]| -> f64 {
            nodes.iter().zip(row).map(|(v, w)| v * w).sum()
        };

        let lower = FixedSecondDerivativeBoundaryCondition::constant(2.0, 0.0).unwrap();
        let row = lower.left_matrix_condition(&coeff, &grid, 0.0);
        assert_eq!(row_value(&f[..3], &row), lower.constant(&coeff, &grid, 0.0));

        let upper = FixedSecondDerivativeBoundaryCondition::constant(2.0, 4.0).unwrap();
        let row = upper.left_matrix_condition(&coeff, &grid, 0.0);
        assert_eq!(upper.constant(&coeff, &grid, 0.0), 18.0);
        assert_eq!(row_value(&f[1..], &row), 14.25);
    }

    #[test]
    fn non_finite_level_is_rejected() {
        assert!(DirichletBoundaryCondition::constant(0.0, f64::INFINITY).is_err());
    }
}
