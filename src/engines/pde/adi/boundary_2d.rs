//! Edge conditions of the two-dimensional solvers.
//!
//! A two-dimensional edge is a line `x = level` or `y = level`. Along it the condition is a
//! one-dimensional row in the direction normal to the edge, parameterised by the position on
//! the edge (the other coordinate).

use std::fmt;
use std::sync::Arc;

use crate::core::{constant_surface, PdeError, Surface};

/// One edge of a two-dimensional problem.
pub trait BoundaryCondition2D: fmt::Debug + Send + Sync {
    /// Row written for the edge node at `boundary_position`. It covers the first nodes of a
    /// lower edge and the last nodes of an upper edge, in increasing coordinate order.
    fn left_matrix_condition(&self, t: f64, boundary_position: f64) -> Vec<f64>;

    /// Row applied to the previous solution, ordered from the edge inwards.
    fn right_matrix_condition(&self, t: f64, boundary_position: f64) -> Vec<f64>;

    /// Additive constant; `grid_spacing` is the step normal to the edge.
    fn constant(&self, t: f64, boundary_position: f64, grid_spacing: f64) -> f64;

    /// Coordinate of the edge line.
    fn level(&self) -> f64;
}

macro_rules! boundary_2d {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $ty {
            value: Surface,
            level: f64,
        }

        impl $ty {
            /// `value(t, position)` along the edge at `level`.
            pub fn new(value: Surface, level: f64) -> Result<Self, PdeError> {
                if !level.is_finite() {
                    return Err(PdeError::invalid("boundary level must be finite"));
                }
                Ok(Self { value, level })
            }

            pub fn constant(value: f64, level: f64) -> Result<Self, PdeError> {
                Self::new(constant_surface(value), level)
            }
        }

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

boundary_2d!(
    /// Fixes the solution on the edge.
    DirichletBoundaryCondition2D
);
boundary_2d!(
    /// Fixes the derivative normal to the edge, taken in the direction of increasing coordinate.
    NeumannBoundaryCondition2D
);
boundary_2d!(
    /// Fixes the second derivative normal to the edge.
    FixedSecondDerivativeBoundaryCondition2D
);

impl BoundaryCondition2D for DirichletBoundaryCondition2D {
    fn left_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        vec![1.0]
    }

    fn right_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        Vec::new()
    }

    fn constant(&self, t: f64, boundary_position: f64, _grid_spacing: f64) -> f64 {
        (self.value)(t, boundary_position)
    }

    fn level(&self) -> f64 {
        self.level
    }
}

impl BoundaryCondition2D for NeumannBoundaryCondition2D {
    fn left_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        vec![-1.0, 1.0]
    }

    fn right_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        Vec::new()
    }

    fn constant(&self, t: f64, boundary_position: f64, grid_spacing: f64) -> f64 {
        (self.value)(t, boundary_position) * grid_spacing
    }

    fn level(&self) -> f64 {
        self.level
    }
}

impl BoundaryCondition2D for FixedSecondDerivativeBoundaryCondition2D {
    fn left_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        vec![1.0, -2.0, 1.0]
    }

    fn right_matrix_condition(&self, _t: f64, _boundary_position: f64) -> Vec<f64> {
        Vec::new()
    }

    fn constant(&self, t: f64, boundary_position: f64, grid_spacing: f64) -> f64 {
        (self.value)(t, boundary_position) * grid_spacing * grid_spacing
    }

    fn level(&self) -> f64 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface;

    #[test]
    fn rows_and_constants() {
        let dirichlet = DirichletBoundaryCondition2D::new(surface(|t, y| t + y), 0.0).unwrap();
        assert_eq!(dirichlet.left_matrix_condition(0.0, 0.5), vec![1.0]);
        assert_eq!(dirichlet.constant(1.0, 0.5, 0.1), 1.5);

        let neumann = NeumannBoundaryCondition2D::constant(2.0, 1.0).unwrap();
        assert_eq!(neumann.left_matrix_condition(0.0, 0.0), vec![-1.0, 1.0]);
        assert_eq!(neumann.constant(0.0, 0.3, 0.25), 0.5);
        assert_eq!(neumann.level(), 1.0);

        let second = FixedSecondDerivativeBoundaryCondition2D::constant(4.0, 0.0).unwrap();
        assert!(second.right_matrix_condition(0.0, 0.0).is_empty());
        assert_eq!(second.constant(0.0, 0.0, 0.5), 1.0);

        assert!(DirichletBoundaryCondition2D::constant(0.0, f64::NAN).is_err());
    }
}
