use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::{Function3D, PdeError, Surface};
use crate::math::lower_bound_index;

use super::boundary_2d::BoundaryCondition2D;

/// Coefficients of
/// `∂V/∂t + a V_xx + b V_x + c V + d V_xy + e V_yy + f V_y = 0`, each a function of `(t, x, y)`.
#[derive(Clone)]
pub struct Coefficients2D {
    a: Function3D,
    b: Function3D,
    c: Function3D,
    d: Function3D,
    e: Function3D,
    f: Function3D,
}

impl Coefficients2D {
    pub fn new(
        a: Function3D,
        b: Function3D,
        c: Function3D,
        d: Function3D,
        e: Function3D,
        f: Function3D,
    ) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn a(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.a)(t, x, y)
    }

    pub fn b(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.b)(t, x, y)
    }

    pub fn c(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.c)(t, x, y)
    }

    pub fn d(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.d)(t, x, y)
    }

    pub fn e(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.e)(t, x, y)
    }

    pub fn f(&self, t: f64, x: f64, y: f64) -> f64 {
        (self.f)(t, x, y)
    }
}

impl fmt::Debug for Coefficients2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coefficients2D")
            .field("a", &Arc::as_ptr(&self.a))
            .field("b", &Arc::as_ptr(&self.b))
            .field("c", &Arc::as_ptr(&self.c))
            .field("d", &Arc::as_ptr(&self.d))
            .field("e", &Arc::as_ptr(&self.e))
            .field("f", &Arc::as_ptr(&self.f))
            .finish()
    }
}

/// The four edges of a rectangular domain. Their levels define the domain.
#[derive(Debug, Clone)]
pub struct Boundaries2D {
    pub x_lower: Arc<dyn BoundaryCondition2D>,
    pub x_upper: Arc<dyn BoundaryCondition2D>,
    pub y_lower: Arc<dyn BoundaryCondition2D>,
    pub y_upper: Arc<dyn BoundaryCondition2D>,
}

/// Input of a two-dimensional solve on a uniform grid.
///
/// The grid spans `[x_lower.level, x_upper.level] x [y_lower.level, y_upper.level]` with
/// `x_steps` and `y_steps` intervals, and `[0, t_max]` with `t_steps` intervals.
#[derive(Clone)]
pub struct PdeDataBundle2D {
    coefficients: Coefficients2D,
    initial_condition: Surface,
    t_max: f64,
    t_steps: usize,
    x_steps: usize,
    y_steps: usize,
    boundaries: Boundaries2D,
    free_boundary: Option<Function3D>,
}

impl PdeDataBundle2D {
    pub fn new(
        coefficients: Coefficients2D,
        initial_condition: Surface,
        t_max: f64,
        t_steps: usize,
        x_steps: usize,
        y_steps: usize,
        boundaries: Boundaries2D,
    ) -> Result<Self, PdeError> {
        if !t_max.is_finite() || t_max <= 0.0 {
            return Err(PdeError::invalid("t_max must be finite and > 0"));
        }
        if t_steps == 0 {
            return Err(PdeError::invalid("t_steps must be >= 1"));
        }
        if x_steps < 2 || y_steps < 2 {
            return Err(PdeError::invalid("x_steps and y_steps must be >= 2"));
        }
        let edges = [
            ("x", boundaries.x_lower.level(), boundaries.x_upper.level()),
            ("y", boundaries.y_lower.level(), boundaries.y_upper.level()),
        ];
        for (axis, lower, upper) in edges {
            if !(lower < upper) {
                return Err(PdeError::invalid(format!(
                    "{axis} boundary levels must satisfy lower < upper, got {lower} and {upper}"
                )));
            }
        }
        Ok(Self {
            coefficients,
            initial_condition,
            t_max,
            t_steps,
            x_steps,
            y_steps,
            boundaries,
            free_boundary: None,
        })
    }

    /// Adds a floor `V(t, x, y) >= free(t, x, y)`.
    pub fn with_free_boundary(&self, free_boundary: Function3D) -> Self {
        Self {
            free_boundary: Some(free_boundary),
            ..self.clone()
        }
    }

    pub fn coefficients(&self) -> &Coefficients2D {
        &self.coefficients
    }

    pub fn initial_value(&self, x: f64, y: f64) -> f64 {
        (self.initial_condition)(x, y)
    }

    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    pub fn t_steps(&self) -> usize {
        self.t_steps
    }

    pub fn x_steps(&self) -> usize {
        self.x_steps
    }

    pub fn y_steps(&self) -> usize {
        self.y_steps
    }

    pub fn boundaries(&self) -> &Boundaries2D {
        &self.boundaries
    }

    pub fn free_boundary(&self) -> Option<&Function3D> {
        self.free_boundary.as_ref()
    }
}

impl fmt::Debug for PdeDataBundle2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdeDataBundle2D")
            .field("coefficients", &self.coefficients)
            .field("t_max", &self.t_max)
            .field("t_steps", &self.t_steps)
            .field("x_steps", &self.x_steps)
            .field("y_steps", &self.y_steps)
            .field("boundaries", &self.boundaries)
            .field("free_boundary", &self.free_boundary.is_some())
            .finish()
    }
}

/// Terminal solution of a two-dimensional solve, stored row by row in `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdeResults2D {
    x_nodes: Vec<f64>,
    y_nodes: Vec<f64>,
    values: Vec<f64>,
}

impl PdeResults2D {
    pub(crate) fn new(x_nodes: Vec<f64>, y_nodes: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(x_nodes.len() * y_nodes.len(), values.len());
        Self {
            x_nodes,
            y_nodes,
            values,
        }
    }

    pub fn num_x_nodes(&self) -> usize {
        self.x_nodes.len()
    }

    pub fn num_y_nodes(&self) -> usize {
        self.y_nodes.len()
    }

    pub fn x_nodes(&self) -> &[f64] {
        &self.x_nodes
    }

    pub fn y_nodes(&self) -> &[f64] {
        &self.y_nodes
    }

    /// All values, `values[j * num_x_nodes + i]`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.x_nodes.len() + i]
    }

    /// Derivative in `x`: central inside, three-point one-sided on the `x` edges. Indices past
    /// the grid panic, like slice indexing.
    pub fn first_x_derivative(&self, i: usize, j: usize) -> f64 {
        first_difference(&self.x_nodes, |k| self.value(k, j), i)
    }

    /// Derivative in `y`: central inside, three-point one-sided on the `y` edges.
    pub fn first_y_derivative(&self, i: usize, j: usize) -> f64 {
        first_difference(&self.y_nodes, |k| self.value(i, k), j)
    }

    /// Bilinear interpolation, clamped to the domain.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let x = x.clamp(self.x_nodes[0], self.x_nodes[self.x_nodes.len() - 1]);
        let y = y.clamp(self.y_nodes[0], self.y_nodes[self.y_nodes.len() - 1]);
        let i = lower_bound_index(&self.x_nodes, x);
        let j = lower_bound_index(&self.y_nodes, y);

        let wx = (x - self.x_nodes[i]) / (self.x_nodes[i + 1] - self.x_nodes[i]);
        let wy = (y - self.y_nodes[j]) / (self.y_nodes[j + 1] - self.y_nodes[j]);

        (1.0 - wx) * (1.0 - wy) * self.value(i, j)
            + wx * (1.0 - wy) * self.value(i + 1, j)
            + (1.0 - wx) * wy * self.value(i, j + 1)
            + wx * wy * self.value(i + 1, j + 1)
    }
}

/// Second-order first derivative at node `k` of an axis with at least three nodes.
fn first_difference(nodes: &[f64], f: impl Fn(usize) -> f64, k: usize) -> f64 {
    let n = nodes.len();
    if k == 0 {
        let (h1, h2) = (nodes[1] - nodes[0], nodes[2] - nodes[1]);
        -(2.0 * h1 + h2) / (h1 * (h1 + h2)) * f(0) + (h1 + h2) / (h1 * h2) * f(1)
            - h1 / (h2 * (h1 + h2)) * f(2)
    } else if k == n - 1 {
        let (h1, h2) = (nodes[n - 2] - nodes[n - 3], nodes[n - 1] - nodes[n - 2]);
        h2 / (h1 * (h1 + h2)) * f(n - 3) - (h1 + h2) / (h1 * h2) * f(n - 2)
            + (h1 + 2.0 * h2) / (h2 * (h1 + h2)) * f(n - 1)
    } else {
        (f(k + 1) - f(k - 1)) / (nodes[k + 1] - nodes[k - 1])
    }
}
