//! Two-dimensional convection-diffusion solvers on a uniform grid.
//!
//! `∂V/∂t + a V_xx + b V_x + c V + d V_xy + e V_yy + f V_y = 0`
//!
//! The operator is split as `L = Lx + Ly + Lxy` with `Lx = a ∂xx + b ∂x + c/2`,
//! `Ly = e ∂yy + f ∂y + c/2` and `Lxy = d ∂xy`. The splitting schemes treat `Lx` and `Ly`
//! implicitly one direction at a time and `Lxy` explicitly. Every implicit sweep solves one
//! banded system per grid line by SOR, with the edge rows of the swept direction inside the
//! system.
//!
//! When the edge rows are re-imposed point by point differs between schemes and is reported
//! by [`ConvectionDiffusionPdeSolver2D::boundary_policy`]. Corner nodes belong to the x-edges.

pub mod boundary_2d;
pub mod craig_sneyd;
pub mod crank_nicolson;
pub mod data;
pub mod explicit;
pub mod operator_splitting;
pub mod peaceman_rachford;

pub use boundary_2d::{
    BoundaryCondition2D, DirichletBoundaryCondition2D, FixedSecondDerivativeBoundaryCondition2D,
    NeumannBoundaryCondition2D,
};
pub use craig_sneyd::CraigSneydFiniteDifference2D;
pub use crank_nicolson::CrankNicolsonFiniteDifference2D;
pub use data::{Boundaries2D, Coefficients2D, PdeDataBundle2D, PdeResults2D};
pub use explicit::ExplicitFiniteDifference2D;
pub use operator_splitting::OperatorSplittingFiniteDifference2D;
pub use peaceman_rachford::PeacemanRachfordFiniteDifference2D;

use serde::{Deserialize, Serialize};

use crate::core::PdeError;
use crate::math::linalg::SparseRowMatrix;
use crate::math::sor::SorSolver;

/// When a scheme re-imposes the edge conditions on the whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Once, after the full time step.
    EndOfStep,
    /// After every sub-step of the splitting.
    EverySubStep,
    /// The edge rows are part of the single global system.
    InSystem,
}

/// A two-dimensional solver.
pub trait ConvectionDiffusionPdeSolver2D {
    fn solve(&self, bundle: &PdeDataBundle2D) -> Result<PdeResults2D, PdeError>;

    fn boundary_policy(&self) -> BoundaryPolicy;
}

/// Direction of a line sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

/// Uniform grid derived from the boundary levels of a bundle.
#[derive(Debug, Clone)]
pub(crate) struct Grid2D {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    pub dt: f64,
    pub nt: usize,
    pub x_nodes: Vec<f64>,
    pub y_nodes: Vec<f64>,
}

fn uniform_nodes(lower: f64, upper: f64, steps: usize) -> Vec<f64> {
    let h = (upper - lower) / steps as f64;
    (0..=steps)
        .map(|i| if i == steps { upper } else { lower + i as f64 * h })
        .collect()
}

impl Grid2D {
    pub fn from_bundle(bundle: &PdeDataBundle2D) -> Self {
        let edges = bundle.boundaries();
        let (x_lower, x_upper) = (edges.x_lower.level(), edges.x_upper.level());
        let (y_lower, y_upper) = (edges.y_lower.level(), edges.y_upper.level());
        let nx = bundle.x_steps();
        let ny = bundle.y_steps();
        Self {
            nx,
            ny,
            dx: (x_upper - x_lower) / nx as f64,
            dy: (y_upper - y_lower) / ny as f64,
            dt: bundle.t_max() / bundle.t_steps() as f64,
            nt: bundle.t_steps(),
            x_nodes: uniform_nodes(x_lower, x_upper, nx),
            y_nodes: uniform_nodes(y_lower, y_upper, ny),
        }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        j * (self.nx + 1) + i
    }

    pub fn len(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    pub fn time(&self, n: usize) -> f64 {
        n as f64 * self.dt
    }

    pub fn line_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx + 1,
            Axis::Y => self.ny + 1,
        }
    }

    /// Flattened index of node `k` on the line `line` running along `axis`.
    #[inline]
    pub fn line_node(&self, axis: Axis, line: usize, k: usize) -> usize {
        match axis {
            Axis::X => self.idx(k, line),
            Axis::Y => self.idx(line, k),
        }
    }

    /// Coordinate along the edge of the line `line` running along `axis`.
    pub fn line_position(&self, axis: Axis, line: usize) -> f64 {
        match axis {
            Axis::X => self.y_nodes[line],
            Axis::Y => self.x_nodes[line],
        }
    }

    pub fn spacing(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.dx,
            Axis::Y => self.dy,
        }
    }

    /// Interior lines swept in `axis`.
    pub fn interior_lines(&self, axis: Axis) -> std::ops::Range<usize> {
        match axis {
            Axis::X => 1..self.ny,
            Axis::Y => 1..self.nx,
        }
    }

    pub fn interior_nodes(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (1..self.ny).flat_map(move |j| (1..self.nx).map(move |i| (i, j, self.idx(i, j))))
    }

    pub fn initial_values(&self, bundle: &PdeDataBundle2D) -> Result<Vec<f64>, PdeError> {
        let mut values = vec![0.0; self.len()];
        for j in 0..=self.ny {
            for i in 0..=self.nx {
                let v = bundle.initial_value(self.x_nodes[i], self.y_nodes[j]);
                if !v.is_finite() {
                    return Err(PdeError::invalid(format!(
                        "initial condition is not finite at ({}, {})",
                        self.x_nodes[i], self.y_nodes[j]
                    )));
                }
                values[self.idx(i, j)] = v;
            }
        }
        Ok(values)
    }

    pub fn free_boundary_values(&self, bundle: &PdeDataBundle2D, t: f64) -> Option<Vec<f64>> {
        bundle.free_boundary().map(|free| {
            let mut values = vec![0.0; self.len()];
            for j in 0..=self.ny {
                for i in 0..=self.nx {
                    values[self.idx(i, j)] = free(t, self.x_nodes[i], self.y_nodes[j]);
                }
            }
            values
        })
    }

    pub fn results(&self, values: Vec<f64>) -> Result<PdeResults2D, PdeError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PdeError::numerical(
                "2-D solve produced non-finite values; reduce the time step",
            ));
        }
        Ok(PdeResults2D::new(
            self.x_nodes.clone(),
            self.y_nodes.clone(),
            values,
        ))
    }
}

/// Central-difference stencils of `Lx`, `Ly` and `Lxy` at every interior node for one time.
#[derive(Debug, Clone)]
pub(crate) struct Operators2D {
    pub x: Vec<[f64; 3]>,
    pub y: Vec<[f64; 3]>,
    pub cross: Vec<f64>,
    stride: usize,
}

impl Operators2D {
    pub fn new(grid: &Grid2D) -> Self {
        Self {
            x: vec![[0.0; 3]; grid.len()],
            y: vec![[0.0; 3]; grid.len()],
            cross: vec![0.0; grid.len()],
            stride: grid.nx + 1,
        }
    }

    pub fn fill(
        &mut self,
        bundle: &PdeDataBundle2D,
        grid: &Grid2D,
        t: f64,
    ) -> Result<(), PdeError> {
        let coefficients = bundle.coefficients();
        let inv_dx2 = 1.0 / (grid.dx * grid.dx);
        let inv_2dx = 0.5 / grid.dx;
        let inv_dy2 = 1.0 / (grid.dy * grid.dy);
        let inv_2dy = 0.5 / grid.dy;
        let inv_4dxdy = 0.25 / (grid.dx * grid.dy);

        for (i, j, p) in grid.interior_nodes() {
            let x = grid.x_nodes[i];
            let y = grid.y_nodes[j];
            let a = coefficients.a(t, x, y);
            let b = coefficients.b(t, x, y);
            let c = coefficients.c(t, x, y);
            let d = coefficients.d(t, x, y);
            let e = coefficients.e(t, x, y);
            let f = coefficients.f(t, x, y);
            if ![a, b, c, d, e, f].iter().all(|v| v.is_finite()) {
                return Err(PdeError::numerical(format!(
                    "non-finite PDE coefficient at (t, x, y) = ({t}, {x}, {y})"
                )));
            }

            self.x[p] = [
                a * inv_dx2 - b * inv_2dx,
                -2.0 * a * inv_dx2 + 0.5 * c,
                a * inv_dx2 + b * inv_2dx,
            ];
            self.y[p] = [
                e * inv_dy2 - f * inv_2dy,
                -2.0 * e * inv_dy2 + 0.5 * c,
                e * inv_dy2 + f * inv_2dy,
            ];
            self.cross[p] = d * inv_4dxdy;
        }
        Ok(())
    }

    #[inline]
    pub fn stencil(&self, axis: Axis, p: usize) -> &[f64; 3] {
        match axis {
            Axis::X => &self.x[p],
            Axis::Y => &self.y[p],
        }
    }

    #[inline]
    pub fn apply(&self, axis: Axis, v: &[f64], p: usize) -> f64 {
        let (w, step) = match axis {
            Axis::X => (&self.x[p], 1),
            Axis::Y => (&self.y[p], self.stride),
        };
        w[0] * v[p - step] + w[1] * v[p] + w[2] * v[p + step]
    }

    #[inline]
    pub fn apply_cross(&self, v: &[f64], p: usize) -> f64 {
        let s = self.stride;
        self.cross[p] * (v[p + s + 1] - v[p + s - 1] - v[p - s + 1] + v[p - s - 1])
    }

    #[inline]
    pub fn apply_all(&self, v: &[f64], p: usize) -> f64 {
        self.apply(Axis::X, v, p) + self.apply(Axis::Y, v, p) + self.apply_cross(v, p)
    }
}

/// Edge rows of one grid line, already evaluated.
struct EdgeRows {
    lower_row: Vec<f64>,
    lower_rhs: f64,
    upper_row: Vec<f64>,
    upper_rhs: f64,
}

fn edge_rows(
    axis: Axis,
    line: usize,
    bundle: &PdeDataBundle2D,
    grid: &Grid2D,
    t: f64,
    previous: &[f64],
) -> Result<EdgeRows, PdeError> {
    let edges = bundle.boundaries();
    let (lower, upper) = match axis {
        Axis::X => (&edges.x_lower, &edges.x_upper),
        Axis::Y => (&edges.y_lower, &edges.y_upper),
    };
    let m = grid.line_len(axis);
    let position = grid.line_position(axis, line);
    let h = grid.spacing(axis);
    let prev = |k: usize| previous[grid.line_node(axis, line, k)];

    let lower_row = lower.left_matrix_condition(t, position);
    let lower_right = lower.right_matrix_condition(t, position);
    let upper_row = upper.left_matrix_condition(t, position);
    let upper_right = upper.right_matrix_condition(t, position);
    for (side, row, right) in [
        ("lower", &lower_row, &lower_right),
        ("upper", &upper_row, &upper_right),
    ] {
        if row.is_empty() || row.len() > m || right.len() > m {
            return Err(PdeError::invalid(format!(
                "{side} {axis:?} boundary rows have lengths {} and {}, lines have {m} nodes",
                row.len(),
                right.len()
            )));
        }
    }

    let lower_rhs = lower_right
        .iter()
        .enumerate()
        .map(|(k, w)| w * prev(k))
        .sum::<f64>()
        + lower.constant(t, position, h);
    let upper_rhs = upper_right
        .iter()
        .enumerate()
        .map(|(k, w)| w * prev(m - 1 - k))
        .sum::<f64>()
        + upper.constant(t, position, h);

    Ok(EdgeRows {
        lower_row,
        lower_rhs,
        upper_row,
        upper_rhs,
    })
}

/// Writes the edge rows of one line into `matrix`/`rhs`, mapping line node `k` to `map(k)`.
fn write_edge_rows(
    rows: &EdgeRows,
    m: usize,
    map: impl Fn(usize) -> usize,
    matrix: &mut SparseRowMatrix,
    rhs: &mut [f64],
) {
    let first = map(0);
    matrix.clear_row(first);
    for (k, &w) in rows.lower_row.iter().enumerate() {
        matrix.set(first, map(k), w);
    }
    rhs[first] = rows.lower_rhs;

    let last = map(m - 1);
    let start = m - rows.upper_row.len();
    matrix.clear_row(last);
    for (k, &w) in rows.upper_row.iter().enumerate() {
        matrix.set(last, map(start + k), w);
    }
    rhs[last] = rows.upper_rhs;
}

/// Solves the edge rows of one line for the two edge nodes, holding the inner nodes fixed.
fn impose_edge_rows(
    axis: Axis,
    line: usize,
    rows: &EdgeRows,
    grid: &Grid2D,
    values: &mut [f64],
) -> Result<(), PdeError> {
    let m = grid.line_len(axis);
    let node = |k: usize| grid.line_node(axis, line, k);

    let pivot = rows.lower_row[0];
    if pivot == 0.0 {
        return Err(PdeError::numerical("lower boundary row has a zero pivot"));
    }
    let inner: f64 = rows
        .lower_row
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, w)| w * values[node(k)])
        .sum();
    values[node(0)] = (rows.lower_rhs - inner) / pivot;

    let len = rows.upper_row.len();
    let pivot = rows.upper_row[len - 1];
    if pivot == 0.0 {
        return Err(PdeError::numerical("upper boundary row has a zero pivot"));
    }
    let start = m - len;
    let inner: f64 = rows.upper_row[..len - 1]
        .iter()
        .enumerate()
        .map(|(k, w)| w * values[node(start + k)])
        .sum();
    values[node(m - 1)] = (rows.upper_rhs - inner) / pivot;
    Ok(())
}

/// Re-imposes all four edges on `values` at time `t`: the x-edges on every row (corners
/// included), then the y-edges on the interior columns.
pub(crate) fn apply_boundaries(
    bundle: &PdeDataBundle2D,
    grid: &Grid2D,
    t: f64,
    previous: &[f64],
    values: &mut [f64],
) -> Result<(), PdeError> {
    for j in 0..=grid.ny {
        let rows = edge_rows(Axis::X, j, bundle, grid, t, previous)?;
        impose_edge_rows(Axis::X, j, &rows, grid, values)?;
    }
    for i in 1..grid.nx {
        let rows = edge_rows(Axis::Y, i, bundle, grid, t, previous)?;
        impose_edge_rows(Axis::Y, i, &rows, grid, values)?;
    }
    Ok(())
}

/// Writes the edge rows of every grid line into a system over the flattened grid.
pub(crate) fn write_global_boundary_rows(
    bundle: &PdeDataBundle2D,
    grid: &Grid2D,
    t: f64,
    previous: &[f64],
    matrix: &mut SparseRowMatrix,
    rhs: &mut [f64],
) -> Result<(), PdeError> {
    for j in 0..=grid.ny {
        let rows = edge_rows(Axis::X, j, bundle, grid, t, previous)?;
        write_edge_rows(&rows, grid.nx + 1, |k| grid.idx(k, j), matrix, rhs);
    }
    for i in 1..grid.nx {
        let rows = edge_rows(Axis::Y, i, bundle, grid, t, previous)?;
        write_edge_rows(&rows, grid.ny + 1, |k| grid.idx(i, k), matrix, rhs);
    }
    Ok(())
}

/// Takes the pointwise maximum with the free boundary on every node, edges included. Schemes
/// call it after the edges are imposed.
pub(crate) fn apply_free_boundary(values: &mut [f64], floor: Option<&[f64]>) {
    if let Some(floor) = floor {
        for (v, &f) in values.iter_mut().zip(floor) {
            *v = v.max(f);
        }
    }
}

/// One implicit sweep along `axis`: for each interior line solves
/// `(I + weight L_axis) V = rhs` on the inner nodes with the edge rows of `axis` at the line
/// ends. `out` holds the starting guess and receives the solution; `previous` feeds the
/// right-hand edge rows. Returns the total number of SOR sweeps.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sweep(
    axis: Axis,
    bundle: &PdeDataBundle2D,
    grid: &Grid2D,
    ops: &Operators2D,
    weight: f64,
    t: f64,
    rhs: &[f64],
    previous: &[f64],
    out: &mut [f64],
    sor: &SorSolver,
    floor: Option<&[f64]>,
) -> Result<usize, PdeError> {
    let m = grid.line_len(axis);
    let mut matrix = SparseRowMatrix::new(m);
    let mut line_rhs = vec![0.0; m];
    let mut line_x = vec![0.0; m];
    let mut line_floor = floor.map(|_| vec![0.0; m]);
    let mut sweeps = 0;

    for line in grid.interior_lines(axis) {
        matrix.clear();
        for k in 1..m - 1 {
            let p = grid.line_node(axis, line, k);
            let w = ops.stencil(axis, p);
            matrix.set(k, k - 1, weight * w[0]);
            matrix.set(k, k, 1.0 + weight * w[1]);
            matrix.set(k, k + 1, weight * w[2]);
            line_rhs[k] = rhs[p];
        }
        let rows = edge_rows(axis, line, bundle, grid, t, previous)?;
        write_edge_rows(&rows, m, |k| k, &mut matrix, &mut line_rhs);

        for (k, x) in line_x.iter_mut().enumerate() {
            *x = out[grid.line_node(axis, line, k)];
        }
        if let (Some(line_floor), Some(floor)) = (line_floor.as_mut(), floor) {
            for (k, f) in line_floor.iter_mut().enumerate() {
                *f = floor[grid.line_node(axis, line, k)];
            }
        }

        sweeps += sor.solve(&matrix, &line_rhs, &mut line_x, line_floor.as_deref())?;

        for (k, &x) in line_x.iter().enumerate() {
            out[grid.line_node(axis, line, k)] = x;
        }
    }
    Ok(sweeps)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::core::{constant_function_3d, surface};

    /// `sin(πx) sin(πy)` on the unit square with zero Dirichlet edges and constant
    /// `a`, `b`, `e` (no reaction, no cross term).
    pub fn separable_bundle(a: f64, b: f64, e: f64, t_max: f64, t_steps: usize) -> PdeDataBundle2D {
        let zero = |level: f64| -> Arc<dyn BoundaryCondition2D> {
            Arc::new(DirichletBoundaryCondition2D::constant(0.0, level).unwrap())
        };
        let z = constant_function_3d(0.0);
        PdeDataBundle2D::new(
            Coefficients2D::new(
                constant_function_3d(a),
                constant_function_3d(b),
                z.clone(),
                z.clone(),
                constant_function_3d(e),
                z,
            ),
            surface(|x, y| (std::f64::consts::PI * x).sin() * (std::f64::consts::PI * y).sin()),
            t_max,
            t_steps,
            20,
            20,
            Boundaries2D {
                x_lower: zero(0.0),
                x_upper: zero(1.0),
                y_lower: zero(0.0),
                y_upper: zero(1.0),
            },
        )
        .unwrap()
    }
}
