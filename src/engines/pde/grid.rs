//! Space/time grid with precomputed finite-difference stencils.
//!
//! All stencils are second-order accurate on non-uniform nodes. With `h_m = x_i - x_{i-1}` and
//! `h_p = x_{i+1} - x_i` the central first-derivative weights on `[f_{i-1}, f_i, f_{i+1}]` are
//! `[-h_p / (h_m (h_m + h_p)), (h_p - h_m) / (h_m h_p), h_m / (h_p (h_m + h_p))]` and the
//! second-derivative weights are `[2 / (h_m (h_m + h_p)), -2 / (h_m h_p), 2 / (h_p (h_m + h_p))]`.

use serde::Serialize;

use crate::core::PdeError;
use crate::math::lower_bound_index;
use crate::math::meshing::{MeshingFunction, UniformMeshing};

/// Immutable one-dimensional space grid paired with a time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdeGrid1D {
    time_nodes: Vec<f64>,
    space_nodes: Vec<f64>,
    time_steps: Vec<f64>,
    space_steps: Vec<f64>,
    first_central: Vec<[f64; 3]>,
    first_forward: Vec<[f64; 3]>,
    first_backward: Vec<[f64; 3]>,
    second_central: Vec<[f64; 3]>,
}

fn check_strictly_increasing(name: &str, nodes: &[f64]) -> Result<(), PdeError> {
    if nodes.iter().any(|v| !v.is_finite()) {
        return Err(PdeError::invalid(format!("{name} nodes must be finite")));
    }
    if let Some(i) = nodes.windows(2).position(|w| w[1] <= w[0]) {
        return Err(PdeError::invalid(format!(
            "{name} nodes must be strictly increasing, node {} = {} follows {}",
            i + 1,
            nodes[i + 1],
            nodes[i]
        )));
    }
    Ok(())
}

impl PdeGrid1D {
    /// Builds a grid from explicit node arrays.
    pub fn new(time_nodes: Vec<f64>, space_nodes: Vec<f64>) -> Result<Self, PdeError> {
        if time_nodes.len() < 2 {
            return Err(PdeError::invalid("grid needs at least 2 time nodes"));
        }
        if space_nodes.len() < 3 {
            return Err(PdeError::invalid("grid needs at least 3 space nodes"));
        }
        check_strictly_increasing("time", &time_nodes)?;
        check_strictly_increasing("space", &space_nodes)?;

        let time_steps: Vec<f64> = time_nodes.windows(2).map(|w| w[1] - w[0]).collect();
        let space_steps: Vec<f64> = space_nodes.windows(2).map(|w| w[1] - w[0]).collect();

        let n = space_nodes.len();
        let mut first_central = vec![[0.0; 3]; n];
        let mut second_central = vec![[0.0; 3]; n];
        let mut first_forward = vec![[0.0; 3]; n];
        let mut first_backward = vec![[0.0; 3]; n];

        for i in 1..n - 1 {
            let h_m = space_steps[i - 1];
            let h_p = space_steps[i];
            first_central[i] = [
                -h_p / (h_m * (h_m + h_p)),
                (h_p - h_m) / (h_m * h_p),
                h_m / (h_p * (h_m + h_p)),
            ];
            second_central[i] = [
                2.0 / (h_m * (h_m + h_p)),
                -2.0 / (h_m * h_p),
                2.0 / (h_p * (h_m + h_p)),
            ];
        }
        // boundary nodes reuse the nearest interior second-derivative stencil
        second_central[0] = second_central[1];
        second_central[n - 1] = second_central[n - 2];

        // forward weights act on [f_i, f_{i+1}, f_{i+2}]
        for i in 0..n - 2 {
            let h1 = space_steps[i];
            let h2 = space_steps[i + 1];
            first_forward[i] = [
                -(2.0 * h1 + h2) / (h1 * (h1 + h2)),
                (h1 + h2) / (h1 * h2),
                -h1 / (h2 * (h1 + h2)),
            ];
        }
        // backward weights act on [f_{i-2}, f_{i-1}, f_i]
        for i in 2..n {
            let h1 = space_steps[i - 1];
            let h2 = space_steps[i - 2];
            first_backward[i] = [
                h1 / (h2 * (h1 + h2)),
                -(h1 + h2) / (h1 * h2),
                (2.0 * h1 + h2) / (h1 * (h1 + h2)),
            ];
        }

        Ok(Self {
            time_nodes,
            space_nodes,
            time_steps,
            space_steps,
            first_central,
            first_forward,
            first_backward,
            second_central,
        })
    }

    /// Equally spaced nodes on `[0, t_max]` and `[x_min, x_max]`.
    pub fn uniform(
        num_time_nodes: usize,
        num_space_nodes: usize,
        t_max: f64,
        x_min: f64,
        x_max: f64,
    ) -> Result<Self, PdeError> {
        let time = UniformMeshing::new(0.0, t_max, num_time_nodes)?;
        let space = UniformMeshing::new(x_min, x_max, num_space_nodes)?;
        Self::from_meshing(&time, &space)
    }

    /// Nodes generated by a pair of meshing functions.
    pub fn from_meshing(
        time_mesh: &dyn MeshingFunction,
        space_mesh: &dyn MeshingFunction,
    ) -> Result<Self, PdeError> {
        Self::new(time_mesh.points(), space_mesh.points())
    }

    pub fn num_time_nodes(&self) -> usize {
        self.time_nodes.len()
    }

    pub fn num_space_nodes(&self) -> usize {
        self.space_nodes.len()
    }

    pub fn time_nodes(&self) -> &[f64] {
        &self.time_nodes
    }

    pub fn space_nodes(&self) -> &[f64] {
        &self.space_nodes
    }

    /// Time of node `n`. Panics when `n` is out of range, like slice indexing.
    #[inline]
    pub fn time_node(&self, n: usize) -> f64 {
        self.time_nodes[n]
    }

    /// Coordinate of space node `i`. Panics when `i` is out of range.
    #[inline]
    pub fn space_node(&self, i: usize) -> f64 {
        self.space_nodes[i]
    }

    /// `t_{n+1} - t_n`.
    #[inline]
    pub fn time_step(&self, n: usize) -> f64 {
        self.time_steps[n]
    }

    /// `x_{i+1} - x_i`.
    #[inline]
    pub fn space_step(&self, i: usize) -> f64 {
        self.space_steps[i]
    }

    /// Central first-derivative weights on `[f_{i-1}, f_i, f_{i+1}]`; boundary indices have no
    /// central stencil.
    pub fn first_derivative_coefficients(&self, i: usize) -> Result<[f64; 3], PdeError> {
        let n = self.num_space_nodes();
        if i == 0 || i >= n - 1 {
            return Err(PdeError::invalid(format!(
                "no central first-derivative stencil at index {i} of {n}; use the forward or backward stencil"
            )));
        }
        Ok(self.first_central[i])
    }

    /// Forward first-derivative weights on `[f_i, f_{i+1}, f_{i+2}]`, defined for `i <= N - 3`.
    pub fn first_derivative_forward_coefficients(&self, i: usize) -> Result<[f64; 3], PdeError> {
        let n = self.num_space_nodes();
        if i + 2 >= n {
            return Err(PdeError::invalid(format!(
                "no forward first-derivative stencil at index {i} of {n}"
            )));
        }
        Ok(self.first_forward[i])
    }

    /// Backward first-derivative weights on `[f_{i-2}, f_{i-1}, f_i]`, defined for `i >= 2`.
    pub fn first_derivative_backward_coefficients(&self, i: usize) -> Result<[f64; 3], PdeError> {
        let n = self.num_space_nodes();
        if i < 2 || i >= n {
            return Err(PdeError::invalid(format!(
                "no backward first-derivative stencil at index {i} of {n}"
            )));
        }
        Ok(self.first_backward[i])
    }

    /// Second-derivative weights. At a boundary index these are the weights of the adjacent
    /// interior node, acting on the same three points.
    pub fn second_derivative_coefficients(&self, i: usize) -> Result<[f64; 3], PdeError> {
        let n = self.num_space_nodes();
        if i >= n {
            return Err(PdeError::invalid(format!(
                "space index {i} out of range for {n} nodes"
            )));
        }
        Ok(self.second_central[i])
    }

    #[inline]
    pub(crate) fn central_first(&self, i: usize) -> &[f64; 3] {
        &self.first_central[i]
    }

    #[inline]
    pub(crate) fn central_second(&self, i: usize) -> &[f64; 3] {
        &self.second_central[i]
    }

    /// Largest `n` with `t_n <= t`, clamped to `[0, num_time_nodes - 2]`.
    pub fn lower_bound_index_for_time(&self, t: f64) -> usize {
        lower_bound_index(&self.time_nodes, t)
    }

    /// Largest `i` with `x_i <= x`, clamped to `[0, num_space_nodes - 2]`.
    pub fn lower_bound_index_for_space(&self, x: f64) -> usize {
        lower_bound_index(&self.space_nodes, x)
    }

    /// Same space nodes, time axis with the midpoint of every interval inserted.
    pub fn with_double_time_steps(&self) -> Self {
        let mut time_nodes = Vec::with_capacity(2 * self.time_nodes.len() - 1);
        for w in self.time_nodes.windows(2) {
            time_nodes.push(w[0]);
            time_nodes.push(0.5 * (w[0] + w[1]));
        }
        time_nodes.push(self.time_nodes[self.time_nodes.len() - 1]);

        let time_steps = time_nodes.windows(2).map(|w| w[1] - w[0]).collect();
        Self {
            time_nodes,
            time_steps,
            ..self.clone()
        }
    }

    /// Stencil-weighted sum of `values` around node `i`.
    #[inline]
    pub(crate) fn apply_stencil(weights: &[f64; 3], values: &[f64], start: usize) -> f64 {
        weights[0] * values[start] + weights[1] * values[start + 1] + weights[2] * values[start + 2]
    }
}
