//! Read-only views over a solved one-dimensional problem.
//!
//! Values are stored; spatial derivatives are computed on demand from the grid stencils
//! (central in the interior, one-sided second order at the two edges).

use std::sync::Arc;

use serde::Serialize;

use crate::math::interpolate_linear;

use super::grid::PdeGrid1D;

fn first_derivative(grid: &PdeGrid1D, values: &[f64], i: usize) -> f64 {
    let n = values.len();
    if i == 0 {
        let w = grid
            .first_derivative_forward_coefficients(0)
            .unwrap_or([0.0; 3]);
        PdeGrid1D::apply_stencil(&w, values, 0)
    } else if i == n - 1 {
        let w = grid
            .first_derivative_backward_coefficients(n - 1)
            .unwrap_or([0.0; 3]);
        PdeGrid1D::apply_stencil(&w, values, n - 3)
    } else {
        PdeGrid1D::apply_stencil(grid.central_first(i), values, i - 1)
    }
}

fn second_derivative(grid: &PdeGrid1D, values: &[f64], i: usize) -> f64 {
    let n = values.len();
    let start = i.clamp(1, n - 2) - 1;
    PdeGrid1D::apply_stencil(grid.central_second(i), values, start)
}

/// Queries shared by full and terminal results. Space indices past the grid panic, like slice
/// indexing.
pub trait PdeResults1D {
    fn grid(&self) -> &PdeGrid1D;

    /// Solution on the last time node.
    fn terminal_values(&self) -> &[f64];

    fn num_space_nodes(&self) -> usize {
        self.grid().num_space_nodes()
    }

    fn space_value(&self, i: usize) -> f64 {
        self.grid().space_node(i)
    }

    /// Terminal solution at space index `i`.
    fn function_value(&self, i: usize) -> f64 {
        self.terminal_values()[i]
    }

    fn first_spatial_derivative(&self, i: usize) -> f64 {
        first_derivative(self.grid(), self.terminal_values(), i)
    }

    fn second_spatial_derivative(&self, i: usize) -> f64 {
        second_derivative(self.grid(), self.terminal_values(), i)
    }

    /// Terminal solution interpolated linearly at `x`, flat outside the grid.
    fn value_at(&self, x: f64) -> f64 {
        interpolate_linear(x, self.grid().space_nodes(), self.terminal_values())
    }

    fn terminal_results(&self) -> PdeTerminalResults1D;
}

/// Final time slice of a solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdeTerminalResults1D {
    grid: Arc<PdeGrid1D>,
    values: Vec<f64>,
}

impl PdeTerminalResults1D {
    pub(crate) fn new(grid: Arc<PdeGrid1D>, values: Vec<f64>) -> Self {
        debug_assert_eq!(grid.num_space_nodes(), values.len());
        Self { grid, values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn grid_handle(&self) -> &Arc<PdeGrid1D> {
        &self.grid
    }
}

impl PdeResults1D for PdeTerminalResults1D {
    fn grid(&self) -> &PdeGrid1D {
        &self.grid
    }

    fn terminal_values(&self) -> &[f64] {
        &self.values
    }

    fn terminal_results(&self) -> PdeTerminalResults1D {
        self.clone()
    }
}

/// Solution at every time node, `values[n][i]` for time node `n` and space node `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdeFullResults1D {
    grid: Arc<PdeGrid1D>,
    values: Vec<Vec<f64>>,
}

impl PdeFullResults1D {
    pub(crate) fn new(grid: Arc<PdeGrid1D>, values: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(grid.num_time_nodes(), values.len());
        Self { grid, values }
    }

    pub fn num_time_nodes(&self) -> usize {
        self.values.len()
    }

    pub fn time_value(&self, n: usize) -> f64 {
        self.grid.time_node(n)
    }

    pub fn time_slice(&self, n: usize) -> &[f64] {
        &self.values[n]
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn function_value_at(&self, i: usize, n: usize) -> f64 {
        self.values[n][i]
    }

    pub fn first_spatial_derivative_at(&self, i: usize, n: usize) -> f64 {
        first_derivative(&self.grid, &self.values[n], i)
    }

    pub fn second_spatial_derivative_at(&self, i: usize, n: usize) -> f64 {
        second_derivative(&self.grid, &self.values[n], i)
    }

    pub fn grid_handle(&self) -> &Arc<PdeGrid1D> {
        &self.grid
    }
}

impl PdeResults1D for PdeFullResults1D {
    fn grid(&self) -> &PdeGrid1D {
        &self.grid
    }

    fn terminal_values(&self) -> &[f64] {
        self.values.last().map(Vec::as_slice).unwrap_or(&[])
    }

    fn terminal_results(&self) -> PdeTerminalResults1D {
        PdeTerminalResults1D::new(Arc::clone(&self.grid), self.terminal_values().to_vec())
    }
}

/// Output of a one-dimensional solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PdeSolution1D {
    Full(PdeFullResults1D),
    Terminal(PdeTerminalResults1D),
}

impl PdeSolution1D {
    pub fn as_full(&self) -> Option<&PdeFullResults1D> {
        match self {
            Self::Full(full) => Some(full),
            Self::Terminal(_) => None,
        }
    }

    pub fn into_full(self) -> Option<PdeFullResults1D> {
        match self {
            Self::Full(full) => Some(full),
            Self::Terminal(_) => None,
        }
    }

    pub fn grid_handle(&self) -> &Arc<PdeGrid1D> {
        match self {
            Self::Full(full) => full.grid_handle(),
            Self::Terminal(terminal) => terminal.grid_handle(),
        }
    }
}

impl PdeResults1D for PdeSolution1D {
    fn grid(&self) -> &PdeGrid1D {
        self.grid_handle()
    }

    fn terminal_values(&self) -> &[f64] {
        match self {
            Self::Full(full) => full.terminal_values(),
            Self::Terminal(terminal) => terminal.terminal_values(),
        }
    }

    fn terminal_results(&self) -> PdeTerminalResults1D {
        match self {
            Self::Full(full) => full.terminal_results(),
            Self::Terminal(terminal) => terminal.clone(),
        }
    }
}
