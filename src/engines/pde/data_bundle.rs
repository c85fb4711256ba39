use std::fmt;
use std::sync::Arc;

use crate::core::{PdeError, Surface};

use super::boundary::BoundaryCondition;
use super::coefficients::ConvectionDiffusionCoefficients;
use super::grid::PdeGrid1D;

/// Tolerance of the grid-edge versus boundary-level check, scaled by `max(1, |x|)`.
const LEVEL_TOLERANCE: f64 = 1.0e-12;

/// Everything a one-dimensional solve needs: coefficients, initial values, the two edge
/// conditions, an optional free boundary and the grid.
///
/// Bundles are immutable. The `with_*` methods build a new bundle that shares every untouched
/// field, including the `Arc<PdeGrid1D>`.
#[derive(Clone)]
pub struct PdeDataBundle1D<C> {
    coefficients: C,
    initial_condition: Arc<[f64]>,
    lower_boundary: Arc<dyn BoundaryCondition>,
    upper_boundary: Arc<dyn BoundaryCondition>,
    free_boundary: Option<Surface>,
    grid: Arc<PdeGrid1D>,
}

fn check_levels(
    grid: &PdeGrid1D,
    lower: &dyn BoundaryCondition,
    upper: &dyn BoundaryCondition,
) -> Result<(), PdeError> {
    let n = grid.num_space_nodes();
    let checks = [
        ("lower", grid.space_node(0), lower.level()),
        ("upper", grid.space_node(n - 1), upper.level()),
    ];
    for (side, node, level) in checks {
        if (node - level).abs() > LEVEL_TOLERANCE * node.abs().max(1.0) {
            return Err(PdeError::invalid(format!(
                "{side} boundary level {level} does not match the grid edge {node}"
            )));
        }
    }
    Ok(())
}

fn check_initial(grid: &PdeGrid1D, values: &[f64]) -> Result<(), PdeError> {
    if values.len() != grid.num_space_nodes() {
        return Err(PdeError::invalid(format!(
            "initial condition has {} values, grid has {} space nodes",
            values.len(),
            grid.num_space_nodes()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PdeError::invalid("initial condition must be finite"));
    }
    Ok(())
}

impl<C: ConvectionDiffusionCoefficients + Clone> PdeDataBundle1D<C> {
    /// Bundle with initial values given node by node.
    pub fn new(
        coefficients: C,
        initial_condition: Vec<f64>,
        lower_boundary: Arc<dyn BoundaryCondition>,
        upper_boundary: Arc<dyn BoundaryCondition>,
        grid: Arc<PdeGrid1D>,
    ) -> Result<Self, PdeError> {
        check_initial(&grid, &initial_condition)?;
        check_levels(&grid, lower_boundary.as_ref(), upper_boundary.as_ref())?;
        Ok(Self {
            coefficients,
            initial_condition: initial_condition.into(),
            lower_boundary,
            upper_boundary,
            free_boundary: None,
            grid,
        })
    }

    /// Bundle with initial values obtained by evaluating `initial` at every space node.
    pub fn from_initial_function<F>(
        coefficients: C,
        initial: F,
        lower_boundary: Arc<dyn BoundaryCondition>,
        upper_boundary: Arc<dyn BoundaryCondition>,
        grid: Arc<PdeGrid1D>,
    ) -> Result<Self, PdeError>
    where
        F: Fn(f64) -> f64,
    {
        let values = grid.space_nodes().iter().map(|&x| initial(x)).collect();
        Self::new(coefficients, values, lower_boundary, upper_boundary, grid)
    }

    pub fn coefficients(&self) -> &C {
        &self.coefficients
    }

    pub fn initial_condition(&self) -> &[f64] {
        &self.initial_condition
    }

    pub fn lower_boundary(&self) -> &dyn BoundaryCondition {
        self.lower_boundary.as_ref()
    }

    pub fn upper_boundary(&self) -> &dyn BoundaryCondition {
        self.upper_boundary.as_ref()
    }

    pub fn free_boundary(&self) -> Option<&Surface> {
        self.free_boundary.as_ref()
    }

    pub fn grid(&self) -> &PdeGrid1D {
        &self.grid
    }

    /// Shared handle to the grid, for building bundles that must solve on the same grid.
    pub fn grid_handle(&self) -> &Arc<PdeGrid1D> {
        &self.grid
    }

    /// Adds a floor `V(t, x) >= free(t, x)` enforced during every time step.
    pub fn with_free_boundary(&self, free_boundary: Surface) -> Self {
        Self {
            free_boundary: Some(free_boundary),
            ..self.clone()
        }
    }

    pub fn without_free_boundary(&self) -> Self {
        Self {
            free_boundary: None,
            ..self.clone()
        }
    }

    pub fn with_initial_condition(&self, initial_condition: Vec<f64>) -> Result<Self, PdeError> {
        check_initial(&self.grid, &initial_condition)?;
        Ok(Self {
            initial_condition: initial_condition.into(),
            ..self.clone()
        })
    }

    pub fn with_boundaries(
        &self,
        lower_boundary: Arc<dyn BoundaryCondition>,
        upper_boundary: Arc<dyn BoundaryCondition>,
    ) -> Result<Self, PdeError> {
        check_levels(&self.grid, lower_boundary.as_ref(), upper_boundary.as_ref())?;
        Ok(Self {
            lower_boundary,
            upper_boundary,
            ..self.clone()
        })
    }

    /// Moves the bundle onto another grid. The space nodes must keep their count so that the
    /// initial values still line up; the edges must keep matching the boundary levels.
    pub fn with_grid(&self, grid: Arc<PdeGrid1D>) -> Result<Self, PdeError> {
        check_initial(&grid, &self.initial_condition)?;
        check_levels(&grid, self.lower_boundary.as_ref(), self.upper_boundary.as_ref())?;
        Ok(Self {
            grid,
            ..self.clone()
        })
    }

    /// Replaces the coefficients, keeping everything else.
    pub fn with_coefficients<D: ConvectionDiffusionCoefficients>(
        &self,
        coefficients: D,
    ) -> PdeDataBundle1D<D> {
        PdeDataBundle1D {
            coefficients,
            initial_condition: Arc::clone(&self.initial_condition),
            lower_boundary: Arc::clone(&self.lower_boundary),
            upper_boundary: Arc::clone(&self.upper_boundary),
            free_boundary: self.free_boundary.clone(),
            grid: Arc::clone(&self.grid),
        }
    }

    /// Free-boundary floor at every space node for time `t`.
    pub(crate) fn free_boundary_values(&self, t: f64) -> Option<Vec<f64>> {
        self.free_boundary
            .as_ref()
            .map(|free| self.grid.space_nodes().iter().map(|&x| free(t, x)).collect())
    }
}

impl<C: fmt::Debug> fmt::Debug for PdeDataBundle1D<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdeDataBundle1D")
            .field("coefficients", &self.coefficients)
            .field("initial_condition", &self.initial_condition)
            .field("lower_boundary", &self.lower_boundary)
            .field("upper_boundary", &self.upper_boundary)
            .field("free_boundary", &self.free_boundary.is_some())
            .field("grid", &self.grid)
            .finish()
    }
}
