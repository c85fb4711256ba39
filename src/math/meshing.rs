//! Non-uniform point placement for finite-difference grids.
//!
//! A meshing function maps an index `0..N` to a coordinate. Every implementation returns the
//! lower bound at index 0 and the upper bound at index `N - 1` exactly, and is strictly
//! increasing in between.

use crate::core::PdeError;

/// Index-to-coordinate mapping used to build grid axes.
pub trait MeshingFunction: std::fmt::Debug + Send + Sync {
    /// Number of points `N` in the mesh.
    fn num_points(&self) -> usize;

    /// Coordinate of point `i`. Indices past `N - 1` are clamped to the upper bound.
    fn evaluate(&self, i: usize) -> f64;

    /// All `N` coordinates.
    fn points(&self) -> Vec<f64> {
        (0..self.num_points()).map(|i| self.evaluate(i)).collect()
    }
}

fn validate_bounds(lower: f64, upper: f64, num_points: usize) -> Result<(), PdeError> {
    if num_points < 2 {
        return Err(PdeError::invalid("meshing needs at least 2 points"));
    }
    if !lower.is_finite() || !upper.is_finite() || upper <= lower {
        return Err(PdeError::invalid(format!(
            "meshing bounds must be finite with lower < upper, got [{lower}, {upper}]"
        )));
    }
    Ok(())
}

fn ensure_strictly_increasing<M: MeshingFunction>(mesh: M) -> Result<M, PdeError> {
    let points = mesh.points();
    if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
        return Err(PdeError::invalid(format!(
            "{mesh:?} produces a non-finite point at index {bad}"
        )));
    }
    if let Some(i) = points.windows(2).position(|w| w[1] <= w[0]) {
        return Err(PdeError::invalid(format!(
            "{mesh:?} is not strictly increasing at index {}: {} then {}",
            i + 1,
            points[i],
            points[i + 1]
        )));
    }
    Ok(mesh)
}

/// Equally spaced points on `[lower, upper]`, optionally shifted so that a set of fixed
/// points lies exactly on the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMeshing {
    lower: f64,
    upper: f64,
    num_points: usize,
    // (index, value) pairs overriding the uniform law
    fixed: Vec<(usize, f64)>,
}

impl UniformMeshing {
    /// `N` equally spaced points on `[0, 1]`.
    pub fn unit(num_points: usize) -> Result<Self, PdeError> {
        Self::new(0.0, 1.0, num_points)
    }

    /// `N` equally spaced points on `[lower, upper]`.
    pub fn new(lower: f64, upper: f64, num_points: usize) -> Result<Self, PdeError> {
        validate_bounds(lower, upper, num_points)?;
        Ok(Self {
            lower,
            upper,
            num_points,
            fixed: Vec::new(),
        })
    }

    /// Moves the mesh point nearest to each fixed point onto it. Fixed points must lie
    /// strictly inside the bounds and map to distinct interior indices.
    pub fn with_fixed_points(mut self, fixed_points: &[f64]) -> Result<Self, PdeError> {
        let n = self.num_points;
        if n < 3 && !fixed_points.is_empty() {
            return Err(PdeError::invalid(
                "fixed points need at least one interior mesh point",
            ));
        }
        let span = self.upper - self.lower;
        let mut fixed = Vec::with_capacity(fixed_points.len());
        for &value in fixed_points {
            if !(value > self.lower && value < self.upper) {
                return Err(PdeError::invalid(format!(
                    "fixed point {value} must lie strictly inside [{}, {}]",
                    self.lower, self.upper
                )));
            }
            let z = (value - self.lower) / span * (n - 1) as f64;
            let index = (z.round() as usize).clamp(1, n - 2);
            if fixed.iter().any(|&(i, _)| i == index) {
                return Err(PdeError::invalid(format!(
                    "fixed point {value} collides with another fixed point; use more mesh points"
                )));
            }
            fixed.push((index, value));
        }
        fixed.sort_by_key(|&(i, _)| i);
        self.fixed = fixed;

        let points = self.points();
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PdeError::invalid(
                "fixed points produce a non-monotonic mesh; use more mesh points",
            ));
        }
        Ok(self)
    }
}

impl MeshingFunction for UniformMeshing {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn evaluate(&self, i: usize) -> f64 {
        if i == 0 {
            return self.lower;
        }
        if i >= self.num_points - 1 {
            return self.upper;
        }
        if let Some(&(_, value)) = self.fixed.iter().find(|&&(index, _)| index == i) {
            return value;
        }
        let z = i as f64 / (self.num_points - 1) as f64;
        self.lower + (self.upper - self.lower) * z
    }
}

/// Points following `lower + (upper - lower) * (1 - exp(λz)) / (1 - exp(λ))` with
/// `z = i / (N - 1)`. Positive `λ` concentrates points near the lower bound, negative near
/// the upper bound; `λ = 0` is uniform.
///
/// Construction fails when `λ` is so large that neighbouring points coincide in `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialMeshing {
    lower: f64,
    upper: f64,
    num_points: usize,
    lambda: f64,
}

impl ExponentialMeshing {
    pub fn new(lower: f64, upper: f64, num_points: usize, lambda: f64) -> Result<Self, PdeError> {
        validate_bounds(lower, upper, num_points)?;
        if !lambda.is_finite() {
            return Err(PdeError::invalid("lambda must be finite"));
        }
        ensure_strictly_increasing(Self {
            lower,
            upper,
            num_points,
            lambda,
        })
    }
}

impl MeshingFunction for ExponentialMeshing {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn evaluate(&self, i: usize) -> f64 {
        if i == 0 {
            return self.lower;
        }
        if i >= self.num_points - 1 {
            return self.upper;
        }
        let z = i as f64 / (self.num_points - 1) as f64;
        let span = self.upper - self.lower;
        if self.lambda.abs() < 1.0e-12 {
            return self.lower + span * z;
        }
        // written so that neither exponential overflows for large |λ|
        let weight = if self.lambda > 0.0 {
            (self.lambda * (z - 1.0)).exp() * (-self.lambda * z).exp_m1() / (-self.lambda).exp_m1()
        } else {
            (self.lambda * z).exp_m1() / self.lambda.exp_m1()
        };
        self.lower + span * weight
    }
}

/// Two exponential meshes joined at `centre`: one on `[lower, centre]` and one on
/// `[centre, upper]`. Points are shared out in proportion to the two lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleExponentialMeshing {
    lower_mesh: ExponentialMeshing,
    upper_mesh: ExponentialMeshing,
    num_points: usize,
}

impl DoubleExponentialMeshing {
    /// `lambda_lower` shapes the lower segment and `lambda_upper` the upper one. A negative
    /// `lambda_lower` and a positive `lambda_upper` cluster points around `centre`.
    pub fn new(
        lower: f64,
        upper: f64,
        centre: f64,
        num_points: usize,
        lambda_lower: f64,
        lambda_upper: f64,
    ) -> Result<Self, PdeError> {
        validate_bounds(lower, upper, num_points)?;
        if !(centre > lower && centre < upper) {
            return Err(PdeError::invalid(format!(
                "centre {centre} must lie strictly inside [{lower}, {upper}]"
            )));
        }
        if num_points < 3 {
            return Err(PdeError::invalid(
                "double exponential meshing needs at least 3 points",
            ));
        }
        let fraction = (centre - lower) / (upper - lower);
        // the centre point belongs to both segments
        let n_lower = ((fraction * (num_points - 1) as f64).round() as usize + 1)
            .clamp(2, num_points - 1);
        let n_upper = num_points - n_lower + 1;
        ensure_strictly_increasing(Self {
            lower_mesh: ExponentialMeshing::new(lower, centre, n_lower, lambda_lower)?,
            upper_mesh: ExponentialMeshing::new(centre, upper, n_upper, lambda_upper)?,
            num_points,
        })
    }
}

impl MeshingFunction for DoubleExponentialMeshing {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn evaluate(&self, i: usize) -> f64 {
        let n_lower = self.lower_mesh.num_points();
        if i < n_lower {
            self.lower_mesh.evaluate(i)
        } else {
            self.upper_mesh.evaluate(i + 1 - n_lower)
        }
    }
}

/// Points concentrated around `focus` through a sinh map,
/// `x(z) = focus + β sinh(c₁ + (c₂ - c₁) z)`. Smaller `β` gives stronger clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperbolicMeshing {
    lower: f64,
    upper: f64,
    focus: f64,
    num_points: usize,
    beta: f64,
    c_lower: f64,
    c_upper: f64,
}

impl HyperbolicMeshing {
    pub fn new(
        lower: f64,
        upper: f64,
        focus: f64,
        num_points: usize,
        beta: f64,
    ) -> Result<Self, PdeError> {
        validate_bounds(lower, upper, num_points)?;
        if !beta.is_finite() || beta <= 0.0 {
            return Err(PdeError::invalid("beta must be finite and > 0"));
        }
        if !(focus >= lower && focus <= upper) {
            return Err(PdeError::invalid(format!(
                "focus {focus} must lie inside [{lower}, {upper}]"
            )));
        }
        ensure_strictly_increasing(Self {
            lower,
            upper,
            focus,
            num_points,
            beta,
            c_lower: ((lower - focus) / beta).asinh(),
            c_upper: ((upper - focus) / beta).asinh(),
        })
    }
}

impl MeshingFunction for HyperbolicMeshing {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn evaluate(&self, i: usize) -> f64 {
        if i == 0 {
            return self.lower;
        }
        if i >= self.num_points - 1 {
            return self.upper;
        }
        let z = i as f64 / (self.num_points - 1) as f64;
        let y = self.c_lower + (self.c_upper - self.c_lower) * z;
        (self.focus + self.beta * y.sinh()).clamp(self.lower, self.upper)
    }
}

/// Chebyshev-Gauss-Lobatto points, `lower + (upper - lower)(1 - cos(πz)) / 2`, concentrated
/// at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevMeshing {
    lower: f64,
    upper: f64,
    num_points: usize,
}

impl ChebyshevMeshing {
    pub fn new(lower: f64, upper: f64, num_points: usize) -> Result<Self, PdeError> {
        validate_bounds(lower, upper, num_points)?;
        Ok(Self {
            lower,
            upper,
            num_points,
        })
    }
}

impl MeshingFunction for ChebyshevMeshing {
    fn num_points(&self) -> usize {
        self.num_points
    }

    fn evaluate(&self, i: usize) -> f64 {
        if i == 0 {
            return self.lower;
        }
        if i >= self.num_points - 1 {
            return self.upper;
        }
        let z = i as f64 / (self.num_points - 1) as f64;
        let w = 0.5 * (1.0 - (std::f64::consts::PI * z).cos());
        self.lower + (self.upper - self.lower) * w
    }
}
