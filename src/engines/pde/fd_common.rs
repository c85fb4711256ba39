use crate::core::PdeError;

use super::coefficients::{
    ConvectionDiffusionCoefficients, FullCoefficients, StandardCoefficients,
};
use super::grid::PdeGrid1D;

/// Ratio between `|b dx|` and `|a|` beyond which one term is treated as dominant.
const FITTING_DOMINANCE: f64 = 10.0;

/// Which branch of the exponential fitting produced a diffusion value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FittingRegime {
    Degenerate,
    ConvectionDominated,
    DiffusionDominated,
    Blended,
}

/// Fitted diffusion coefficient at interior node `i`.
///
/// When convection dominates, the value is chosen so that the fitted three-point operator becomes
/// an upwind first difference; when diffusion dominates, `a` is returned unchanged. In between,
/// the weights `exp(b dx₁ / a)` and `exp(-b dx₂ / a)` blend the two limits.
pub(crate) fn exponential_fitting(
    grid: &PdeGrid1D,
    i: usize,
    a: f64,
    b: f64,
) -> (f64, FittingRegime) {
    if a == 0.0 && b == 0.0 {
        return (0.0, FittingRegime::Degenerate);
    }

    let x1st = grid.central_first(i);
    let x2nd = grid.central_second(i);
    let bdx1 = b * grid.space_step(i - 1);
    let bdx2 = b * grid.space_step(i);

    if bdx1.abs() > FITTING_DOMINANCE * a.abs() || bdx2.abs() > FITTING_DOMINANCE * a.abs() {
        // a > 0 is a negative diffusion in this sign convention
        let sign = if a > 0.0 { -1.0 } else { 1.0 };
        let rho = if b > 0.0 {
            sign * b * x1st[0] / x2nd[0]
        } else {
            -sign * b * x1st[2] / x2nd[2]
        };
        return (rho, FittingRegime::ConvectionDominated);
    }
    if a.abs() > FITTING_DOMINANCE * bdx1.abs() || a.abs() > FITTING_DOMINANCE * bdx2.abs() {
        return (a, FittingRegime::DiffusionDominated);
    }

    let e1 = (bdx1 / a).exp();
    let e2 = (-bdx2 / a).exp();
    let rho = -b * (x1st[0] * e1 + x1st[1] + x1st[2] * e2)
        / (x2nd[0] * e1 + x2nd[1] + x2nd[2] * e2);
    (rho, FittingRegime::Blended)
}

/// Discrete operator `L` on the interior nodes, one `[lower, diag, upper]` triple per node.
/// Entries 0 and `N - 1` stay zero.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OperatorBands {
    pub lower: Vec<f64>,
    pub diag: Vec<f64>,
    pub upper: Vec<f64>,
}

impl OperatorBands {
    pub fn zeros(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// `(L f)_i` for interior `i`.
    #[inline]
    pub fn apply(&self, f: &[f64], i: usize) -> f64 {
        self.lower[i] * f[i - 1] + self.diag[i] * f[i] + self.upper[i] * f[i + 1]
    }

    /// Fills the bands for standard coefficients at time `t`. Returns how many nodes took
    /// the convection-dominated fitting branch.
    pub fn fill_standard(
        &mut self,
        coefficients: &StandardCoefficients,
        grid: &PdeGrid1D,
        t: f64,
        fitting: bool,
    ) -> Result<usize, PdeError> {
        let n = grid.num_space_nodes();
        let mut convection_nodes = 0;
        for i in 1..n - 1 {
            let x = grid.space_node(i);
            let a = coefficients.a(t, x);
            let b = coefficients.b(t, x);
            let c = coefficients.c(t, x);
            check_finite(a, b, c, t, x)?;

            let rho = if fitting {
                let (rho, regime) = exponential_fitting(grid, i, a, b);
                if regime == FittingRegime::ConvectionDominated {
                    convection_nodes += 1;
                }
                rho
            } else {
                a
            };

            let x1st = grid.central_first(i);
            let x2nd = grid.central_second(i);
            self.lower[i] = x2nd[0] * rho + x1st[0] * b;
            self.diag[i] = x2nd[1] * rho + x1st[1] * b + c;
            self.upper[i] = x2nd[2] * rho + x1st[2] * b;
        }
        Ok(convection_nodes)
    }

    /// Fills the bands of `a ∂²[α V] + b ∂[β V] + c V` at time `t`. The inner weights are
    /// evaluated at the neighbour each stencil entry multiplies.
    pub fn fill_full(
        &mut self,
        coefficients: &FullCoefficients,
        grid: &PdeGrid1D,
        t: f64,
    ) -> Result<(), PdeError> {
        let n = grid.num_space_nodes();
        let mut alpha = Vec::with_capacity(n);
        let mut beta = Vec::with_capacity(n);
        for &x in grid.space_nodes() {
            alpha.push(coefficients.alpha(t, x));
            beta.push(coefficients.beta(t, x));
        }

        for i in 1..n - 1 {
            let x = grid.space_node(i);
            let a = coefficients.a(t, x);
            let b = coefficients.b(t, x);
            let c = coefficients.c(t, x);
            check_finite(a, b, c, t, x)?;

            let x1st = grid.central_first(i);
            let x2nd = grid.central_second(i);
            self.lower[i] = x2nd[0] * a * alpha[i - 1] + x1st[0] * b * beta[i - 1];
            self.diag[i] = x2nd[1] * a * alpha[i] + x1st[1] * b * beta[i] + c;
            self.upper[i] = x2nd[2] * a * alpha[i + 1] + x1st[2] * b * beta[i + 1];
        }
        if alpha.iter().chain(beta.iter()).any(|v| !v.is_finite()) {
            return Err(PdeError::numerical(format!(
                "non-finite alpha/beta coefficient at t = {t}"
            )));
        }
        Ok(())
    }
}

fn check_finite(a: f64, b: f64, c: f64, t: f64, x: f64) -> Result<(), PdeError> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(PdeError::numerical(format!(
            "non-finite PDE coefficient at (t, x) = ({t}, {x}): a = {a}, b = {b}, c = {c}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> PdeGrid1D {
        PdeGrid1D::uniform(2, 11, 1.0, 0.0, 1.0).unwrap()
    }

    #[test]
    fn zero_diffusion_and_convection_is_a_special_case() {
        assert_eq!(
            exponential_fitting(&grid(), 3, 0.0, 0.0),
            (0.0, FittingRegime::Degenerate)
        );
    }

    #[test]
    fn diffusion_dominated_keeps_a() {
        let (rho, regime) = exponential_fitting(&grid(), 3, -1.0, 0.5);
        assert_eq!(regime, FittingRegime::DiffusionDominated);
        assert_eq!(rho, -1.0);
    }

    #[test]
    fn convection_dominated_gives_upwind_operator() {
        let g = grid();
        let b = 50.0;
        let (rho, regime) = exponential_fitting(&g, 4, -0.01, b);
        assert_eq!(regime, FittingRegime::ConvectionDominated);
        // on a uniform grid the downstream weight vanishes
        let x1st = g.central_first(4);
        let x2nd = g.central_second(4);
        assert_relative_eq!(x2nd[2] * rho + x1st[2] * b, 0.0, epsilon = 1e-9);
        assert_relative_eq!(rho, -0.5 * b * g.space_step(4), epsilon = 1e-12);
    }

    #[test]
    fn blend_lies_between_the_limits() {
        let g = grid();
        let a = -0.02;
        let b = 0.5;
        let (rho, regime) = exponential_fitting(&g, 5, a, b);
        assert_eq!(regime, FittingRegime::Blended);
        assert!(rho.is_finite());
        assert!(rho < 0.0);
        // fitting adds numerical diffusion
        assert!(rho.abs() >= a.abs());
    }
}
