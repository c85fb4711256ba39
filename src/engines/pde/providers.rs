//! Ready-made coefficient sets, payoffs and bundles for option-pricing equations.
//!
//! Every equation is written in the solver convention `∂V/∂t + a V'' + b V' + c V = 0` with `t`
//! the time to expiry, so the payoff is the initial condition.

use std::sync::Arc;

use crate::core::{constant_surface, surface, Curve, OptionType, PdeError, Surface};
use crate::pricing::european::black_scholes_price;

use super::boundary::{BoundaryCondition, DirichletBoundaryCondition};
use super::coefficients::{FullCoefficients, StandardCoefficients};
use super::data_bundle::PdeDataBundle1D;
use super::grid::PdeGrid1D;

/// Bump used for the finite-difference derivatives of a local volatility.
const LOCAL_VOL_BUMP: f64 = 1.0e-4;

/// Black-Scholes in spot with constant parameters.
pub fn black_scholes(rate: f64, dividend_yield: f64, vol: f64) -> StandardCoefficients {
    StandardCoefficients::new(
        surface(move |_, s| {
            let sv = s * vol;
            -0.5 * sv * sv
        }),
        surface(move |_, s| -s * (rate - dividend_yield)),
        constant_surface(rate),
    )
}

/// Black-Scholes in spot with rate, dividend yield and volatility given as curves of `t`.
pub fn black_scholes_term_structure(
    rate: Curve,
    dividend_yield: Curve,
    vol: Curve,
) -> StandardCoefficients {
    let carry_rate = Arc::clone(&rate);
    StandardCoefficients::new(
        surface(move |t, s| {
            let sv = s * vol(t);
            -0.5 * sv * sv
        }),
        surface(move |t, s| -s * (carry_rate(t) - dividend_yield(t))),
        surface(move |t, _| rate(t)),
    )
}

/// Black-Scholes in `x = ln S`. All three coefficients are constant.
pub fn log_black_scholes(rate: f64, dividend_yield: f64, vol: f64) -> StandardCoefficients {
    let a = -0.5 * vol * vol;
    let b = -a - (rate - dividend_yield);
    StandardCoefficients::new(
        constant_surface(a),
        constant_surface(b),
        constant_surface(rate),
    )
}

/// Constant elasticity of variance `dF = σ F^β dW` for a forward, discounted at `rate`.
pub fn cev(rate: f64, beta: f64, vol: f64) -> StandardCoefficients {
    StandardCoefficients::new(
        surface(move |_, f| {
            let sv = vol * f.powf(beta);
            -0.5 * sv * sv
        }),
        constant_surface(0.0),
        constant_surface(rate),
    )
}

/// Backward equation in spot for a local volatility `σ(t, S)` quoted in calendar time. The
/// solver's `t` is time to `maturity`.
pub fn backwards_local_vol(
    rate: f64,
    dividend_yield: f64,
    maturity: f64,
    local_vol: Surface,
) -> StandardCoefficients {
    StandardCoefficients::new(
        surface(move |tau, s| {
            let sv = s * local_vol(maturity - tau, s);
            -0.5 * sv * sv
        }),
        surface(move |_, s| -s * (rate - dividend_yield)),
        constant_surface(rate),
    )
}

/// Forward (Dupire) equation for call prices in strike `k` with `t` the expiry.
pub fn forward_black_scholes(rate: f64, dividend_yield: f64, vol: f64) -> StandardCoefficients {
    StandardCoefficients::new(
        surface(move |_, k| {
            let kv = k * vol;
            -0.5 * kv * kv
        }),
        surface(move |_, k| k * (rate - dividend_yield)),
        constant_surface(dividend_yield),
    )
}

/// Fokker-Planck equation of the density of `dS = r(t) S dt + σ(t, S) S dW` in the full form
/// `∂p/∂t + ∂²[α p] + ∂[β p] = 0`.
pub fn fokker_planck(rate: Curve, local_vol: Surface) -> FullCoefficients {
    FullCoefficients::new(
        constant_surface(1.0),
        constant_surface(1.0),
        constant_surface(0.0),
        surface(move |t, s| {
            let sv = s * local_vol(t, s);
            -0.5 * sv * sv
        }),
        surface(move |t, s| rate(t) * s),
    )
}

/// The same density equation expanded into standard form. Spatial derivatives of the local
/// volatility are taken by central differences.
pub fn fokker_planck_standard(rate: Curve, local_vol: Surface) -> StandardCoefficients {
    let lv_a = Arc::clone(&local_vol);
    let lv_b = Arc::clone(&local_vol);
    let rate_b = Arc::clone(&rate);

    let derivatives = move |lv: &Surface, t: f64, s: f64| {
        let eps = LOCAL_VOL_BUMP * s.abs().max(1.0);
        let up = lv(t, s + eps);
        let mid = lv(t, s);
        let down = lv(t, s - eps);
        (mid, (up - down) / (2.0 * eps), (up - 2.0 * mid + down) / (eps * eps))
    };

    StandardCoefficients::new(
        surface(move |t, s| {
            let sv = s * lv_a(t, s);
            -0.5 * sv * sv
        }),
        surface(move |t, s| {
            let (lv, lv1, _) = derivatives(&lv_b, t, s);
            s * (rate_b(t) - 2.0 * lv * (s * lv1 + lv))
        }),
        surface(move |t, s| {
            let (lv, lv1, lv2) = derivatives(&local_vol, t, s);
            let g1 = lv + s * lv1;
            rate(t) - g1 * g1 - lv * s * (s * lv2 + 2.0 * lv1)
        }),
    )
}

/// Vanilla payoff as a function of spot.
pub fn spot_payoff(option_type: OptionType, strike: f64) -> impl Fn(f64) -> f64 + Send + Sync {
    move |s| option_type.intrinsic(s, strike)
}

/// Vanilla payoff as a function of `x = ln S`.
pub fn log_spot_payoff(
    option_type: OptionType,
    strike: f64,
) -> impl Fn(f64) -> f64 + Send + Sync {
    move |x| option_type.intrinsic(x.exp(), strike)
}

/// Initial condition of the forward equation: zero-expiry prices as a function of strike for
/// today's `spot`.
pub fn forward_payoff(option_type: OptionType, spot: f64) -> impl Fn(f64) -> f64 + Send + Sync {
    move |k| option_type.intrinsic(spot, k)
}

fn dirichlet(
    value: impl Fn(f64) -> f64 + Send + Sync + 'static,
    level: f64,
) -> Result<Arc<dyn BoundaryCondition>, PdeError> {
    Ok(Arc::new(DirichletBoundaryCondition::new(Arc::new(value), level)?))
}

/// Black-Scholes parameters shared by the bundle helpers.
#[derive(Debug, Clone, Copy)]
struct Vanilla {
    option_type: OptionType,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
}

impl Vanilla {
    /// `S e^{-q t} - K e^{-r t}`.
    fn forward_gap(&self, spot: f64, t: f64) -> f64 {
        spot * (-self.dividend_yield * t).exp() - self.strike * (-self.rate * t).exp()
    }

    fn price(&self, spot: f64, t: f64) -> f64 {
        black_scholes_price(
            self.option_type,
            spot,
            self.strike,
            self.rate,
            self.dividend_yield,
            self.vol,
            t,
        )
    }
}

/// Black-Scholes bundle for a European option on a spot grid.
///
/// The edges carry the asymptotic prices: for a call `0` below and
/// `S e^{-q t} - K e^{-r t}` above, for a put `K e^{-r t} - S e^{-q t}` below and `0` above.
pub fn european_option_bundle(
    option_type: OptionType,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    grid: Arc<PdeGrid1D>,
) -> Result<PdeDataBundle1D<StandardCoefficients>, PdeError> {
    validate_option(strike, vol)?;
    let v = Vanilla {
        option_type,
        strike,
        rate,
        dividend_yield,
        vol,
    };
    let s_min = grid.space_node(0);
    let s_max = grid.space_node(grid.num_space_nodes() - 1);

    let (lower, upper) = match option_type {
        OptionType::Call => (
            dirichlet(move |t| v.price(s_min, t), s_min)?,
            dirichlet(move |t| v.forward_gap(s_max, t).max(0.0), s_max)?,
        ),
        OptionType::Put => (
            dirichlet(move |t| (-v.forward_gap(s_min, t)).max(0.0), s_min)?,
            dirichlet(move |t| v.price(s_max, t), s_max)?,
        ),
    };

    PdeDataBundle1D::from_initial_function(
        black_scholes(rate, dividend_yield, vol),
        spot_payoff(option_type, strike),
        lower,
        upper,
        grid,
    )
}

/// Black-Scholes bundle for an American option: the European bundle with the payoff as free
/// boundary and the in-the-money edge held at least at intrinsic value.
pub fn american_option_bundle(
    option_type: OptionType,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    grid: Arc<PdeGrid1D>,
) -> Result<PdeDataBundle1D<StandardCoefficients>, PdeError> {
    let european =
        european_option_bundle(option_type, strike, rate, dividend_yield, vol, Arc::clone(&grid))?;
    let v = Vanilla {
        option_type,
        strike,
        rate,
        dividend_yield,
        vol,
    };
    let s_min = grid.space_node(0);
    let s_max = grid.space_node(grid.num_space_nodes() - 1);

    let (lower, upper) = match option_type {
        OptionType::Call => (
            dirichlet(move |t| v.price(s_min, t), s_min)?,
            dirichlet(
                move |t| v.forward_gap(s_max, t).max(s_max - strike).max(0.0),
                s_max,
            )?,
        ),
        OptionType::Put => (
            dirichlet(
                move |t| (-v.forward_gap(s_min, t)).max(strike - s_min).max(0.0),
                s_min,
            )?,
            dirichlet(move |t| v.price(s_max, t), s_max)?,
        ),
    };

    Ok(european
        .with_boundaries(lower, upper)?
        .with_free_boundary(surface(move |_, s| option_type.intrinsic(s, strike))))
}

fn validate_option(strike: f64, vol: f64) -> Result<(), PdeError> {
    if !strike.is_finite() || strike <= 0.0 {
        return Err(PdeError::invalid("strike must be finite and > 0"));
    }
    if !vol.is_finite() || vol < 0.0 {
        return Err(PdeError::invalid("vol must be finite and >= 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{constant_curve, curve};
    use crate::engines::pde::coefficients::ConvectionDiffusionCoefficients;
    use approx::assert_relative_eq;

    #[test]
    fn black_scholes_coefficients_follow_the_backward_equation() {
        let c = black_scholes(0.05, 0.02, 0.3);
        assert_relative_eq!(c.a(0.3, 100.0), -0.5 * 0.09 * 1.0e4, epsilon = 1e-9);
        assert_relative_eq!(c.b(0.3, 100.0), -3.0, epsilon = 1e-12);
        assert_eq!(c.c(0.3, 100.0), 0.05);

        let ts = black_scholes_term_structure(
            constant_curve(0.05),
            constant_curve(0.02),
            curve(|t| 0.3 + t),
        );
        assert_relative_eq!(ts.a(0.0, 100.0), c.a(0.0, 100.0), epsilon = 1e-9);
        assert_relative_eq!(ts.a(0.1, 1.0), -0.5 * 0.16, epsilon = 1e-12);
    }

    #[test]
    fn log_and_forward_forms() {
        let log = log_black_scholes(0.05, 0.01, 0.2);
        assert_relative_eq!(log.a(0.0, 4.6), -0.02, epsilon = 1e-15);
        assert_relative_eq!(log.b(0.0, 4.6), 0.02 - 0.04, epsilon = 1e-15);

        let fwd = forward_black_scholes(0.05, 0.01, 0.2);
        assert_relative_eq!(fwd.b(0.0, 50.0), 2.0, epsilon = 1e-12);
        assert_eq!(fwd.c(0.0, 50.0), 0.01);

        let cev = cev(0.03, 0.5, 0.4);
        assert_relative_eq!(cev.a(0.0, 4.0), -0.5 * 0.16 * 4.0, epsilon = 1e-12);
    }

    #[test]
    fn fokker_planck_forms_agree_for_flat_vol() {
        let full = fokker_planck(constant_curve(0.04), constant_surface(0.25));
        let standard = fokker_planck_standard(constant_curve(0.04), constant_surface(0.25));
        let s = 80.0;
        assert_relative_eq!(full.alpha(0.5, s), standard.a(0.5, s), epsilon = 1e-9);
        assert_relative_eq!(full.beta(0.5, s), 0.04 * s, epsilon = 1e-12);
        // b = s (r - 2 σ²), c = r - σ² for a flat volatility
        assert_relative_eq!(standard.b(0.5, s), s * (0.04 - 2.0 * 0.0625), epsilon = 1e-9);
        assert_relative_eq!(standard.c(0.5, s), 0.04 - 0.0625, epsilon = 1e-6);
    }

    #[test]
    fn payoffs() {
        assert_eq!(spot_payoff(OptionType::Call, 100.0)(120.0), 20.0);
        assert_relative_eq!(
            log_spot_payoff(OptionType::Put, 100.0)(80.0_f64.ln()),
            20.0,
            epsilon = 1e-12
        );
        assert_eq!(forward_payoff(OptionType::Call, 100.0)(90.0), 10.0);
    }

    #[test]
    fn bundles_validate_and_set_edges() {
        let grid = Arc::new(PdeGrid1D::uniform(11, 51, 1.0, 0.0, 400.0).unwrap());
        let put =
            european_option_bundle(OptionType::Put, 100.0, 0.05, 0.0, 0.2, Arc::clone(&grid))
                .unwrap();
        let coefficients = put.coefficients().clone();
        assert_relative_eq!(
            put.lower_boundary().constant(&coefficients, &grid, 1.0),
            100.0 * (-0.05_f64).exp(),
            epsilon = 1e-12
        );
        assert!(put.free_boundary().is_none());

        let american =
            american_option_bundle(OptionType::Put, 100.0, 0.05, 0.0, 0.2, Arc::clone(&grid))
                .unwrap();
        assert_relative_eq!(
            american.lower_boundary().constant(&coefficients, &grid, 1.0),
            100.0,
            epsilon = 1e-12
        );
        assert!(american.free_boundary().is_some());

        assert!(european_option_bundle(OptionType::Call, -1.0, 0.05, 0.0, 0.2, grid).is_err());
    }
}
