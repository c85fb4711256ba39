//! Black-Scholes-Merton closed forms.
//!
//! Used as the analytic reference of the PDE engines and to build Dirichlet edges of option
//! bundles.

use statrs::function::erf::erfc;

use crate::core::OptionType;

#[inline]
fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

fn d1_d2(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> (f64, f64) {
    let sig_sqrt_t = vol * expiry.sqrt();
    let d1 =
        ((spot / strike).ln() + (rate - dividend_yield + 0.5 * vol * vol) * expiry) / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

/// Black-Scholes-Merton price with continuous dividend yield.
///
/// Returns the intrinsic value for `expiry <= 0` and the discounted forward intrinsic value
/// for `vol <= 0`.
///
/// # Examples
/// ```rust
/// use openferric_pde::core::OptionType;
/// use openferric_pde::pricing::european::black_scholes_price;
///
/// let call = black_scholes_price(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.20, 1.0);
/// let put = black_scholes_price(OptionType::Put, 100.0, 100.0, 0.05, 0.0, 0.20, 1.0);
/// assert!(call > put);
/// ```
pub fn black_scholes_price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    if expiry <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }
    let df_r = (-rate * expiry).exp();
    let df_q = (-dividend_yield * expiry).exp();
    if vol <= 0.0 || spot <= 0.0 {
        return match option_type {
            OptionType::Call => (spot * df_q - strike * df_r).max(0.0),
            OptionType::Put => (strike * df_r - spot * df_q).max(0.0),
        };
    }

    let (d1, d2) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    match option_type {
        OptionType::Call => spot * df_q * norm_cdf(d1) - strike * df_r * norm_cdf(d2),
        OptionType::Put => strike * df_r * norm_cdf(-d2) - spot * df_q * norm_cdf(-d1),
    }
}

/// Black-Scholes delta `∂V/∂S`.
pub fn black_scholes_delta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let df_q = (-dividend_yield * expiry.max(0.0)).exp();
    if expiry <= 0.0 || vol <= 0.0 || spot <= 0.0 {
        let forward_itm = spot * df_q > strike * (-rate * expiry.max(0.0)).exp();
        return match (option_type, forward_itm) {
            (OptionType::Call, true) => df_q,
            (OptionType::Put, false) => -df_q,
            _ => 0.0,
        };
    }
    let (d1, _) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    match option_type {
        OptionType::Call => df_q * norm_cdf(d1),
        OptionType::Put => -df_q * norm_cdf(-d1),
    }
}

/// Black-Scholes gamma `∂²V/∂S²`, identical for calls and puts.
pub fn black_scholes_gamma(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    if expiry <= 0.0 || vol <= 0.0 || spot <= 0.0 {
        return 0.0;
    }
    let (d1, _) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let pdf = (-0.5 * d1 * d1).exp() / (2.0 * std::f64::consts::PI).sqrt();
    (-dividend_yield * expiry).exp() * pdf / (spot * vol * expiry.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn put_call_parity_holds() {
        let (s, k, r, q, v, t) = (105.0, 100.0, 0.04, 0.01, 0.25, 1.5);
        let call = black_scholes_price(OptionType::Call, s, k, r, q, v, t);
        let put = black_scholes_price(OptionType::Put, s, k, r, q, v, t);
        assert_relative_eq!(
            call - put,
            s * (-q * t).exp() - k * (-r * t).exp(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn textbook_value() {
        // Hull: S = 42, K = 40, r = 10%, sigma = 20%, T = 0.5
        let call = black_scholes_price(OptionType::Call, 42.0, 40.0, 0.1, 0.0, 0.2, 0.5);
        assert_relative_eq!(call, 4.76, epsilon = 5e-3);
    }

    #[test]
    fn greeks_match_bumped_prices() {
        let (s, k, r, q, v, t) = (100.0, 95.0, 0.03, 0.02, 0.3, 0.75);
        let price = |s: f64| black_scholes_price(OptionType::Put, s, k, r, q, v, t);
        let h = 1e-3;
        assert_relative_eq!(
            black_scholes_delta(OptionType::Put, s, k, r, q, v, t),
            (price(s + h) - price(s - h)) / (2.0 * h),
            epsilon = 1e-7
        );
        assert_relative_eq!(
            black_scholes_gamma(s, k, r, q, v, t),
            (price(s + h) - 2.0 * price(s) + price(s - h)) / (h * h),
            epsilon = 1e-5
        );
    }

    #[test]
    fn degenerate_inputs_fall_back_to_intrinsic() {
        assert_eq!(
            black_scholes_price(OptionType::Call, 110.0, 100.0, 0.05, 0.0, 0.2, 0.0),
            10.0
        );
        assert_eq!(
            black_scholes_price(OptionType::Put, 0.0, 100.0, 0.0, 0.0, 0.2, 1.0),
            100.0
        );
    }
}
