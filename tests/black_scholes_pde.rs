use std::sync::Arc;

use openferric_pde::core::OptionType;
use openferric_pde::engines::pde::providers::{american_option_bundle, european_option_bundle};
use openferric_pde::engines::pde::{
    ConvectionDiffusionPdeSolver, PdeGrid1D, PdeResults1D, RichardsonExtrapolationFiniteDifference,
    ThetaMethodFiniteDifference,
};
use openferric_pde::math::{
    ChebyshevMeshing, DoubleExponentialMeshing, ExponentialMeshing, HyperbolicMeshing,
    MeshingFunction, UniformMeshing,
};
use openferric_pde::pricing::european::{
    black_scholes_delta, black_scholes_gamma, black_scholes_price,
};

fn rel_err(x: f64, y: f64) -> f64 {
    let denom = y.abs().max(1.0e-8);
    (x - y).abs() / denom
}

fn hyperbolic_grid(t_max: f64, nt: usize, s_max: f64, focus: f64, beta: f64) -> Arc<PdeGrid1D> {
    let time = UniformMeshing::new(0.0, t_max, nt).expect("time mesh");
    let space = HyperbolicMeshing::new(0.0, s_max, focus, 100, beta).expect("space mesh");
    Arc::new(PdeGrid1D::from_meshing(&time, &space).expect("grid"))
}

#[test]
fn european_call_and_put_match_black_scholes() {
    let (strike, rate, vol, expiry) = (100.0, 0.05, 0.2, 1.0);
    let grid = hyperbolic_grid(expiry, 50, 5.0 * strike, strike, 0.1 * strike);
    let solver = ThetaMethodFiniteDifference::new();

    for option_type in [OptionType::Call, OptionType::Put] {
        let bundle =
            european_option_bundle(option_type, strike, rate, 0.0, vol, Arc::clone(&grid))
                .expect("bundle");
        let solution = solver.solve(&bundle).expect("pde solve");
        for (spot, tolerance) in [(90.0, 5.0e-3), (100.0, 1.0e-3), (110.0, 5.0e-3)] {
            let pde = solution.value_at(spot);
            let bs = black_scholes_price(option_type, spot, strike, rate, 0.0, vol, expiry);
            assert!(
                rel_err(pde, bs) < tolerance,
                "{option_type:?} at {spot}: pde={pde} bs={bs}"
            );
        }
    }
}

#[test]
fn american_put_matches_reference_value() {
    // S = K = 40, r = 6%, σ = 20%, T = 1; reference 2.319.
    let grid = hyperbolic_grid(1.0, 50, 200.0, 40.0, 4.0);
    let bundle =
        american_option_bundle(OptionType::Put, 40.0, 0.06, 0.0, 0.2, grid).expect("bundle");
    let solution = ThetaMethodFiniteDifference::new()
        .solve(&bundle)
        .expect("pde solve");
    let pde = solution.value_at(40.0);
    assert!((pde - 2.319).abs() < 5.0e-3, "american put pde={pde}");

    let european = black_scholes_price(OptionType::Put, 40.0, 40.0, 0.06, 0.0, 0.2, 1.0);
    assert!(pde > european, "early exercise premium must be positive");
    for (i, &s) in bundle.grid().space_nodes().iter().enumerate() {
        assert!(solution.function_value(i) >= (40.0 - s).max(0.0) - 1.0e-12);
    }
}

#[test]
fn richardson_extrapolation_reduces_implicit_euler_time_error() {
    let (strike, rate, vol, expiry) = (100.0, 0.05, 0.2, 1.0);
    let grid = Arc::new(PdeGrid1D::uniform(11, 401, expiry, 0.0, 500.0).expect("grid"));
    let bundle = european_option_bundle(OptionType::Call, strike, rate, 0.0, vol, grid)
        .expect("bundle");
    let implicit = ThetaMethodFiniteDifference::new()
        .with_theta(1.0)
        .with_exponential_fitting(false);

    let bs = black_scholes_price(OptionType::Call, 100.0, strike, rate, 0.0, vol, expiry);
    let base = implicit.solve(&bundle).expect("base solve").value_at(100.0);
    let extrapolated = RichardsonExtrapolationFiniteDifference::new(implicit)
        .solve(&bundle)
        .expect("richardson solve")
        .value_at(100.0);

    let base_error = (base - bs).abs();
    let extrapolated_error = (extrapolated - bs).abs();
    assert!(
        extrapolated_error < 0.5 * base_error,
        "base error {base_error}, extrapolated error {extrapolated_error}"
    );
}

#[test]
fn european_prices_hold_on_every_space_meshing() {
    let (strike, rate, vol, expiry) = (100.0, 0.05, 0.2, 1.0);
    let time = UniformMeshing::new(0.0, expiry, 50).expect("time mesh");
    let meshes: Vec<Box<dyn MeshingFunction>> = vec![
        Box::new(UniformMeshing::new(0.0, 500.0, 201).expect("uniform")),
        Box::new(ExponentialMeshing::new(0.0, 500.0, 150, 2.0).expect("exponential")),
        Box::new(
            DoubleExponentialMeshing::new(0.0, 500.0, strike, 150, -3.0, 3.0)
                .expect("double exponential"),
        ),
        Box::new(HyperbolicMeshing::new(0.0, 500.0, strike, 100, 10.0).expect("hyperbolic")),
        Box::new(ChebyshevMeshing::new(0.0, 500.0, 200).expect("chebyshev")),
    ];
    let solver = ThetaMethodFiniteDifference::new();

    for space in &meshes {
        let grid = Arc::new(PdeGrid1D::from_meshing(&time, space.as_ref()).expect("grid"));
        for option_type in [OptionType::Call, OptionType::Put] {
            let bundle =
                european_option_bundle(option_type, strike, rate, 0.0, vol, Arc::clone(&grid))
                    .expect("bundle");
            let solution = solver.solve(&bundle).expect("pde solve");
            for spot in [90.0, 100.0, 110.0] {
                let pde = solution.value_at(spot);
                let bs = black_scholes_price(option_type, spot, strike, rate, 0.0, vol, expiry);
                assert!(
                    rel_err(pde, bs) < 1.0e-2,
                    "{space:?} {option_type:?} at {spot}: pde={pde} bs={bs}"
                );
            }
        }
    }
}

#[test]
fn spatial_derivatives_match_black_scholes_greeks() {
    let (strike, rate, vol, expiry) = (100.0, 0.05, 0.2, 1.0);
    // dS = 2, so spots 90, 100 and 110 sit on nodes 45, 50 and 55
    let grid = Arc::new(PdeGrid1D::uniform(50, 201, expiry, 0.0, 400.0).expect("grid"));
    let bundle = european_option_bundle(OptionType::Call, strike, rate, 0.0, vol, grid)
        .expect("bundle");
    let solution = ThetaMethodFiniteDifference::new()
        .solve(&bundle)
        .expect("pde solve");

    for (i, spot) in [(45, 90.0), (50, 100.0), (55, 110.0)] {
        assert!((solution.space_value(i) - spot).abs() < 1.0e-9);
        let delta = black_scholes_delta(OptionType::Call, spot, strike, rate, 0.0, vol, expiry);
        let gamma = black_scholes_gamma(spot, strike, rate, 0.0, vol, expiry);
        let pde_delta = solution.first_spatial_derivative(i);
        let pde_gamma = solution.second_spatial_derivative(i);
        assert!(
            rel_err(pde_delta, delta) < 2.0e-3,
            "delta at {spot}: pde={pde_delta} bs={delta}"
        );
        assert!(
            rel_err(pde_gamma, gamma) < 5.0e-3,
            "gamma at {spot}: pde={pde_gamma} bs={gamma}"
        );
    }
}
