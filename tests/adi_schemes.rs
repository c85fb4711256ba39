use std::f64::consts::PI;
use std::sync::Arc;

use openferric_pde::core::{constant_function_3d, constant_surface, function_3d, surface};
use openferric_pde::engines::pde::adi::{
    BoundaryCondition2D, BoundaryPolicy, Boundaries2D, Coefficients2D,
    ConvectionDiffusionPdeSolver2D, CraigSneydFiniteDifference2D,
    CrankNicolsonFiniteDifference2D, DirichletBoundaryCondition2D, ExplicitFiniteDifference2D,
    NeumannBoundaryCondition2D, OperatorSplittingFiniteDifference2D, PdeDataBundle2D,
    PeacemanRachfordFiniteDifference2D,
};
use openferric_pde::engines::pde::{
    BoundaryCondition, ConvectionDiffusionPdeSolver, DirichletBoundaryCondition, PdeDataBundle1D,
    PdeGrid1D, PdeResults1D, PdeSolution1D, StandardCoefficients, ThetaMethodFiniteDifference,
};

const STEPS: usize = 20;

fn zero_edge(level: f64) -> Arc<dyn BoundaryCondition2D> {
    Arc::new(DirichletBoundaryCondition2D::constant(0.0, level).expect("edge"))
}

fn unit_square_zero_edges() -> Boundaries2D {
    Boundaries2D {
        x_lower: zero_edge(0.0),
        x_upper: zero_edge(1.0),
        y_lower: zero_edge(0.0),
        y_upper: zero_edge(1.0),
    }
}

/// `∂V/∂t + a V_xx + e V_yy = 0` from `sin(πx) sin(πy)` with zero edges.
fn separable_bundle(a: f64, e: f64, t_max: f64, t_steps: usize) -> PdeDataBundle2D {
    let z = constant_function_3d(0.0);
    PdeDataBundle2D::new(
        Coefficients2D::new(
            constant_function_3d(a),
            z.clone(),
            z.clone(),
            z.clone(),
            constant_function_3d(e),
            z,
        ),
        surface(|x, y| (PI * x).sin() * (PI * y).sin()),
        t_max,
        t_steps,
        STEPS,
        STEPS,
        unit_square_zero_edges(),
    )
    .expect("bundle")
}

/// One-dimensional Crank-Nicolson solution of `∂u/∂t + a u'' = 0` from `sin(πx)`.
fn crank_nicolson_1d(a: f64, t_max: f64, t_steps: usize) -> PdeSolution1D {
    let grid =
        Arc::new(PdeGrid1D::uniform(t_steps + 1, STEPS + 1, t_max, 0.0, 1.0).expect("grid"));
    let edge = |level: f64| -> Arc<dyn BoundaryCondition> {
        Arc::new(DirichletBoundaryCondition::constant(0.0, level).expect("edge"))
    };
    let bundle = PdeDataBundle1D::from_initial_function(
        StandardCoefficients::new(
            constant_surface(a),
            constant_surface(0.0),
            constant_surface(0.0),
        ),
        |x| (PI * x).sin(),
        edge(0.0),
        edge(1.0),
        grid,
    )
    .expect("bundle");
    ThetaMethodFiniteDifference::new()
        .with_exponential_fitting(false)
        .solve(&bundle)
        .expect("1-D solve")
}

fn schemes() -> Vec<(&'static str, Box<dyn ConvectionDiffusionPdeSolver2D>)> {
    vec![
        ("explicit", Box::new(ExplicitFiniteDifference2D::new())),
        ("crank-nicolson", Box::new(CrankNicolsonFiniteDifference2D::new())),
        ("peaceman-rachford", Box::new(PeacemanRachfordFiniteDifference2D::new())),
        ("craig-sneyd", Box::new(CraigSneydFiniteDifference2D::new())),
        ("operator splitting", Box::new(OperatorSplittingFiniteDifference2D::new())),
    ]
}

#[test]
fn separable_problem_matches_product_of_one_dimensional_solutions() {
    let (a, e, t_max) = (-0.1, -0.05, 0.1);
    let ux = crank_nicolson_1d(a, t_max, 10);
    let uy = crank_nicolson_1d(e, t_max, 10);

    let cases: [(&str, Box<dyn ConvectionDiffusionPdeSolver2D>, usize, f64); 5] = [
        ("explicit", Box::new(ExplicitFiniteDifference2D::new()), 40, 2.0e-3),
        ("crank-nicolson", Box::new(CrankNicolsonFiniteDifference2D::new()), 10, 1.0e-4),
        ("peaceman-rachford", Box::new(PeacemanRachfordFiniteDifference2D::new()), 10, 1.0e-6),
        ("craig-sneyd", Box::new(CraigSneydFiniteDifference2D::new()), 10, 1.0e-6),
        ("operator splitting", Box::new(OperatorSplittingFiniteDifference2D::new()), 10, 1.0e-6),
    ];
    for (name, solver, t_steps, tolerance) in cases {
        let result = solver
            .solve(&separable_bundle(a, e, t_max, t_steps))
            .expect("2-D solve");
        assert_eq!(result.num_x_nodes(), STEPS + 1);
        assert_eq!(result.num_y_nodes(), STEPS + 1);
        for j in 0..=STEPS {
            for i in 0..=STEPS {
                let expected = ux.function_value(i) * uy.function_value(j);
                let got = result.value(i, j);
                assert!(
                    (got - expected).abs() < tolerance,
                    "{name} at ({i}, {j}): {got} vs {expected}"
                );
            }
        }
    }
}

#[test]
fn linear_solution_is_preserved_with_a_cross_term() {
    // V = x + 2y solves the equation for any a, d, e when b = c = f = 0.
    let edge = |level: f64, value: fn(f64) -> f64| -> Arc<dyn BoundaryCondition2D> {
        Arc::new(
            DirichletBoundaryCondition2D::new(surface(move |_, pos| value(pos)), level)
                .expect("edge"),
        )
    };
    let z = constant_function_3d(0.0);
    let bundle = PdeDataBundle2D::new(
        Coefficients2D::new(
            constant_function_3d(-0.2),
            z.clone(),
            z.clone(),
            function_3d(|_, x, y| -0.05 * (1.0 + x * y)),
            constant_function_3d(-0.1),
            z,
        ),
        surface(|x, y| x + 2.0 * y),
        0.5,
        200,
        STEPS,
        STEPS,
        Boundaries2D {
            x_lower: edge(0.0, |y| 2.0 * y),
            x_upper: edge(1.0, |y| 1.0 + 2.0 * y),
            y_lower: edge(0.0, |x| x),
            y_upper: edge(1.0, |x| x + 2.0),
        },
    )
    .expect("bundle");

    for (name, solver) in schemes() {
        let result = solver.solve(&bundle).expect("2-D solve");
        for (j, &y) in result.y_nodes().iter().enumerate() {
            for (i, &x) in result.x_nodes().iter().enumerate() {
                let got = result.value(i, j);
                assert!(
                    (got - (x + 2.0 * y)).abs() < 1.0e-7,
                    "{name} at ({x}, {y}): {got}"
                );
            }
        }
    }
}

#[test]
fn neumann_edges_keep_a_constant_solution_constant() {
    let flat = |level: f64| -> Arc<dyn BoundaryCondition2D> {
        Arc::new(NeumannBoundaryCondition2D::constant(0.0, level).expect("edge"))
    };
    let one = |level: f64| -> Arc<dyn BoundaryCondition2D> {
        Arc::new(DirichletBoundaryCondition2D::constant(1.0, level).expect("edge"))
    };
    let z = constant_function_3d(0.0);
    let bundle = PdeDataBundle2D::new(
        Coefficients2D::new(
            constant_function_3d(-0.1),
            constant_function_3d(0.02),
            z.clone(),
            constant_function_3d(-0.03),
            constant_function_3d(-0.1),
            constant_function_3d(-0.01),
        ),
        surface(|_, _| 1.0),
        0.5,
        200,
        STEPS,
        STEPS,
        Boundaries2D {
            x_lower: one(0.0),
            x_upper: one(1.0),
            y_lower: flat(0.0),
            y_upper: flat(1.0),
        },
    )
    .expect("bundle");

    for (name, solver) in schemes() {
        let result = solver.solve(&bundle).expect("2-D solve");
        for &v in result.values() {
            assert!((v - 1.0).abs() < 1.0e-7, "{name}: {v}");
        }
    }
}

#[test]
fn free_boundary_is_respected_by_every_scheme() {
    let floor = function_3d(|_, x, y| 0.8 * (PI * x).sin() * (PI * y).sin());
    for (name, solver) in schemes() {
        let t_steps = if name == "explicit" { 200 } else { 50 };
        let bundle =
            separable_bundle(-0.1, -0.1, 0.5, t_steps).with_free_boundary(floor.clone());
        let result = solver.solve(&bundle).expect("2-D solve");
        for j in 1..STEPS {
            for i in 1..STEPS {
                let bound = 0.8
                    * (PI * result.x_nodes()[i]).sin()
                    * (PI * result.y_nodes()[j]).sin();
                assert!(
                    result.value(i, j) >= bound - 1.0e-9,
                    "{name} at ({i}, {j}) below the free boundary"
                );
            }
        }
        let centre = result.value(STEPS / 2, STEPS / 2);
        assert!((centre - 0.8).abs() < 0.8e-6, "{name}: centre {centre}");
    }
}

#[test]
fn edges_below_the_free_boundary_are_lifted_by_every_scheme() {
    // zero Dirichlet edges under a floor of 0.5
    let floored_bundle = |t_steps: usize| {
        let z = constant_function_3d(0.0);
        let diffusion = constant_function_3d(-0.05);
        PdeDataBundle2D::new(
            Coefficients2D::new(diffusion.clone(), z.clone(), z.clone(), z.clone(), diffusion, z),
            constant_surface(1.0),
            0.5,
            t_steps,
            STEPS,
            STEPS,
            unit_square_zero_edges(),
        )
        .expect("bundle")
        .with_free_boundary(constant_function_3d(0.5))
    };

    let mut edges_per_scheme = Vec::new();
    for (name, solver) in schemes() {
        let t_steps = if name == "explicit" { 200 } else { 50 };
        let result = solver.solve(&floored_bundle(t_steps)).expect("2-D solve");
        assert!(
            result.values().iter().all(|&v| v >= 0.5 - 1.0e-12),
            "{name} leaves nodes below the free boundary"
        );
        let edges: Vec<f64> = (0..=STEPS)
            .flat_map(|k| {
                [
                    result.value(0, k),
                    result.value(STEPS, k),
                    result.value(k, 0),
                    result.value(k, STEPS),
                ]
            })
            .collect();
        assert!(edges.iter().all(|&v| v == 0.5), "{name} edges {edges:?}");
        edges_per_scheme.push(edges);
    }
    assert!(edges_per_scheme.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn boundary_policies_are_reported_per_scheme() {
    let policies: Vec<_> = schemes()
        .iter()
        .map(|(_, solver)| solver.boundary_policy())
        .collect();
    assert_eq!(
        policies,
        vec![
            BoundaryPolicy::EndOfStep,
            BoundaryPolicy::InSystem,
            BoundaryPolicy::EverySubStep,
            BoundaryPolicy::EndOfStep,
            BoundaryPolicy::EverySubStep,
        ]
    );
}

#[test]
fn value_at_interpolates_between_nodes() {
    let result = PeacemanRachfordFiniteDifference2D::new()
        .solve(&separable_bundle(-0.1, -0.1, 0.1, 10))
        .expect("2-D solve");
    let (x, y) = (0.5, 0.525);
    let expected = 0.5 * (result.value(10, 10) + result.value(10, 11));
    assert!((result.value_at(x, y) - expected).abs() < 1.0e-12);
    assert!(result.first_x_derivative(10, 10).abs() < 1.0e-6);
}
