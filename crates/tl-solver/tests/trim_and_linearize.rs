//! Trim a small analytic plant and linearize it at the trim point.

use std::collections::HashMap;

use tl_plant::{Plant, PlantResult, Quantity, StateVector, TablePlant};
use tl_solver::{Constraints, NelderMead, SimplexConfig, StateSpace, TrimBounds, Trimmer};

/// Longitudinal toy model with an equilibrium at
/// throttle = 0.45, elevator = -0.1, alpha = 0.05. Exposes its rates so the
/// linearization does not difference large states over a tiny step.
fn toy(values: &mut HashMap<Quantity, f64>, dt: f64) -> PlantResult<()> {
    let thr = values[&Quantity::ThrottleCmd];
    let de = values[&Quantity::DeCmd];
    let alpha = values[&Quantity::Alpha];

    let vt_dot = 10.0 * (thr - 0.4 - alpha);
    let alpha_dot = -2.0 * (alpha - 0.05);
    let q_dot = -3.0 * (de + 2.0 * alpha);

    values.insert(Quantity::VtDot, vt_dot);
    values.insert(Quantity::AlphaDot, alpha_dot);
    values.insert(Quantity::QDot, q_dot);
    *values.entry(Quantity::Vt).or_default() += vt_dot * dt;
    *values.entry(Quantity::Alpha).or_default() += alpha_dot * dt;
    *values.entry(Quantity::Q).or_default() += q_dot * dt;
    Ok(())
}

fn toy_plant() -> TablePlant {
    let mut plant = TablePlant::new(1.0 / 120.0);
    for q in [
        Quantity::ThrottleCmd,
        Quantity::DaCmd,
        Quantity::DeCmd,
        Quantity::DrCmd,
        Quantity::Vt,
        Quantity::Alpha,
        Quantity::Beta,
        Quantity::Phi,
        Quantity::Theta,
        Quantity::P,
        Quantity::Q,
        Quantity::R,
        Quantity::Alt,
    ] {
        plant = plant.with_value(q, 0.0);
    }
    plant
        .with_output(Quantity::VtDot, 0.0)
        .with_output(Quantity::AlphaDot, 0.0)
        .with_output(Quantity::QDot, 0.0)
        .with_step(toy)
}

#[test]
fn trim_then_linearize() {
    let mut plant = toy_plant();

    let point = {
        let trimmer = Trimmer::new(&mut plant, Constraints::level(300.0, 2000.0, 0.0)).unwrap();
        let config = SimplexConfig {
            max_iterations: 5000,
            ..SimplexConfig::from_bounds(&TrimBounds::default())
        };
        let mut solver = NelderMead::new(trimmer, config).unwrap();
        let sol = solver.run().unwrap().require_converged().unwrap();
        let mut trimmer = solver.into_cost_function();
        trimmer.apply(&sol.params).unwrap()
    };

    assert!((point.params.throttle - 0.45).abs() < 1e-4);
    assert!((point.params.elevator + 0.1).abs() < 1e-4);
    assert!((point.params.alpha - 0.05).abs() < 1e-4);
    assert!(point.cost < 1e-8);
    assert_eq!(plant.get(&Quantity::Vt).unwrap(), 300.0);

    let x = StateVector::from_quantities([Quantity::Vt, Quantity::Alpha, Quantity::Q]).unwrap();
    let u = StateVector::from_quantities([Quantity::ThrottleCmd, Quantity::DeCmd]).unwrap();
    let y = StateVector::from_quantities([Quantity::Vt, Quantity::Alpha]).unwrap();
    let ss = StateSpace::new(x.clone(), u, y);
    let reference = ss.reference_point(&plant).unwrap();
    let model = ss.linearize(&mut plant, &reference).unwrap();

    let close = |a: f64, b: f64| (a - b).abs() < 1e-5;
    assert!(close(model.a[(0, 1)], -10.0));
    assert!(close(model.a[(1, 1)], -2.0));
    assert!(close(model.a[(2, 1)], -6.0));
    assert!(close(model.b[(0, 0)], 10.0));
    assert!(close(model.b[(2, 1)], -3.0));
    assert_eq!(model.c.shape(), (2, 3));
    assert_eq!(x.get(&plant).unwrap(), reference.x0);
}
