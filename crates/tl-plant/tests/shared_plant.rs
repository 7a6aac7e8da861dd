use std::collections::HashMap;

use tl_plant::{Category, Component, Plant, PlantResult, Quantity, StateVector, TablePlant};

/// x' = -x + u, y = 2x
fn first_order(values: &mut HashMap<Quantity, f64>, dt: f64) -> PlantResult<()> {
    let x = values[&Quantity::named("x")];
    let u = values[&Quantity::named("u")];
    let xdot = -x + u;
    values.insert(Quantity::named("x"), x + xdot * dt);
    values.insert(Quantity::named("y"), 2.0 * (x + xdot * dt));
    Ok(())
}

#[test]
fn state_input_and_output_vectors_share_one_plant() {
    let mut plant = TablePlant::new(0.1)
        .with_value(Quantity::named("x"), 1.0)
        .with_value(Quantity::named("u"), 3.0)
        .with_output(Quantity::named("y"), 2.0)
        .with_step(first_order);

    let x = StateVector::new()
        .with(Component::custom("x", "m", Category::State, Quantity::named("x")))
        .unwrap();
    let u = StateVector::new()
        .with(Component::custom("u", "N", Category::Control, Quantity::named("u")))
        .unwrap();
    let y = StateVector::new()
        .with(Component::custom("y", "m", Category::Output, Quantity::named("y")))
        .unwrap();

    let x0 = x.snapshot(&plant).unwrap();
    u.set(&mut plant, &[1.0]).unwrap();
    plant.run_one_step().unwrap();

    let rates = x.rates(&plant, &x0, plant.time_step()).unwrap();
    assert!((rates[0] - 0.0).abs() < 1e-12);
    assert!((y.get(&plant).unwrap()[0] - 2.0).abs() < 1e-12);

    u.set(&mut plant, &[3.0]).unwrap();
    let x1 = x.snapshot(&plant).unwrap();
    plant.run_one_step().unwrap();
    let rates = x.rates(&plant, &x1, plant.time_step()).unwrap();
    assert!((rates[0] - 2.0).abs() < 1e-12);

    x.restore(&mut plant, &x0).unwrap();
    assert_eq!(plant.get(&Quantity::named("x")).unwrap(), 1.0);
    assert!((plant.sim_time() - 0.2).abs() < 1e-12);
}
