use std::sync::Arc;

use lazycalc::{
    Array, CalcError, DateUnit, ExecutionError, InMemoryVariableRegistry, Obligation, Outcome,
    Period, Simulation, Value, ValueType, VariableBuilder, VariableSpec,
};

fn reference_period() -> Period {
    "2013-01".parse().unwrap()
}

fn monthly_int(name: &str) -> VariableBuilder {
    VariableSpec::builder(name)
        .value_type(ValueType::Int)
        .entity("person")
        .definition_period(DateUnit::Month)
}

/// A(t) = B(t), B(t) = A(t).
fn pure_cycle_variables() -> Vec<VariableSpec> {
    vec![
        monthly_int("variable1")
            .formula(|pop, period| pop.calculate("variable2", period))
            .build()
            .unwrap(),
        monthly_int("variable2")
            .formula(|pop, period| pop.calculate("variable1", period))
            .build()
            .unwrap(),
    ]
}

/// C(t) = D(t-1), D(t) = C(t).
fn spiral_variables() -> Vec<VariableSpec> {
    vec![
        monthly_int("variable3")
            .formula(|pop, period| pop.calculate("variable4", &period.last_month()?))
            .build()
            .unwrap(),
        monthly_int("variable4")
            .formula(|pop, period| pop.calculate("variable3", period))
            .build()
            .unwrap(),
    ]
}

/// E(t) = 5 + F(t-1), F(t) = 6 + E(t), and a bystander reading E.
fn offset_spiral_variables() -> Vec<VariableSpec> {
    vec![
        monthly_int("variable5")
            .formula(|pop, period| {
                Ok(pop
                    .calculate("variable6", &period.last_month()?)?
                    .add_scalar(Value::Int(5))?)
            })
            .build()
            .unwrap(),
        monthly_int("variable6")
            .formula(|pop, period| Ok(pop.calculate("variable5", period)?.add_scalar(Value::Int(6))?))
            .build()
            .unwrap(),
        monthly_int("variable7")
            .formula(|pop, period| Ok(pop.calculate("variable5", period)?.add_scalar(Value::Int(7))?))
            .build()
            .unwrap(),
    ]
}

/// G(t) = 2 * G(t-1) in December, 1 otherwise.
fn cotisation() -> VariableSpec {
    monthly_int("cotisation")
        .formula(|pop, period| {
            if period.start().month() == 12 {
                Ok(pop.calculate("cotisation", &period.last_month()?)?.mul_scalar(Value::Int(2))?)
            } else {
                Ok(pop.filled(1_i64))
            }
        })
        .build()
        .unwrap()
}

fn simulation_with(specs: Vec<VariableSpec>) -> Simulation {
    let registry = Arc::new(InMemoryVariableRegistry::with_variables(specs).unwrap());
    Simulation::builder(registry)
        .population("person", 1)
        .trace(true)
        .build()
        .unwrap()
}

#[test]
fn pure_cycle_raises() {
    let mut simulation = simulation_with(pure_cycle_variables());
    let period = reference_period();

    let err = simulation.calculate("variable1", &period).unwrap_err();
    let CalcError::Execution(ExecutionError::Cycle { variable, chain, .. }) = &err else {
        panic!("expected a cycle error, got {err:?}");
    };
    assert_eq!(variable, "variable1");
    assert_eq!(
        chain,
        &[
            Obligation::new("variable1", period.clone()),
            Obligation::new("variable2", period.clone()),
        ]
    );
    assert_eq!(
        err.to_string(),
        "Execution error: Circular definition detected on variable1@2013-01 \
         (chain: variable1@2013-01 -> variable2@2013-01)"
    );

    assert!(simulation.tracker().is_empty());
    assert!(simulation.calculate("variable2", &period).unwrap_err().is_cycle());
    assert!(simulation.tracker().is_empty());
}

#[test]
fn spiral_with_offset_returns_default() {
    let mut simulation = simulation_with(spiral_variables());
    let period = reference_period();

    assert_eq!(
        simulation.calculate("variable3", &period).unwrap(),
        Array::from(vec![0_i64])
    );
    assert!(simulation.tracker().is_empty());
    assert_eq!(
        simulation.calculate("variable4", &period).unwrap(),
        Array::from(vec![0_i64])
    );
}

#[test]
fn offset_spiral_converges() {
    let mut simulation = simulation_with(offset_spiral_variables());
    let period = reference_period();

    assert_eq!(
        simulation.calculate("variable5", &period).unwrap(),
        Array::from(vec![11_i64])
    );
    assert_eq!(
        simulation.calculate("variable6", &period).unwrap(),
        Array::from(vec![11_i64])
    );
    assert_eq!(
        simulation.calculate("variable6", &period.last_month().unwrap()).unwrap(),
        Array::from(vec![11_i64])
    );
    assert!(simulation.tracker().is_empty());
}

#[test]
fn results_outside_the_spiral_stay_cached() {
    let mut simulation = simulation_with(offset_spiral_variables());
    let period = reference_period();

    assert_eq!(
        simulation.calculate("variable7", &period).unwrap(),
        Array::from(vec![18_i64])
    );
    assert_eq!(
        simulation.peek("variable7", &period),
        Some(&Array::from(vec![18_i64]))
    );
    // variable5 and variable6 read a short-circuited default on that chain.
    assert!(simulation.peek("variable5", &period).is_none());
    assert!(simulation.peek("variable6", &period.last_month().unwrap()).is_none());
}

#[test]
fn self_reference_in_december_short_circuits() {
    let mut simulation = simulation_with(vec![cotisation()]);
    let december = reference_period().last_month().unwrap();
    assert_eq!(december.to_string(), "2012-12");

    assert_eq!(
        simulation.calculate("cotisation", &december).unwrap(),
        Array::from(vec![0_i64])
    );

    let outcomes: Vec<Outcome> = simulation.trace().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Spiral, Outcome::Computed]);
    assert!(simulation.peek("cotisation", &december.last_month().unwrap()).is_none());
}

#[test]
fn spiral_shorted_period_recomputes_standalone() {
    let mut simulation = simulation_with(vec![cotisation()]);
    let december = reference_period().last_month().unwrap();
    let november = december.last_month().unwrap();

    simulation.calculate("cotisation", &december).unwrap();
    assert_eq!(
        simulation.calculate("cotisation", &november).unwrap(),
        Array::from(vec![1_i64])
    );
    assert_eq!(
        simulation.peek("cotisation", &november),
        Some(&Array::from(vec![1_i64]))
    );
}

#[test]
fn cycle_does_not_poison_later_requests() {
    let mut specs = pure_cycle_variables();
    specs.push(monthly_int("standalone").formula(|_, _| Ok(3_i64)).build().unwrap());
    let mut simulation = simulation_with(specs);
    let period = reference_period();

    assert!(simulation.calculate("variable1", &period).is_err());
    assert_eq!(
        simulation.calculate("standalone", &period).unwrap(),
        Array::from(vec![3_i64])
    );
}
