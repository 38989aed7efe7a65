use std::sync::Arc;

use proptest::prelude::*;

use lazycalc::{
    Array, DateUnit, InMemoryVariableRegistry, Period, Simulation, Value, ValueType,
    VariableRegistry, VariableSpec,
};

fn link(index: usize) -> String {
    format!("link_{index}")
}

/// link_0 is an input; link_k = link_{k-1} + k.
fn chain_registry(len: usize) -> Arc<InMemoryVariableRegistry> {
    let registry = InMemoryVariableRegistry::new();
    registry
        .register(
            VariableSpec::builder(link(0))
                .value_type(ValueType::Int)
                .entity("person")
                .definition_period(DateUnit::Month)
                .build()
                .unwrap(),
        )
        .unwrap();
    for k in 1..len {
        let previous = link(k - 1);
        let step = i64::try_from(k).unwrap();
        registry
            .register(
                VariableSpec::builder(link(k))
                    .value_type(ValueType::Int)
                    .entity("person")
                    .definition_period(DateUnit::Month)
                    .formula(move |pop, period| {
                        Ok(pop.calculate(&previous, period)?.add_scalar(Value::Int(step))?)
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }
    Arc::new(registry)
}

/// Monthly accumulator: acc(t) = acc(t-1) + 1 until January, where it is 1.
fn accumulator_registry() -> Arc<InMemoryVariableRegistry> {
    let acc = VariableSpec::builder("acc")
        .value_type(ValueType::Int)
        .entity("person")
        .definition_period(DateUnit::Month)
        .formula(|pop, period| {
            if period.start().month() == 1 {
                Ok(pop.filled(1_i64))
            } else {
                Ok(pop.calculate("acc", &period.last_month()?)?.add_scalar(Value::Int(1))?)
            }
        })
        .build()
        .unwrap();
    Arc::new(InMemoryVariableRegistry::with_variables(vec![acc]).unwrap())
}

fn simulation(registry: Arc<InMemoryVariableRegistry>, size: usize, loops: usize) -> Simulation {
    Simulation::builder(registry)
        .population("person", size)
        .max_spiral_loops(loops)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn chain_results_do_not_depend_on_request_order(
        len in 2usize..12,
        size in 1usize..5,
        seed in proptest::collection::vec(any::<usize>(), 1..8),
    ) {
        let registry = chain_registry(len);
        let period: Period = "2013-01".parse().unwrap();

        let mut shuffled = simulation(Arc::clone(&registry), size, 1);
        for pick in &seed {
            let name = link(pick % len);
            shuffled.calculate(&name, &period).unwrap();
            prop_assert!(shuffled.tracker().is_empty());
        }

        let mut top_first = simulation(registry, size, 1);
        top_first.calculate(&link(len - 1), &period).unwrap();

        for k in 0..len {
            let expected = i64::try_from(k * (k + 1) / 2).unwrap();
            let direct = shuffled.calculate(&link(k), &period).unwrap();
            prop_assert_eq!(&direct, &Array::filled(Value::Int(expected), size));
            prop_assert_eq!(top_first.peek(&link(k), &period), Some(&direct));
        }
    }

    #[test]
    fn self_reference_is_bounded_by_spiral_loops(month in 1u32..=12, loops in 1usize..14) {
        let registry = accumulator_registry();
        let period = Period::month(2013, month).unwrap();
        let mut sim = simulation(registry, 1, loops);

        let value = sim.calculate("acc", &period).unwrap();
        prop_assert!(sim.tracker().is_empty());

        let months_back = month as usize - 1;
        let expected = if months_back < loops {
            i64::from(month)
        } else {
            // The request `loops` months back is short-circuited to 0.
            i64::try_from(loops).unwrap()
        };
        prop_assert_eq!(value, Array::from(vec![expected]));
    }
}
