// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Aggregation of load timeseries over the buses downstream of a bus.

use std::collections::BTreeMap;

use crate::{BusId, Error, LoadPoints, RadialNetwork, RadialTree, Timeseries};

/// Returns the sum of the loads of the given buses, without taking the
/// network structure into account.
///
/// The result uses the timestamps of the longest of the given loads.  Buses
/// without a load are skipped with a warning, and an empty timeseries is
/// returned if none of the buses have a load.
pub fn aggregate_given_loads<I: BusId>(
    bus_ids: &[I],
    loads: &LoadPoints<I>,
) -> Result<Timeseries, Error> {
    let mut present = Vec::with_capacity(bus_ids.len());
    for id in bus_ids {
        match loads.get(id) {
            Some(load) => present.push(load),
            None => tracing::warn!("No load found for bus {id}, skipping it in the aggregate."),
        }
    }

    let Some(longest) = present
        .iter()
        .copied()
        .reduce(|longest, load| if load.len() > longest.len() { load } else { longest })
    else {
        return Ok(Timeseries::new());
    };

    present
        .iter()
        .try_fold(Timeseries::zeros_like(longest), |aggregate, load| {
            aggregate.add(load)
        })
}

/// Returns the aggregated load of all buses downstream of the given bus.
///
/// The bus's own load is not included: the aggregate is the load flowing
/// through the bus.  The ids of the contributing buses are logged.
pub fn aggregate_load_of_node<I: BusId>(
    bus_id: &I,
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
) -> Result<Timeseries, Error> {
    let mut contributing = network.all_loads_below(bus_id, loads, reference)?;
    let aggregate = aggregate_given_loads(&contributing, loads)?;

    contributing.sort();
    tracing::info!(
        "Buses contributing to the aggregate at {bus_id}: [{}]",
        contributing
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(aggregate)
}

/// Returns the aggregated load of the given bus together with every bus
/// downstream of it.
pub(crate) fn aggregate_load_through<I: BusId>(
    tree: &RadialTree<I>,
    bus_id: &I,
    loads: &LoadPoints<I>,
) -> Result<Timeseries, Error> {
    let ids = std::iter::once(bus_id.clone())
        .chain(tree.buses_below(bus_id))
        .filter(|id| loads.contains_key(id))
        .collect::<Vec<_>>();
    aggregate_given_loads(&ids, loads)
}

/// Returns, for each direct child of the given bus, the child's share of the
/// peak of the bus's aggregated load.
///
/// A child's share is the load flowing through it at the time of the
/// aggregate's peak, divided by that peak.  Children with no load downstream
/// are left out.
pub fn coincidence_factors<I: BusId>(
    bus_id: &I,
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
) -> Result<BTreeMap<I, f64>, Error> {
    child_factors(bus_id, loads, network, reference, |_, aggregate_peak| aggregate_peak)
}

/// Returns, for each direct child of the given bus, the load flowing through
/// the child at the time of the bus's aggregated peak, divided by the
/// child's own peak.
///
/// Children with no load downstream are left out.
pub fn aggregation_factors<I: BusId>(
    bus_id: &I,
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
) -> Result<BTreeMap<I, f64>, Error> {
    child_factors(bus_id, loads, network, reference, |child_peak, _| child_peak)
}

fn child_factors<I: BusId>(
    bus_id: &I,
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    reference: Option<&I>,
    denominator: impl Fn(f64, f64) -> f64,
) -> Result<BTreeMap<I, f64>, Error> {
    let aggregate = aggregate_load_of_node(bus_id, loads, network, reference)?;
    let Some((peak_index, aggregate_peak)) = aggregate.max() else {
        return Ok(BTreeMap::new());
    };
    let peak_time = aggregate.samples()[peak_index].timestamp;

    let tree = network.find_prev_and_next(reference)?;
    let mut factors = BTreeMap::new();
    for child in tree.children(bus_id) {
        let flow = aggregate_load_through(&tree, child, loads)?;
        let Some((_, child_peak)) = flow.max() else {
            continue;
        };
        let at_peak = flow.value_at(peak_time).unwrap_or(0.0);
        factors.insert(child.clone(), at_peak / denominator(child_peak, aggregate_peak));
    }

    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::network::test_utils::example_builder;
    use crate::timeseries::test_utils::ts;

    #[test]
    fn test_aggregate_given_loads() -> Result<(), Error> {
        let (_, mut loads) = example_builder().build_with_loads()?;

        assert_eq!(aggregate_given_loads(&[], &loads), Ok(Timeseries::new()));
        assert_eq!(
            aggregate_given_loads(&["B7", "B8"], &loads),
            Ok(ts(&[(1, 8.0), (2, 10.0)]))
        );
        // Buses without a load are skipped.
        assert_eq!(
            aggregate_given_loads(&["B7", "B4"], &loads),
            Ok(ts(&[(1, 5.0), (2, 6.0)]))
        );
        assert_eq!(aggregate_given_loads(&["B4"], &loads), Ok(Timeseries::new()));

        // The longest load defines the timestamps.
        loads.insert("B5", ts(&[(0, 1.0), (1, 1.0), (2, 1.0)]));
        assert_eq!(
            aggregate_given_loads(&["B7", "B5", "B8"], &loads),
            Ok(ts(&[(0, 1.0), (1, 9.0), (2, 11.0)]))
        );

        // A load ending early only adds to the samples it covers.
        let mut early = loads.clone();
        early.insert("B8", ts(&[(1, 3.0)]));
        assert_eq!(
            aggregate_given_loads(&["B7", "B8"], &early),
            Ok(ts(&[(1, 8.0), (2, 6.0)]))
        );

        loads.insert("B4", ts(&[(5, 1.0)]));
        assert!(aggregate_given_loads(&["B7", "B4"], &loads)
            .is_err_and(|e| e.kind() == ErrorKind::TimeseriesMismatch));

        Ok(())
    }

    #[test]
    fn test_aggregate_load_of_node() -> Result<(), Error> {
        let (network, mut loads) = example_builder().build_with_loads()?;

        let expected = ts(&[(1, 8.0), (2, 10.0)]);
        assert_eq!(aggregate_load_of_node(&"B3", &loads, &network, None), Ok(expected.clone()));
        assert_eq!(aggregate_load_of_node(&"B1", &loads, &network, None), Ok(expected.clone()));

        // The bus's own load is not part of its aggregate.
        loads.insert("B5", ts(&[(1, 100.0), (2, 100.0)]));
        assert_eq!(aggregate_load_of_node(&"B5", &loads, &network, None), Ok(expected));

        assert_eq!(
            aggregate_load_of_node(&"B7", &loads, &network, None),
            Ok(Timeseries::new())
        );
        assert_eq!(
            aggregate_load_of_node(&"B9", &loads, &network, None),
            Err(Error::node_not_found("Bus with id B9 not found."))
        );

        Ok(())
    }

    #[test]
    fn test_aggregate_load_through() -> Result<(), Error> {
        let (network, mut loads) = example_builder().build_with_loads()?;
        loads.insert("B5", ts(&[(1, 100.0), (2, 100.0)]));
        let tree = network.find_prev_and_next(None)?;

        assert_eq!(
            aggregate_load_through(&tree, &"B5", &loads),
            Ok(ts(&[(1, 108.0), (2, 110.0)]))
        );
        assert_eq!(
            aggregate_load_through(&tree, &"B8", &loads),
            Ok(ts(&[(1, 3.0), (2, 4.0)]))
        );
        assert_eq!(aggregate_load_through(&tree, &"B4", &loads), Ok(Timeseries::new()));

        Ok(())
    }

    #[test]
    fn test_coincidence_and_aggregation_factors() -> Result<(), Error> {
        let (network, loads) = example_builder()
            .load("B8", &[(1, 8.0), (2, 4.0)])
            .build_with_loads()?;

        // The aggregate at B5 is [13, 10], peaking at the first timestamp.
        let factors = coincidence_factors(&"B5", &loads, &network, None)?;
        assert_eq!(factors, BTreeMap::from([("B7", 5.0 / 13.0), ("B8", 8.0 / 13.0)]));
        assert!((factors.values().sum::<f64>() - 1.0).abs() < 1e-12);

        assert_eq!(
            aggregation_factors(&"B5", &loads, &network, None)?,
            BTreeMap::from([("B7", 5.0 / 6.0), ("B8", 1.0)])
        );

        // B4 carries no load, so only B3 is reported.
        assert_eq!(
            coincidence_factors(&"B2", &loads, &network, None)?,
            BTreeMap::from([("B3", 1.0)])
        );

        assert!(coincidence_factors(&"B7", &loads, &network, None)?.is_empty());

        Ok(())
    }
}
