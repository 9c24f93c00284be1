// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
Reduction of a multi-voltage-level radial to a single voltage level.

Every transformer of the radial that touches the target voltage level is
replaced by a line of equivalent impedance.  Transformers stepping down from
the target level have everything below them collapsed into their low
voltage bus, whose load is replaced by the aggregated load of the removed
buses.  A
transformer stepping up from the target level can only be folded when its
high voltage side is the reference bus.

Transformers that don't touch the target voltage level, or belong to a
different radial, are left untouched.
*/

use std::collections::HashSet;

use num_complex::Complex64;

use crate::aggregation::aggregate_given_loads;
use crate::elements::same_voltage;
use crate::loads::remove_bus_from_net;
use crate::{BusId, Error, LoadPoints, RadialNetwork, SimplificationConfig};

/// Simplifies the radial described by `config` to a single voltage level.
///
/// The given loads and network are not modified: the simplified copies are
/// returned instead.
///
/// Returns an error if a transformer steps up from the target voltage level
/// into anything but the reference bus.
pub fn simplify_net<I: BusId>(
    loads: &LoadPoints<I>,
    network: &RadialNetwork<I>,
    config: &SimplificationConfig<I>,
) -> Result<(LoadPoints<I>, RadialNetwork<I>), Error> {
    let target_kv = config.target_voltage_kv;
    let tree = network.find_prev_and_next(config.reference_bus.as_ref())?;
    let reference = tree.reference().clone();

    let transformers = network
        .transformer_bus_pairs()
        .into_iter()
        .filter(|(a, b)| tree.contains(a) && tree.contains(b))
        .collect::<Vec<_>>();
    tracing::info!(
        "Simplifying the radial of {reference} to {target_kv} kV, {} transformers to process.",
        transformers.len()
    );

    let mut loads = loads.clone();
    let mut network = network.clone();
    let mut removed = HashSet::new();

    for (a, b) in transformers {
        if removed.contains(&a) || removed.contains(&b) {
            continue;
        }

        let (inner, outer) = if same_voltage(network.voltage_of(&a)?, target_kv) {
            (a, b)
        } else if same_voltage(network.voltage_of(&b)?, target_kv) {
            (b, a)
        } else {
            tracing::debug!("Transformer ({a}, {b}) doesn't touch the {target_kv} kV level.");
            continue;
        };

        let outer_kv = network.voltage_of(&outer)?;
        if same_voltage(outer_kv, target_kv) {
            continue;
        }

        if outer_kv > target_kv {
            simplify_upstream_transformer(&mut network, &inner, &outer, &reference, target_kv)?;
        } else {
            removed.extend(simplify_downstream_transformer(
                &mut loads,
                &mut network,
                &inner,
                &outer,
                &reference,
                config,
            )?);
        }
    }

    Ok((loads, network))
}

/// Folds the reference bus down to the target voltage level.
fn simplify_upstream_transformer<I: BusId>(
    network: &mut RadialNetwork<I>,
    inner: &I,
    outer: &I,
    reference: &I,
    target_kv: f64,
) -> Result<(), Error> {
    if outer != reference {
        return Err(Error::unsupported_topology(format!(
            "Transformer ({outer}, {inner}) connects the {target_kv} kV level to a larger \
             network above it, which can't be simplified."
        )));
    }

    let impedance = network.convert_transformer_to_equivalent_impedance(outer, inner)?;
    network.set_voltage(outer, target_kv)?;

    tracing::info!(
        "Reference bus {outer} moved to {target_kv} kV, transformer ({outer}, {inner}) \
         replaced by a line of {impedance} ohm."
    );
    Ok(())
}

/// Collapses everything below `outer` into `outer`, and returns the ids of
/// the removed buses.
///
/// When the highest impedance line below `outer` is kept, its bus survives
/// with its own load, but the buses below it are still collapsed into
/// `outer`.
fn simplify_downstream_transformer<I: BusId>(
    loads: &mut LoadPoints<I>,
    network: &mut RadialNetwork<I>,
    inner: &I,
    outer: &I,
    reference: &I,
    config: &SimplificationConfig<I>,
) -> Result<Vec<I>, Error> {
    let target_kv = config.target_voltage_kv;
    network.set_voltage(outer, target_kv)?;

    let tree = network.find_prev_and_next(Some(reference))?;
    let mut to_collapse = tree.buses_below(outer);

    let mut highest: Option<(&I, Complex64)> = None;
    for child in tree.children(outer) {
        let z = network.impedance_of_branch(outer, child)?;
        if highest.map_or(true, |(_, h)| z.norm() > h.norm()) {
            highest = Some((child, z));
        }
    }

    let mut extra_impedance = Complex64::new(0.0, 0.0);
    match highest {
        Some((child, _)) if config.keep_highest_impedance_line => {
            to_collapse.retain(|id| id != child);
            network.set_voltage(child, target_kv)?;
            tracing::info!("Kept the line ({outer}, {child}), moving {child} to {target_kv} kV.");
        }
        Some((_, z)) => extra_impedance = z,
        None => {}
    }

    let impedance =
        network.convert_transformer_to_equivalent_impedance(inner, outer)? + extra_impedance;
    network.set_branch_impedance(inner, outer, impedance)?;

    let contributing = to_collapse
        .iter()
        .filter(|id| loads.contains_key(*id))
        .cloned()
        .collect::<Vec<_>>();
    let aggregate = aggregate_given_loads(&contributing, loads)?;

    for id in &to_collapse {
        remove_bus_from_net(id, loads, network)?;
    }
    // Without any load collapsed into it, `outer` keeps its own.
    if !contributing.is_empty() {
        loads.insert(outer.clone(), aggregate);
    }

    tracing::info!(
        "Bus {outer} moved to {target_kv} kV with {} buses collapsed into it, transformer \
         ({inner}, {outer}) replaced by a line of {impedance} ohm.",
        to_collapse.len()
    );

    Ok(to_collapse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::network::test_utils::{example_builder, NetworkBuilder};
    use crate::timeseries::test_utils::ts;
    use crate::{Branch, Bus};

    fn assert_close(a: Complex64, b: Complex64) {
        assert!((a - b).norm() < 1e-12, "{a} != {b}");
    }

    /// A 22 kV reference feeding an 11 kV bus `B`, with `C` and `D` below
    /// it, and `E` below `D`.
    fn step_down_builder() -> NetworkBuilder {
        NetworkBuilder::new()
            .reference("A", 22.0)
            .bus("B", 11.0)
            .bus("C", 11.0)
            .bus("D", 11.0)
            .bus("E", 11.0)
            .transformer("A", "B", 0.1, 0.1, 2.0)
            .line("B", "C", 1.0, 1.0)
            .line("B", "D", 2.0, 2.0)
            .line("D", "E", 0.5, 0.5)
            .load("B", &[(1, 100.0), (2, 100.0)])
            .load("C", &[(1, 1.0), (2, 2.0)])
            .load("D", &[(1, 10.0), (2, 10.0)])
            .load("E", &[(1, 3.0), (2, 4.0)])
    }

    #[test]
    fn test_simplify_example_network() -> Result<(), Error> {
        let (network, loads) = example_builder().build_with_loads()?;

        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(66.0))?;

        assert_eq!(simple_network.list_nodes(), vec!["B1", "B2", "B3", "B4"]);
        assert!(simple_network.buses().all(|b| b.base_kv == 66.0));
        assert!(simple_network.transformer_bus_pairs().is_empty());
        assert_eq!(simple_network.reference_bus(), Ok("B1"));

        // Z * tap² of (B2, B3), plus the line to its only child B5.
        assert_close(
            simple_network.impedance_of_branch(&"B2", &"B3")?,
            Complex64::new(1.1, 3.1),
        );
        assert_close(
            simple_network.impedance_of_branch(&"B2", &"B4")?,
            Complex64::new(0.9, 2.7),
        );
        assert_eq!(simple_network.branch(&"B2", &"B3")?.tap_ratio, 0.0);

        assert_eq!(
            simple_loads,
            LoadPoints::from([("B3", ts(&[(1, 8.0), (2, 10.0)]))])
        );

        Ok(())
    }

    #[test]
    fn test_simplification_conserves_load() -> Result<(), Error> {
        let (network, loads) = example_builder().build_with_loads()?;
        let removed = network.all_buses_below(&"B3", None)?;

        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(66.0))?;

        assert!(removed.iter().all(|id| !simple_network.contains_bus(id)));
        assert_eq!(
            simple_loads.get(&"B3"),
            Some(&aggregate_given_loads(&removed, &loads)?)
        );

        Ok(())
    }

    #[test]
    fn test_simplification_does_not_modify_input() -> Result<(), Error> {
        let (network, loads) = step_down_builder().build_with_loads()?;
        let buses = network.buses().cloned().collect::<Vec<Bus<&str>>>();
        let branches = network.branches().cloned().collect::<Vec<Branch<&str>>>();
        let original_loads = loads.clone();

        for keep in [false, true] {
            let config = SimplificationConfig::new(22.0).with_keep_highest_impedance_line(keep);
            simplify_net(&loads, &network, &config)?;

            assert_eq!(network.buses().cloned().collect::<Vec<_>>(), buses);
            assert_eq!(network.branches().cloned().collect::<Vec<_>>(), branches);
            assert_eq!(loads, original_loads);
        }

        Ok(())
    }

    #[test]
    fn test_aggregate_replaces_own_load() -> Result<(), Error> {
        let (network, loads) = step_down_builder().build_with_loads()?;

        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;

        assert_eq!(simple_network.list_nodes(), vec!["A", "B"]);
        assert_eq!(simple_network.voltage_of(&"B"), Ok(22.0));
        // Z * tap² plus the highest impedance line below B.
        assert_close(
            simple_network.impedance_of_branch(&"A", &"B")?,
            Complex64::new(2.4, 2.4),
        );
        assert_eq!(
            simple_loads,
            LoadPoints::from([("B", ts(&[(1, 14.0), (2, 16.0)]))])
        );

        Ok(())
    }

    #[test]
    fn test_collapsed_bus_carries_only_removed_load() -> Result<(), Error> {
        let (network, loads) = step_down_builder().build_with_loads()?;
        let removed = network.all_buses_below(&"B", None)?;

        let (simple_loads, _) = simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;
        assert_eq!(
            simple_loads.get(&"B"),
            Some(&aggregate_given_loads(&removed, &loads)?)
        );

        let (network, loads) = NetworkBuilder::new()
            .reference("A", 22.0)
            .bus("B", 11.0)
            .bus("C", 11.0)
            .transformer("A", "B", 0.1, 0.1, 2.0)
            .line("B", "C", 1.0, 1.0)
            .load("B", &[(1, 100.0)])
            .load("C", &[(1, 1.0)])
            .build_with_loads()?;
        let (simple_loads, _) = simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;
        assert_eq!(simple_loads, LoadPoints::from([("B", ts(&[(1, 1.0)]))]));

        // Without any load below it, B keeps its own.
        let (network, loads) = NetworkBuilder::new()
            .reference("A", 22.0)
            .bus("B", 11.0)
            .bus("C", 11.0)
            .transformer("A", "B", 0.1, 0.1, 2.0)
            .line("B", "C", 1.0, 1.0)
            .load("B", &[(1, 100.0)])
            .build_with_loads()?;
        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;
        assert_eq!(simple_network.list_nodes(), vec!["A", "B"]);
        assert_eq!(simple_loads, loads);

        Ok(())
    }

    #[test]
    fn test_keep_highest_impedance_line() -> Result<(), Error> {
        let (network, loads) = step_down_builder().build_with_loads()?;

        let config = SimplificationConfig::new(22.0).with_keep_highest_impedance_line(true);
        let (simple_loads, simple_network) = simplify_net(&loads, &network, &config)?;

        assert_eq!(simple_network.list_nodes(), vec!["A", "B", "D"]);
        assert_eq!(simple_network.voltage_of(&"D"), Ok(22.0));
        assert_close(
            simple_network.impedance_of_branch(&"A", &"B")?,
            Complex64::new(0.4, 0.4),
        );
        assert_eq!(
            simple_network.impedance_of_branch(&"B", &"D"),
            Ok(Complex64::new(2.0, 2.0))
        );
        // D keeps its own load, while E below it is collapsed into B.
        assert!(!simple_network.contains_bus(&"E"));
        assert_eq!(
            simple_loads,
            LoadPoints::from([
                ("B", ts(&[(1, 4.0), (2, 6.0)])),
                ("D", ts(&[(1, 10.0), (2, 10.0)])),
            ])
        );

        Ok(())
    }

    #[test]
    fn test_fold_reference_bus() -> Result<(), Error> {
        let (network, loads) = NetworkBuilder::new()
            .reference("A", 66.0)
            .bus("B", 22.0)
            .bus("C", 22.0)
            .bus("D", 11.0)
            .bus("E", 11.0)
            .transformer("A", "B", 0.1, 0.2, 3.0)
            .line("B", "C", 1.0, 1.0)
            .transformer("C", "D", 0.1, 0.1, 2.0)
            .line("D", "E", 1.0, 1.0)
            .load("E", &[(1, 7.0)])
            .build_with_loads()?;

        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;

        assert_eq!(simple_network.list_nodes(), vec!["A", "B", "C", "D"]);
        assert!(simple_network.buses().all(|b| b.base_kv == 22.0));
        assert_eq!(simple_network.reference_bus(), Ok("A"));
        assert_close(
            simple_network.impedance_of_branch(&"A", &"B")?,
            Complex64::new(0.9, 1.8),
        );
        assert_eq!(simple_loads, LoadPoints::from([("D", ts(&[(1, 7.0)]))]));

        Ok(())
    }

    #[test]
    fn test_step_up_into_larger_network() -> Result<(), Error> {
        let (network, loads) = example_builder().build_with_loads()?;

        assert!(
            simplify_net(&loads, &network, &SimplificationConfig::new(22.0))
                .is_err_and(|e| e.kind() == ErrorKind::UnsupportedTopology)
        );

        Ok(())
    }

    #[test]
    fn test_other_radials_are_untouched() -> Result<(), Error> {
        let (network, loads) = NetworkBuilder::new()
            .reference("A", 22.0)
            .bus("B", 11.0)
            .bus("C", 66.0)
            .bus("D", 22.0)
            .bus("E", 11.0)
            .transformer("A", "B", 0.1, 0.1, 2.0)
            .transformer("C", "D", 0.1, 0.1, 3.0)
            .transformer("D", "E", 0.1, 0.1, 2.0)
            .load("E", &[(1, 1.0)])
            .build_with_loads()?;

        let (simple_loads, simple_network) =
            simplify_net(&loads, &network, &SimplificationConfig::new(22.0))?;

        assert_eq!(simple_network.voltage_of(&"B"), Ok(22.0));
        assert_eq!(simple_network.voltage_of(&"C"), Ok(66.0));
        assert_eq!(simple_network.voltage_of(&"E"), Ok(11.0));
        assert_eq!(
            simple_network.transformer_bus_pairs(),
            vec![("C", "D"), ("D", "E")]
        );
        assert_eq!(simple_loads, loads);

        // With C as the reference, its radial is simplified instead.
        let config = SimplificationConfig::new(22.0).with_reference_bus("C");
        let (simple_loads, simple_network) = simplify_net(&loads, &network, &config)?;
        assert_eq!(simple_network.list_nodes(), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(simple_network.transformer_bus_pairs(), vec![("A", "B")]);
        assert_eq!(simple_network.voltage_of(&"C"), Ok(22.0));
        assert_eq!(simple_network.voltage_of(&"E"), Ok(22.0));
        assert_eq!(simple_loads, loads);

        Ok(())
    }
}
