// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for modifying a [`RadialNetwork`] in place.

use num_complex::Complex64;

use crate::{Branch, Bus, BusId, Error, RadialNetwork};

/// Thermal rating of branches created by [`RadialNetwork::add_node`], in MVA.
const ADDED_BRANCH_RATE_MVA: f64 = 1000.0;

/// Bus and branch modification.
impl<I> RadialNetwork<I>
where
    I: BusId,
{
    /// Adds a load bus branching off `parent_id`.
    ///
    /// The new bus takes the parent's voltage level, and is connected to it by
    /// an in-service line with no impedance and a high thermal rating.
    pub fn add_node(&mut self, bus_id: I, parent_id: &I) -> Result<(), Error> {
        let base_kv = self.voltage_of(parent_id)?;
        if self.contains_bus(&bus_id) {
            return Err(Error::invalid_bus(format!(
                "Duplicate bus ID found: {bus_id}"
            )));
        }

        let index = self.graph.add_node(Bus::new(bus_id.clone(), base_kv));
        self.node_indices.insert(bus_id.clone(), index);
        self.insert_branch(
            Branch::line(parent_id.clone(), bus_id, Complex64::new(0.0, 0.0))
                .with_rate_mva(ADDED_BRANCH_RATE_MVA),
        )
    }

    /// Removes the bus and every branch connected to it, and returns the
    /// removed bus.
    pub fn remove_node(&mut self, bus_id: &I) -> Result<Bus<I>, Error> {
        let index = self.index_of(bus_id)?;
        self.node_indices.remove(bus_id);
        self.graph.remove_node(index).ok_or_else(|| {
            Error::internal(format!("Bus {bus_id} was indexed but missing from the graph."))
        })
    }

    /// Sets the voltage level of the given bus, in kV.
    pub fn set_voltage(&mut self, bus_id: &I, base_kv: f64) -> Result<(), Error> {
        let index = self.index_of(bus_id)?;
        self.graph[index].base_kv = base_kv;
        Ok(())
    }

    /// Sets the impedance of the branch between the two buses.
    pub fn set_branch_impedance(&mut self, a: &I, b: &I, impedance: Complex64) -> Result<(), Error> {
        let edge = self.edge_index_of(a, b)?;
        self.graph[edge].impedance = impedance;
        Ok(())
    }

    /// Sets the tap ratio of the branch between the two buses.
    pub fn set_branch_tap(&mut self, a: &I, b: &I, tap_ratio: f64) -> Result<(), Error> {
        let edge = self.edge_index_of(a, b)?;
        self.graph[edge].tap_ratio = tap_ratio;
        Ok(())
    }

    /// Replaces the transformer between the two buses with a line of
    /// equivalent impedance, `Z * tap²`, and returns the new impedance.
    ///
    /// The tap ratio is reset to `0`, marking the branch as a plain line.
    pub fn convert_transformer_to_equivalent_impedance(
        &mut self,
        a: &I,
        b: &I,
    ) -> Result<Complex64, Error> {
        let edge = self.edge_index_of(a, b)?;
        let branch = &mut self.graph[edge];
        if !branch.is_transformer() {
            return Err(Error::invalid_branch(format!(
                "Branch ({a}, {b}) is not a transformer."
            )));
        }

        branch.impedance *= branch.tap_ratio.powi(2);
        branch.tap_ratio = 0.0;
        Ok(branch.impedance)
    }
}
