// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Load points: the load timeseries attached to buses, and the operations
//! that keep them consistent with a [`RadialNetwork`].
//!
//! Loads are implicitly in kW.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::{BusId, Error, RadialNetwork, Timeseries};

/// Load timeseries by bus id.  A bus has at most one load.
pub type LoadPoints<I> = BTreeMap<I, Timeseries>;

/// Adds a new bus carrying the given load to both the network and the load
/// points.  The bus is connected to `parent_id` as described in
/// [`RadialNetwork::add_node`].
///
/// Neither container is modified if the bus can't be added to the network.
pub fn add_load_to_net<I: BusId>(
    bus_id: I,
    load: Timeseries,
    parent_id: &I,
    loads: &mut LoadPoints<I>,
    network: &mut RadialNetwork<I>,
) -> Result<(), Error> {
    network.add_node(bus_id.clone(), parent_id)?;
    loads.insert(bus_id, load);
    Ok(())
}

/// Removes a bus from both the network and the load points, and returns its
/// load, if it had one.
pub fn remove_bus_from_net<I: BusId>(
    bus_id: &I,
    loads: &mut LoadPoints<I>,
    network: &mut RadialNetwork<I>,
) -> Result<Option<Timeseries>, Error> {
    network.remove_node(bus_id)?;
    Ok(loads.remove(bus_id))
}

/// Increases every value of the load at the given bus by `delta`.
pub fn increase_load<I: BusId>(
    bus_id: &I,
    delta: f64,
    loads: &mut LoadPoints<I>,
) -> Result<(), Error> {
    loads
        .get_mut(bus_id)
        .ok_or_else(|| Error::node_not_found(format!("No load found for bus {bus_id}.")))?
        .offset(delta);
    Ok(())
}

/// Returns the sorted union of the timestamps of all loads.
pub fn all_timestamps_present<I: BusId>(loads: &LoadPoints<I>) -> Vec<NaiveDateTime> {
    loads
        .values()
        .flat_map(|load| load.timestamps())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
