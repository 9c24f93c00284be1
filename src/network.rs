// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of a radially operated distribution network: the
//! buses, the branches between them and the reference bus that feeds them.

mod creation;
mod modification;
mod retrieval;
mod traversal;
mod validation;

pub mod iterators;

#[cfg(test)]
pub(crate) mod test_utils;

pub use traversal::RadialTree;

use crate::{Branch, Bus, BusId, NetworkConfig};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use std::collections::HashMap;

/// Buses stored in the graph can be addressed with `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any bus id, so
/// that buses in the graph can be retrieved from their ids.
pub(crate) type NodeIndexMap<I> = HashMap<I, NodeIndex>;

/// A graph representation of a distribution network.
///
/// The graph is undirected.  Which end of a branch is "upstream" is not
/// stored, and is derived on demand by traversing from a reference bus
/// towards buses of equal or lower voltage.  See [`RadialTree`].
#[derive(Clone, Debug)]
pub struct RadialNetwork<I>
where
    I: BusId,
{
    graph: StableUnGraph<Bus<I>, Branch<I>>,
    node_indices: NodeIndexMap<I>,
    config: NetworkConfig,
}
