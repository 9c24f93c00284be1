// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving buses and branches from a [`RadialNetwork`].

use num_complex::Complex64;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::iterators::{Branches, Buses, Neighbors};
use crate::{Branch, Bus, BusId, Error, RadialNetwork};

/// `Bus` and `Branch` retrieval.
impl<I> RadialNetwork<I>
where
    I: BusId,
{
    pub(crate) fn index_of(&self, bus_id: &I) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(bus_id)
            .copied()
            .ok_or_else(|| Error::node_not_found(format!("Bus with id {bus_id} not found.")))
    }

    pub(crate) fn edge_index_of(&self, a: &I, b: &I) -> Result<EdgeIndex, Error> {
        let not_found = || Error::edge_not_found(format!("Branch ({a}, {b}) not found."));
        let (Some(&a_idx), Some(&b_idx)) = (self.node_indices.get(a), self.node_indices.get(b))
        else {
            return Err(not_found());
        };
        self.graph.find_edge(a_idx, b_idx).ok_or_else(not_found)
    }

    /// Returns the bus with the given `bus_id`, if it exists.
    pub fn bus(&self, bus_id: &I) -> Result<&Bus<I>, Error> {
        self.index_of(bus_id).map(|i| &self.graph[i])
    }

    /// Returns true if a bus with the given `bus_id` exists.
    pub fn contains_bus(&self, bus_id: &I) -> bool {
        self.node_indices.contains_key(bus_id)
    }

    /// Returns an iterator over the buses in the network.
    pub fn buses(&self) -> Buses<'_, I> {
        Buses {
            graph: &self.graph,
            iter: self.graph.node_indices(),
        }
    }

    /// Returns the ids of all buses in the network.
    pub fn list_nodes(&self) -> Vec<I> {
        self.buses().map(|b| b.id.clone()).collect()
    }

    /// Returns an iterator over the branches in the network, including those
    /// that are out of service.
    pub fn branches(&self) -> Branches<'_, I> {
        Branches {
            graph: &self.graph,
            iter: self.graph.edge_indices(),
        }
    }

    /// Returns an iterator over the buses joined to the given bus by an
    /// in-service branch, regardless of the branch's direction.
    ///
    /// Neighbors are ordered by the index of the branch joining them.  A
    /// branch added after another was removed can take over its index, so
    /// this is not always the order in which the branches were added.
    ///
    /// Returns an error if the given `bus_id` does not exist.
    pub fn neighbors(&self, bus_id: &I) -> Result<Neighbors<'_, I>, Error> {
        let index = self.index_of(bus_id)?;
        let mut edges = self
            .graph
            .edges(index)
            .filter(|e| e.weight().in_service)
            .map(|e| {
                let other = if e.source() == index {
                    e.target()
                } else {
                    e.source()
                };
                (e.id(), other)
            })
            .collect::<Vec<_>>();
        edges.sort_by_key(|(edge, _)| *edge);

        Ok(Neighbors {
            graph: &self.graph,
            iter: edges
                .into_iter()
                .map(|(_, other)| other)
                .collect::<Vec<_>>()
                .into_iter(),
        })
    }

    /// Returns the voltage level of the given bus, in kV.
    pub fn voltage_of(&self, bus_id: &I) -> Result<f64, Error> {
        self.bus(bus_id).map(|b| b.base_kv)
    }

    /// Returns true if the given bus is a reference bus.
    pub fn is_reference_bus(&self, bus_id: &I) -> Result<bool, Error> {
        self.bus(bus_id).map(|b| b.is_reference())
    }

    /// Returns the id of the reference bus.
    ///
    /// Returns an error if there isn't exactly one reference bus.
    pub fn reference_bus(&self) -> Result<I, Error> {
        let mut references = self
            .buses()
            .filter(|b| b.is_reference())
            .map(|b| b.id.clone())
            .collect::<Vec<_>>();

        match references.len() {
            0 => Err(Error::invariant_violation("No reference bus found.")),
            1 => Ok(references.remove(0)),
            _ => {
                references.sort();
                Err(Error::invariant_violation(format!(
                    "Multiple reference buses found: {}",
                    references
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        }
    }

    /// Resolves an optional reference bus to the network's reference bus.
    pub(crate) fn resolve_reference(&self, reference: Option<&I>) -> Result<I, Error> {
        match reference {
            Some(reference) => {
                self.index_of(reference)?;
                Ok(reference.clone())
            }
            None => self.reference_bus(),
        }
    }

    /// Returns the branch between the two buses, in either direction.
    pub fn branch(&self, a: &I, b: &I) -> Result<&Branch<I>, Error> {
        self.edge_index_of(a, b).map(|e| &self.graph[e])
    }

    /// Returns the impedance of the branch between the two buses.
    pub fn impedance_of_branch(&self, a: &I, b: &I) -> Result<Complex64, Error> {
        self.branch(a, b).map(|br| br.impedance)
    }

    /// Returns true if the branch between the two buses is a transformer.
    pub fn is_transformer_branch(&self, a: &I, b: &I) -> Result<bool, Error> {
        self.branch(a, b).map(|br| br.is_transformer())
    }

    /// Returns the endpoints of every transformer branch in the network, in
    /// the order the branches were added.
    pub fn transformer_bus_pairs(&self) -> Vec<(I, I)> {
        self.branches()
            .filter(|br| br.is_transformer())
            .map(|br| (br.from_bus.clone(), br.to_bus.clone()))
            .collect()
    }
}
