// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the radial traversal of a [`RadialNetwork`], and the
//! queries built on top of it.

use std::collections::{HashMap, HashSet, VecDeque};

use num_complex::Complex64;

use crate::elements::VOLTAGE_TOLERANCE_KV;
use crate::{BusId, Error, LoadPoints, RadialNetwork};

/**
The directed view of one radial, discovered from its reference bus.

Starting at the reference bus, the network is searched breadth-first, only
ever stepping to buses of equal or lower voltage than the bus being
expanded.  Buses that can only be reached by stepping up in voltage belong
to a different radial, and are absent from the tree.

`prev` maps every bus in the radial to its parent (`None` for the reference
bus).  `next` is its inverse, and only has entries for buses with at least
one child.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct RadialTree<I>
where
    I: BusId,
{
    reference: I,
    prev: HashMap<I, Option<I>>,
    next: HashMap<I, Vec<I>>,
}

impl<I> RadialTree<I>
where
    I: BusId,
{
    /// Returns the reference bus the tree was discovered from.
    pub fn reference(&self) -> &I {
        &self.reference
    }

    /// Returns the parent of every bus in the radial.
    pub fn prev(&self) -> &HashMap<I, Option<I>> {
        &self.prev
    }

    /// Returns the children of every bus in the radial that has any.
    pub fn next(&self) -> &HashMap<I, Vec<I>> {
        &self.next
    }

    /// Returns true if the bus is part of the radial.
    pub fn contains(&self, bus_id: &I) -> bool {
        self.prev.contains_key(bus_id)
    }

    /// Returns the parent of the given bus, or `None` for the reference bus.
    ///
    /// Returns an error if the bus is not part of the radial.
    pub fn parent(&self, bus_id: &I) -> Result<Option<&I>, Error> {
        self.prev.get(bus_id).map(Option::as_ref).ok_or_else(|| {
            Error::path_not_found(format!(
                "No path from reference bus {} to bus {bus_id}.",
                self.reference
            ))
        })
    }

    /// Returns the children of the given bus, in discovery order.
    pub fn children(&self, bus_id: &I) -> &[I] {
        self.next.get(bus_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns all buses downstream of `bus_id`, depth first, not including
    /// `bus_id` itself.
    pub fn buses_below(&self, bus_id: &I) -> Vec<I> {
        let mut below = Vec::new();
        let mut stack: Vec<&I> = self.children(bus_id).iter().rev().collect();

        while let Some(id) = stack.pop() {
            below.push(id.clone());
            stack.extend(self.children(id).iter().rev());
        }

        below
    }

    /// Returns the buses downstream of `bus_id` that have no children.
    pub fn leaf_nodes_below(&self, bus_id: &I) -> Vec<I> {
        self.buses_below(bus_id)
            .into_iter()
            .filter(|id| !self.next.contains_key(id))
            .collect()
    }

    /// Returns the path from `from` up to its ancestor `to`, including both.
    ///
    /// Returns an error if `to` is not a strict ancestor of `from`.
    pub fn path_to_node(&self, from: &I, to: &I) -> Result<Vec<I>, Error> {
        let mut path = vec![from.clone()];
        let mut current = self.parent(from)?;

        while let Some(id) = current {
            path.push(id.clone());
            if id == to {
                return Ok(path);
            }
            current = self.parent(id)?;
        }

        Err(Error::path_not_found(format!(
            "Bus {to} is not upstream of bus {from}."
        )))
    }

    /// Returns one path per leaf below `from`, each ordered from `from` down
    /// to the leaf.
    pub fn all_paths_from_node(&self, from: &I) -> Result<Vec<Vec<I>>, Error> {
        self.leaf_nodes_below(from)
            .iter()
            .map(|leaf| {
                let mut path = self.path_to_node(leaf, from)?;
                path.reverse();
                Ok(path)
            })
            .collect()
    }
}

/// Traversal methods.
impl<I> RadialNetwork<I>
where
    I: BusId,
{
    /// Discovers the radial fed by the given reference bus, or by the
    /// network's reference bus if `None`.
    pub fn find_prev_and_next(&self, reference: Option<&I>) -> Result<RadialTree<I>, Error> {
        let reference = self.resolve_reference(reference)?;

        let mut prev = HashMap::from([(reference.clone(), None)]);
        let mut next: HashMap<I, Vec<I>> = HashMap::new();
        let mut queue = VecDeque::from([reference.clone()]);

        while let Some(current) = queue.pop_front() {
            let current_kv = self.voltage_of(&current)?;
            for neighbor in self.neighbors(&current)? {
                if prev.contains_key(&neighbor.id)
                    || neighbor.base_kv > current_kv + VOLTAGE_TOLERANCE_KV
                {
                    continue;
                }
                prev.insert(neighbor.id.clone(), Some(current.clone()));
                next.entry(current.clone())
                    .or_default()
                    .push(neighbor.id.clone());
                queue.push_back(neighbor.id.clone());
            }
        }

        tracing::debug!(
            "Radial of reference bus {reference} spans {} of {} buses.",
            prev.len(),
            self.node_indices.len()
        );

        Ok(RadialTree {
            reference,
            prev,
            next,
        })
    }

    /// Returns the parent of the given bus, or `None` if it is the reference
    /// bus.
    ///
    /// Returns an error if the bus doesn't exist, or can't be reached from
    /// the reference bus.
    pub fn find_parent(&self, bus_id: &I, reference: Option<&I>) -> Result<Option<I>, Error> {
        self.index_of(bus_id)?;
        self.find_prev_and_next(reference)?
            .parent(bus_id)
            .map(|p| p.cloned())
    }

    /// Returns all buses downstream of the given bus, not including itself.
    pub fn all_buses_below(&self, bus_id: &I, reference: Option<&I>) -> Result<Vec<I>, Error> {
        self.index_of(bus_id)?;
        Ok(self.find_prev_and_next(reference)?.buses_below(bus_id))
    }

    /// Returns the buses downstream of the given bus that carry a load.
    pub fn all_loads_below(
        &self,
        bus_id: &I,
        loads: &LoadPoints<I>,
        reference: Option<&I>,
    ) -> Result<Vec<I>, Error> {
        Ok(self
            .all_buses_below(bus_id, reference)?
            .into_iter()
            .filter(|id| loads.contains_key(id))
            .collect())
    }

    /// Returns the buses downstream of the given bus that have no children.
    pub fn all_leaf_nodes_below(
        &self,
        bus_id: &I,
        reference: Option<&I>,
    ) -> Result<Vec<I>, Error> {
        self.index_of(bus_id)?;
        Ok(self.find_prev_and_next(reference)?.leaf_nodes_below(bus_id))
    }

    /// Returns the path from `from` up to its ancestor `to`, including both.
    pub fn path_to_node(&self, from: &I, to: &I, reference: Option<&I>) -> Result<Vec<I>, Error> {
        self.index_of(from)?;
        self.index_of(to)?;
        self.find_prev_and_next(reference)?.path_to_node(from, to)
    }

    /// Returns one path per leaf below `from`, each ordered from `from` down
    /// to the leaf.
    pub fn all_paths_from_node(&self, from: &I, reference: Option<&I>) -> Result<Vec<Vec<I>>, Error> {
        self.index_of(from)?;
        self.find_prev_and_next(reference)?.all_paths_from_node(from)
    }

    /// Returns the sum of the branch impedances along the given path.
    pub fn total_impedance_of_path(&self, path: &[I]) -> Result<Complex64, Error> {
        path.windows(2)
            .map(|pair| self.impedance_of_branch(&pair[0], &pair[1]))
            .sum()
    }

    /// Returns every path from the reference bus to a leaf, with its total
    /// impedance.
    pub fn impedance_for_all_paths(
        &self,
        reference: Option<&I>,
    ) -> Result<Vec<(Vec<I>, Complex64)>, Error> {
        let tree = self.find_prev_and_next(reference)?;
        tree.all_paths_from_node(tree.reference())?
            .into_iter()
            .map(|path| {
                let z = self.total_impedance_of_path(&path)?;
                Ok((path, z))
            })
            .collect()
    }

    /// Returns the path from the reference bus to a leaf with the highest
    /// total impedance magnitude.
    ///
    /// When several paths share the highest magnitude, the first one found
    /// is returned.
    pub fn path_of_highest_impedance(&self, reference: Option<&I>) -> Result<Vec<I>, Error> {
        let mut highest: Option<(Vec<I>, f64)> = None;
        for (path, z) in self.impedance_for_all_paths(reference)? {
            let magnitude = z.norm();
            if highest.as_ref().map_or(true, |(_, h)| magnitude > *h) {
                highest = Some((path, magnitude));
            }
        }

        highest.map(|(path, _)| path).ok_or_else(|| {
            Error::path_not_found("The reference bus has no buses below it.")
        })
    }

    /// Returns the buses that are not part of the radial fed by the given
    /// reference bus.
    pub fn unreachable_buses(&self, reference: Option<&I>) -> Result<Vec<I>, Error> {
        let tree = self.find_prev_and_next(reference)?;
        let reachable = tree.prev().keys().collect::<HashSet<_>>();
        Ok(self
            .buses()
            .filter(|b| !reachable.contains(&b.id))
            .map(|b| b.id.clone())
            .collect())
    }
}
