// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over buses and branches in a `RadialNetwork`.

use petgraph::stable_graph::{EdgeIndices, NodeIndex, NodeIndices, StableUnGraph};

use crate::{Branch, Bus, BusId};

/// An iterator over the buses in a `RadialNetwork`.
pub struct Buses<'a, I>
where
    I: BusId,
{
    pub(crate) graph: &'a StableUnGraph<Bus<I>, Branch<I>>,
    pub(crate) iter: NodeIndices<'a, Bus<I>>,
}

impl<'a, I> Iterator for Buses<'a, I>
where
    I: BusId,
{
    type Item = &'a Bus<I>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}

/// An iterator over the branches in a `RadialNetwork`.
pub struct Branches<'a, I>
where
    I: BusId,
{
    pub(crate) graph: &'a StableUnGraph<Bus<I>, Branch<I>>,
    pub(crate) iter: EdgeIndices<'a, Branch<I>>,
}

impl<'a, I> Iterator for Branches<'a, I>
where
    I: BusId,
{
    type Item = &'a Branch<I>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|e| &self.graph[e])
    }
}

/// An iterator over the buses joined to a bus by an in-service branch, in
/// the order the branches were added.
pub struct Neighbors<'a, I>
where
    I: BusId,
{
    pub(crate) graph: &'a StableUnGraph<Bus<I>, Branch<I>>,
    pub(crate) iter: std::vec::IntoIter<NodeIndex>,
}

impl<'a, I> Iterator for Neighbors<'a, I>
where
    I: BusId,
{
    type Item = &'a Bus<I>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}
