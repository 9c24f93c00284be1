// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`RadialNetwork`] instances from given buses and
//! branches.

use petgraph::stable_graph::StableUnGraph;

use crate::{Branch, Bus, BusId, Error, NetworkConfig};

use super::{NodeIndexMap, RadialNetwork};

/// `RadialNetwork` instantiation.
impl<I> RadialNetwork<I>
where
    I: BusId,
{
    /// Creates a new [`RadialNetwork`] from the given buses and branches.
    ///
    /// Returns an error if the network is invalid.
    pub fn try_new<BusIterator, BranchIterator>(
        buses: BusIterator,
        branches: BranchIterator,
        config: NetworkConfig,
    ) -> Result<Self, Error>
    where
        BusIterator: IntoIterator<Item = Bus<I>>,
        BranchIterator: IntoIterator<Item = Branch<I>>,
    {
        let (graph, node_indices) = Self::create_graph(buses)?;

        let mut network = Self {
            graph,
            node_indices,
            config,
        };
        network.add_branches(branches)?;

        if !network.config.skip_reference_validation {
            network.reference_bus()?;
        }
        if network.config.validate_radiality {
            network.validate_radiality(None)?;
        }

        Ok(network)
    }

    /// Returns the configuration the network was created with.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn create_graph(
        buses: impl IntoIterator<Item = Bus<I>>,
    ) -> Result<(StableUnGraph<Bus<I>, Branch<I>>, NodeIndexMap<I>), Error> {
        let mut graph = StableUnGraph::default();
        let mut indices = NodeIndexMap::new();

        for bus in buses {
            if indices.contains_key(&bus.id) {
                return Err(Error::invalid_bus(format!(
                    "Duplicate bus ID found: {}",
                    bus.id
                )));
            }
            if bus.base_kv.is_nan() || bus.base_kv < 0.0 {
                return Err(Error::invalid_bus(format!(
                    "Bus {} has an invalid voltage level: {} kV",
                    bus.id, bus.base_kv
                )));
            }

            let id = bus.id.clone();
            let idx = graph.add_node(bus);
            indices.insert(id, idx);
        }

        Ok((graph, indices))
    }

    fn add_branches(&mut self, branches: impl IntoIterator<Item = Branch<I>>) -> Result<(), Error> {
        for branch in branches {
            self.insert_branch(branch)?;
        }
        Ok(())
    }

    /// Validates the given branch and adds it to the graph.
    pub(super) fn insert_branch(&mut self, branch: Branch<I>) -> Result<(), Error> {
        let (fid, tid) = (&branch.from_bus, &branch.to_bus);

        if fid == tid {
            return Err(Error::invalid_branch(format!(
                "Branch:({fid}, {tid}) Can't connect a bus to itself."
            )));
        }
        for bid in [fid, tid] {
            if !self.node_indices.contains_key(bid) {
                return Err(Error::invalid_branch(format!(
                    "Branch:({fid}, {tid}) Can't find a bus with ID {bid}"
                )));
            }
        }

        let from_idx = self.node_indices[fid];
        let to_idx = self.node_indices[tid];
        if self.graph.find_edge(from_idx, to_idx).is_some() {
            return Err(Error::invalid_branch(format!(
                "Branch:({fid}, {tid}) Multiple branches between the same buses."
            )));
        }

        self.graph.add_edge(from_idx, to_idx, branch);
        Ok(())
    }
}
