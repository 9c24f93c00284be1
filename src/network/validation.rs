// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating that a [`RadialNetwork`] is operated radially.

use std::collections::HashSet;

use crate::{BusId, Error, RadialNetwork, RadialTree};

impl<I> RadialNetwork<I>
where
    I: BusId,
{
    /// Validates that the in-service branches between the buses of the given
    /// radial don't form a cycle.
    ///
    /// Traversal doesn't require this to hold, and silently picks the first
    /// path found to every bus.  If a cycle is detected, an error is returned
    /// that lists the buses in the cycle.
    pub fn validate_radiality(&self, reference: Option<&I>) -> Result<(), Error> {
        let tree = self.find_prev_and_next(reference)?;
        let mut visited = HashSet::new();
        self.validate_acyclicity(&tree, tree.reference(), &mut Vec::new(), &mut visited)
    }

    fn validate_acyclicity(
        &self,
        tree: &RadialTree<I>,
        bus_id: &I,
        predecessors: &mut Vec<I>,
        visited: &mut HashSet<I>,
    ) -> Result<(), Error> {
        visited.insert(bus_id.clone());
        let parent = predecessors.last().cloned();
        predecessors.push(bus_id.clone());

        for neighbor in self.neighbors(bus_id)? {
            let id = &neighbor.id;
            if !tree.contains(id) || parent.as_ref() == Some(id) {
                continue;
            }
            if let Some(first_occurrence) = predecessors.iter().position(|p| p == id) {
                return Err(Error::invariant_violation(format!(
                    "Cycle detected: {} -> {}",
                    predecessors[first_occurrence..]
                        .iter()
                        .map(|x| x.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> "),
                    id
                )));
            }
            if !visited.contains(id) {
                self.validate_acyclicity(tree, id, predecessors, visited)?;
            }
        }

        predecessors.pop();
        Ok(())
    }
}
