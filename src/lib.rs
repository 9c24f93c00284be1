// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Flexible Load Analysis

This is a library for analyzing the load of radially operated electrical
distribution networks: aggregating customer load timeseries up through the
network, simplifying multi-voltage-level networks into single-voltage-level
equivalents, and characterizing the overloads that flexibility would need to
resolve.

## The network

The main struct is [`RadialNetwork`], instances of which can be created by
passing an iterator of [`Bus`]es and the [`Branch`]es between them to the
[`try_new`][RadialNetwork::try_new] method.  Bus ids can be of any type that
implements [`BusId`].

Branches are undirected.  Which end of a branch is upstream is derived by
traversing the network from its reference bus, only stepping to buses of
equal or lower voltage.  The result of such a traversal is a [`RadialTree`],
returned by [`find_prev_and_next`][RadialNetwork::find_prev_and_next], on
which parents, descendants, leaves and paths can be looked up.

## Loads

Loads are kept apart from the network, in [`LoadPoints`] keyed by bus id.
The functions in [`loads`] modify both containers together, and those in
[`aggregation`] sum loads over the buses below a given bus.

## Simplification

[`simplify_net`][simplification::simplify_net] reduces the radial to a
single voltage level, replacing transformers with lines of equivalent
impedance, and collapsing the buses below them into the transformers' low
voltage buses.

## Flexibility

[`find_overloads`][flexibility::find_overloads] finds the intervals where a
load is at or above a power limit, and a
[`FlexibilityNeed`][flexibility::FlexibilityNeed] summarizes them.
*/

pub mod aggregation;
pub mod flexibility;
pub mod loads;
pub use loads::LoadPoints;
pub mod simplification;

mod config;
pub use config::{NetworkConfig, SimplificationConfig};

mod elements;
pub use elements::{Branch, Bus, BusId, BusType};

mod network;
pub use network::{iterators, RadialNetwork, RadialTree};

mod timeseries;
pub use timeseries::{Sample, Timeseries};

mod error;
pub use error::{Error, ErrorKind};
