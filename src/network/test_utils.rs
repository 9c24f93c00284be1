// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the crate.
//!
//! - the `NetworkBuilder`, which can declaratively build networks and their
//!   load points for use in tests.
//! - the example network used throughout the tests.

use num_complex::Complex64;

use crate::timeseries::test_utils::ts;
use crate::{Branch, Bus, Error, LoadPoints, NetworkConfig, RadialNetwork};

/// A builder for creating networks and load points easily, for use in tests.
pub(crate) struct NetworkBuilder {
    buses: Vec<Bus<&'static str>>,
    branches: Vec<Branch<&'static str>>,
    loads: LoadPoints<&'static str>,
    config: NetworkConfig,
}

impl NetworkBuilder {
    /// Creates a new `NetworkBuilder`.
    pub(crate) fn new() -> Self {
        NetworkBuilder {
            buses: Vec::new(),
            branches: Vec::new(),
            loads: LoadPoints::new(),
            config: NetworkConfig::default(),
        }
    }

    /// Adds a reference bus.
    pub(crate) fn reference(mut self, id: &'static str, base_kv: f64) -> Self {
        self.buses.push(Bus::reference(id, base_kv));
        self
    }

    /// Adds a load bus.
    pub(crate) fn bus(mut self, id: &'static str, base_kv: f64) -> Self {
        self.buses.push(Bus::new(id, base_kv));
        self
    }

    /// Connects two buses with a line.
    pub(crate) fn line(mut self, a: &'static str, b: &'static str, r: f64, x: f64) -> Self {
        self.branches
            .push(Branch::line(a, b, Complex64::new(r, x)).with_rate_mva(1.0));
        self
    }

    /// Connects two buses with a transformer.
    pub(crate) fn transformer(
        mut self,
        a: &'static str,
        b: &'static str,
        r: f64,
        x: f64,
        tap: f64,
    ) -> Self {
        self.branches
            .push(Branch::transformer(a, b, Complex64::new(r, x), tap).with_rate_mva(1.0));
        self
    }

    /// Sets the thermal rating of the branch between the two buses.
    pub(crate) fn rate(mut self, a: &'static str, b: &'static str, rate_mva: f64) -> Self {
        for branch in self.branches.iter_mut().filter(|br| br.connects(&a, &b)) {
            branch.rate_mva = rate_mva;
        }
        self
    }

    /// Takes the branch between the two buses out of service.
    pub(crate) fn disconnect(mut self, a: &'static str, b: &'static str) -> Self {
        for branch in self.branches.iter_mut().filter(|br| br.connects(&a, &b)) {
            branch.in_service = false;
        }
        self
    }

    /// Attaches an hourly load timeseries, given as `(hour, value)` pairs, to
    /// a bus.
    pub(crate) fn load(mut self, id: &'static str, pairs: &[(i64, f64)]) -> Self {
        self.loads.insert(id, ts(pairs));
        self
    }

    /// Sets the network config.
    pub(crate) fn config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds and returns the network.
    pub(crate) fn build(&self) -> Result<RadialNetwork<&'static str>, Error> {
        RadialNetwork::try_new(
            self.buses.clone(),
            self.branches.clone(),
            self.config.clone(),
        )
    }

    /// Builds and returns the network together with its load points.
    pub(crate) fn build_with_loads(
        &self,
    ) -> Result<(RadialNetwork<&'static str>, LoadPoints<&'static str>), Error> {
        Ok((self.build()?, self.loads.clone()))
    }
}

/// The example network:
///
/// ```text
/// B1 (66 kV, reference)
/// └── B2 (66)
///     ├── B3 (22)
///     │   └── B5 (11)
///     │       ├── B7 (11, load 5, 6)
///     │       └── B8 (11, load 3, 4)
///     └── B4 (22)
/// ```
pub(crate) fn example_builder() -> NetworkBuilder {
    NetworkBuilder::new()
        .reference("B1", 66.0)
        .bus("B2", 66.0)
        .bus("B3", 22.0)
        .bus("B4", 22.0)
        .bus("B5", 11.0)
        .bus("B7", 11.0)
        .bus("B8", 11.0)
        .line("B1", "B2", 0.1, 0.1)
        .transformer("B2", "B3", 0.1, 0.3, 3.0)
        .transformer("B4", "B2", 0.1, 0.3, 3.0)
        .transformer("B3", "B5", 0.2, 0.4, 2.0)
        .line("B5", "B7", 0.5, 0.5)
        .line("B8", "B5", 1.0, 1.0)
        .load("B7", &[(1, 5.0), (2, 6.0)])
        .load("B8", &[(1, 3.0), (2, 4.0)])
}

pub(crate) fn example_network() -> Result<RadialNetwork<&'static str>, Error> {
    example_builder().build()
}
