// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the buses and branches that make up a
//! [`RadialNetwork`][crate::RadialNetwork], and the `BusId` trait that bus
//! identifiers must implement.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Tolerance used when comparing voltage levels, in kV.
pub(crate) const VOLTAGE_TOLERANCE_KV: f64 = 1e-9;

/// Returns true if the two voltage levels are equal within
/// [`VOLTAGE_TOLERANCE_KV`].
pub(crate) fn same_voltage(a: f64, b: f64) -> bool {
    (a - b).abs() <= VOLTAGE_TOLERANCE_KV
}

/**
Identifiers of buses.

Loaders hand over either string IDs (customer or substation names) or
numeric IDs, so the network is generic over the identifier type.  Anything
that can be cloned, hashed, ordered and printed qualifies:

```
use flexible_load_analysis::BusId;

fn takes_id<I: BusId>(_id: I) {}

takes_id("B1");
takes_id(String::from("B1"));
takes_id(17_u64);
```
*/
pub trait BusId: Clone + Eq + Hash + Ord + Debug + Display {}

impl<T> BusId for T where T: Clone + Eq + Hash + Ord + Debug + Display {}

/// Represents the type of a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusType {
    /// The source bus of a radial.
    Reference,
    /// A load bus.
    PQ,
    /// A generator bus.
    PV,
    /// A bus that is out of service.
    Isolated,
}

impl Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusType::Reference => f.pad("REF"),
            BusType::PQ => f.pad("P-Q"),
            BusType::PV => f.pad("P-V"),
            BusType::Isolated => f.pad("ISO"),
        }
    }
}

/// A bus (node) of the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bus<I> {
    pub id: I,
    #[serde(default)]
    pub name: String,
    pub bus_type: BusType,
    /// Nominal voltage level in kV.
    pub base_kv: f64,
}

impl<I: BusId> Bus<I> {
    /// Creates a new load bus at the given voltage level.
    pub fn new(id: I, base_kv: f64) -> Self {
        Self {
            name: id.to_string(),
            id,
            bus_type: BusType::PQ,
            base_kv,
        }
    }

    /// Creates a new reference bus at the given voltage level.
    pub fn reference(id: I, base_kv: f64) -> Self {
        Self {
            bus_type: BusType::Reference,
            ..Self::new(id, base_kv)
        }
    }

    /// Returns true if this is the reference bus of its radial.
    pub fn is_reference(&self) -> bool {
        self.bus_type == BusType::Reference
    }
}

impl<I: BusId> Display for Bus<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bus {} {:<14} {:>5} {:>8.2} kV",
            self.id, self.name, self.bus_type, self.base_kv
        )
    }
}

/// A branch (edge) of the network.
///
/// Branches are undirected: `from_bus` and `to_bus` only record the order
/// in which the loader saw the endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch<I> {
    pub from_bus: I,
    pub to_bus: I,
    /// Series impedance, resistance + j reactance.
    pub impedance: Complex64,
    /// Off-nominal turns ratio.  `0` and `1` both mean "plain line".
    #[serde(default)]
    pub tap_ratio: f64,
    /// Branches that are out of service are ignored during traversal.
    pub in_service: bool,
    /// Thermal rating in MVA.
    pub rate_mva: f64,
}

impl<I: BusId> Branch<I> {
    /// Creates a new in-service line between the two buses.
    pub fn line(from_bus: I, to_bus: I, impedance: Complex64) -> Self {
        Self {
            from_bus,
            to_bus,
            impedance,
            tap_ratio: 0.0,
            in_service: true,
            rate_mva: 0.0,
        }
    }

    /// Creates a new in-service transformer between the two buses.
    pub fn transformer(from_bus: I, to_bus: I, impedance: Complex64, tap_ratio: f64) -> Self {
        Self {
            tap_ratio,
            ..Self::line(from_bus, to_bus, impedance)
        }
    }

    /// Sets the thermal rating of the branch.
    pub fn with_rate_mva(mut self, rate_mva: f64) -> Self {
        self.rate_mva = rate_mva;
        self
    }

    /// Sets whether the branch is in service.
    pub fn with_in_service(mut self, in_service: bool) -> Self {
        self.in_service = in_service;
        self
    }

    /// Returns true if the branch is a transformer, i.e. its tap ratio is
    /// neither `0` nor `1`.
    pub fn is_transformer(&self) -> bool {
        self.tap_ratio != 0.0 && self.tap_ratio != 1.0
    }

    /// Returns true if the branch connects the two given buses, in either
    /// direction.
    pub fn connects(&self, a: &I, b: &I) -> bool {
        (&self.from_bus == a && &self.to_bus == b) || (&self.from_bus == b && &self.to_bus == a)
    }
}

impl<I: BusId> Display for Branch<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {}  R={:>10.6}  X={:>10.6}  Tap={:.4}  Rate={:>7.1}{}",
            if self.is_transformer() { "Xfmr" } else { "Line" },
            self.from_bus,
            self.to_bus,
            self.impedance.re,
            self.impedance.im,
            self.tap_ratio,
            self.rate_mva,
            if self.in_service { "" } else { "  (out of service)" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_predicate() {
        let z = Complex64::new(0.1, 0.2);
        assert!(!Branch::line("A", "B", z).is_transformer());
        assert!(!Branch::transformer("A", "B", z, 1.0).is_transformer());
        assert!(Branch::transformer("A", "B", z, 0.95).is_transformer());
        assert!(Branch::transformer("A", "B", z, 2.0).is_transformer());
    }

    #[test]
    fn test_connects_is_direction_agnostic() {
        let branch = Branch::line("A", "B", Complex64::new(0.0, 0.0));
        assert!(branch.connects(&"A", &"B"));
        assert!(branch.connects(&"B", &"A"));
        assert!(!branch.connects(&"A", &"C"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Bus::reference("B1", 66.0).to_string(),
            "Bus B1 B1               REF    66.00 kV"
        );
        assert_eq!(
            Branch::line("B1", "B2", Complex64::new(0.5, 1.25))
                .with_in_service(false)
                .to_string(),
            "Line B1 -> B2  R=  0.500000  X=  1.250000  Tap=0.0000  Rate=    0.0  (out of service)"
        );
    }
}
