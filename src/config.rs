// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for building a
//! `RadialNetwork` and for simplifying it.

use serde::{Deserialize, Serialize};

/// Configuration options for the `RadialNetwork`.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whether to accept networks that don't have exactly one reference bus.
    ///
    /// When this is `true`, the check is deferred until an operation needs
    /// the reference bus, and callers are expected to pass an explicit
    /// reference to traversal methods.
    pub skip_reference_validation: bool,

    /// Whether to check, at creation time, that the in-service branches
    /// reachable from the reference bus form a tree.
    pub validate_radiality: bool,
}

/// Configuration options for
/// [`simplify_net`][crate::simplification::simplify_net].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimplificationConfig<I> {
    /// Voltage level, in kV, that the radial is reduced to.
    pub target_voltage_kv: f64,

    /// Reference bus of the radial to simplify.  When `None`, the network's
    /// own reference bus is used.
    #[serde(default)]
    pub reference_bus: Option<I>,

    /// Whether the highest-impedance line directly below a stepped-down
    /// transformer survives simplification instead of being folded into the
    /// transformer's equivalent impedance.
    #[serde(default)]
    pub keep_highest_impedance_line: bool,
}

impl<I> SimplificationConfig<I> {
    /// Creates a config that simplifies the network's default radial to the
    /// given voltage level.
    pub fn new(target_voltage_kv: f64) -> Self {
        Self {
            target_voltage_kv,
            reference_bus: None,
            keep_highest_impedance_line: false,
        }
    }

    /// Sets the reference bus of the radial to simplify.
    pub fn with_reference_bus(mut self, reference_bus: I) -> Self {
        self.reference_bus = Some(reference_bus);
        self
    }

    /// Sets whether the highest-impedance line is kept.
    pub fn with_keep_highest_impedance_line(mut self, keep: bool) -> Self {
        self.keep_highest_impedance_line = keep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplification_config_from_json() {
        let config: SimplificationConfig<String> =
            serde_json::from_str(r#"{ "target_voltage_kv": 22.0 }"#).unwrap();
        assert_eq!(config, SimplificationConfig::new(22.0));

        let config: SimplificationConfig<String> = serde_json::from_str(
            r#"{
                "target_voltage_kv": 11.0,
                "reference_bus": "B1",
                "keep_highest_impedance_line": true
            }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            SimplificationConfig::new(11.0)
                .with_reference_bus("B1".to_string())
                .with_keep_highest_impedance_line(true)
        );
    }

    #[test]
    fn test_network_config_defaults() {
        let config: NetworkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NetworkConfig::default());
        assert!(!config.skip_reference_validation);
        assert!(!config.validate_radiality);
    }
}
