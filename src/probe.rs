//! Capability probing - is a tool present on this host?
//!
//! Probes never error and never mutate: absence is a normal `false`, and
//! every consumer takes the trait so tests can substitute a fixed map.

use std::collections::BTreeSet;

/// Check whether a named external tool is available
pub trait CapabilityProbe {
    /// Whether `name` resolves to an executable. No side effects.
    fn probe(&self, name: &str) -> bool;
}

/// PATH-based probe for the real host
pub struct CommandProbe;

impl CapabilityProbe for CommandProbe {
    fn probe(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// Map-backed probe for tests
#[derive(Debug, Default)]
pub struct FixedProbe {
    available: BTreeSet<String>,
}

impl FixedProbe {
    /// Probe reporting only the given tools as available
    pub fn with_available(tools: &[&str]) -> Self {
        Self {
            available: tools.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

impl CapabilityProbe for FixedProbe {
    fn probe(&self, name: &str) -> bool {
        self.available.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_probe() {
        let probe = FixedProbe::with_available(&["mysql", "node"]);
        assert!(probe.probe("mysql"));
        assert!(probe.probe("node"));
        assert!(!probe.probe("systemctl"));
    }

    #[test]
    fn test_command_probe_finds_sh() {
        // /bin/sh exists on any host these tests run on
        assert!(CommandProbe.probe("sh"));
    }

    #[test]
    fn test_command_probe_absence_is_false_not_error() {
        assert!(!CommandProbe.probe("definitely-not-a-real-tool-5309"));
    }
}
