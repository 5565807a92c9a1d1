// ── Topology registry ──
//
// The physical test bed: which switches exist, which hosts hang off them,
// and which logical dataplane port reaches which interface. Loaded once per
// run and handed to test cases by value.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::{Device, DeviceRole, Host};

/// Fabric shape. Scatter beds have a single spine; full beds have two.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TopologyKind {
    Scatter,
    #[default]
    Full,
}

impl TopologyKind {
    pub fn spine_count(self) -> usize {
        match self {
            Self::Scatter => 1,
            Self::Full => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub kind: TopologyKind,
    #[serde(default)]
    pub spines: Vec<Device>,
    #[serde(default)]
    pub leaves: Vec<Device>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub external_routers: Vec<Host>,
    #[serde(default)]
    pub dhcp_server: Option<Host>,
    /// Logical dataplane port -> interface name on the injection rig.
    #[serde(default)]
    pub port_map: BTreeMap<u32, String>,
}

impl Topology {
    /// Check the shape against `kind` and that device ids are unique.
    pub fn validate(&self) -> Result<(), CoreError> {
        let want = self.kind.spine_count();
        if self.spines.len() != want {
            return Err(CoreError::validation(
                "topology.spines",
                format!(
                    "{} topology needs {want} spine(s), found {}",
                    self.kind,
                    self.spines.len()
                ),
            ));
        }
        if let Some(d) = self.spines.iter().find(|d| d.role != DeviceRole::Spine) {
            return Err(CoreError::validation(
                "topology.spines",
                format!("device {} is listed as a spine but has role {}", d.id, d.role),
            ));
        }
        if let Some(d) = self.leaves.iter().find(|d| d.role != DeviceRole::Leaf) {
            return Err(CoreError::validation(
                "topology.leaves",
                format!("device {} is listed as a leaf but has role {}", d.id, d.role),
            ));
        }

        let mut ids = BTreeSet::new();
        for device in self.devices() {
            if !ids.insert(device.id.as_str()) {
                return Err(CoreError::validation(
                    "topology.devices",
                    format!("duplicate device id {}", device.id),
                ));
            }
        }
        Ok(())
    }

    /// Spines first, then leaves.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.spines.iter().chain(&self.leaves)
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices().find(|d| d.id == id)
    }

    pub fn spine(&self, index: usize) -> Result<&Device, CoreError> {
        self.spines.get(index).ok_or_else(|| CoreError::NotFound {
            identifier: format!("spine{index}"),
        })
    }

    pub fn leaf(&self, index: usize) -> Result<&Device, CoreError> {
        self.leaves.get(index).ok_or_else(|| CoreError::NotFound {
            identifier: format!("leaf{index}"),
        })
    }

    pub fn host(&self, index: usize) -> Result<&Host, CoreError> {
        self.hosts.get(index).ok_or_else(|| CoreError::NotFound {
            identifier: format!("host{index}"),
        })
    }

    pub fn external_router(&self, index: usize) -> Result<&Host, CoreError> {
        self.external_routers
            .get(index)
            .ok_or_else(|| CoreError::NotFound {
                identifier: format!("external_router{index}"),
            })
    }

    pub fn dhcp_server(&self) -> Result<&Host, CoreError> {
        self.dhcp_server.as_ref().ok_or_else(|| CoreError::NotFound {
            identifier: "dhcp_server".into(),
        })
    }

    /// Logical dataplane ports in ascending order.
    pub fn dataplane_ports(&self) -> Vec<u32> {
        self.port_map.keys().copied().collect()
    }
}

/// Source of the test-bed description.
pub trait TopologyProvider {
    fn topology(&self) -> Result<Topology, CoreError>;
}

/// A topology fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticTopology(Topology);

impl StaticTopology {
    pub fn new(topology: Topology) -> Self {
        Self(topology)
    }
}

impl TopologyProvider for StaticTopology {
    fn topology(&self) -> Result<Topology, CoreError> {
        self.0.validate()?;
        Ok(self.0.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_topology_validates() {
        let topo = fixtures::full();
        assert!(topo.validate().is_ok());
        assert_eq!(topo.dataplane_ports(), vec![1, 2, 3, 4]);
        assert!(topo.device("of:0000000000000012").is_some());
    }

    #[test]
    fn scatter_rejects_two_spines() {
        let topo = Topology {
            kind: TopologyKind::Scatter,
            ..fixtures::full()
        };
        assert!(matches!(
            topo.validate(),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut topo = fixtures::full();
        topo.leaves[1].id = topo.leaves[0].id.clone();
        assert!(topo.validate().is_err());
    }

    #[test]
    fn missing_role_lookup_is_not_found() {
        let topo = fixtures::full();
        assert!(topo.spine(1).is_ok());
        assert!(topo.spine(2).unwrap_err().is_not_found());
    }
}
