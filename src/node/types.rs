//! Value types shared by every node flavour

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Scheduler resources attached to a node, e.g. `{"slots": 4, "ncpus": 4}`
pub type Resources = BTreeMap<String, serde_json::Value>;

/// Node identity handle
///
/// Scheduler nodes start out `Delayed`: only the hostname is known, and the
/// authoritative cloud id is filled in once the node is confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    /// Not yet resolved; keyed by node name
    Delayed {
        /// Name the id will eventually be resolved for
        name: String,
    },
    /// Authoritative identifier
    Resolved(String),
}

impl NodeId {
    /// Create a delayed handle for `name`
    pub fn delayed(name: impl Into<String>) -> Self {
        NodeId::Delayed { name: name.into() }
    }

    /// Replace the handle with a resolved identifier
    pub fn resolve(&mut self, id: impl Into<String>) {
        *self = NodeId::Resolved(id.into());
    }

    /// Whether the authoritative value is known
    pub fn is_resolved(&self) -> bool {
        matches!(self, NodeId::Resolved(_))
    }

    /// The resolved identifier, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            NodeId::Resolved(id) => Some(id),
            NodeId::Delayed { .. } => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Delayed { name } => write!(f, "delayed:{}", name),
            NodeId::Resolved(id) => write!(f, "{}", id),
        }
    }
}

/// Opaque node status as reported by the scheduler or the cloud
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeStatus(String);

impl NodeStatus {
    /// Wrap a status string
    pub fn new(status: impl Into<String>) -> Self {
        NodeStatus(status.into())
    }

    /// The status every scheduler node starts in
    pub fn running() -> Self {
        NodeStatus::new("running")
    }

    /// Status as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const MEMORY_UNITS: [(char, u64); 5] = [
    ('t', 1 << 40),
    ('g', 1 << 30),
    ('m', 1 << 20),
    ('k', 1 << 10),
    ('b', 1),
];

/// Byte quantity, rendered as `<value>.<2 decimals><unit>`, e.g. `4.00g`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Memory(u64);

impl Memory {
    /// Memory from a byte count
    pub fn from_bytes(bytes: u64) -> Self {
        Memory(bytes)
    }

    /// Memory from a (possibly fractional) number of GiB
    pub fn from_gib(gib: f64) -> Self {
        Memory((gib * (1u64 << 30) as f64) as u64)
    }

    /// Size in bytes
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (unit, divisor) = MEMORY_UNITS
            .iter()
            .copied()
            .find(|(_, size)| self.0 >= *size)
            .unwrap_or(('b', 1));
        write!(f, "{:.2}{}", self.0 as f64 / divisor as f64, unit)
    }
}

impl Serialize for Memory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
