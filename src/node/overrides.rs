//! Named field overrides for synthetic nodes

use super::base::Node;
use super::types::{Memory, NodeId, NodeStatus, Resources};
use crate::error::{Result, ScaleError};
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;

/// Replacement values for any [`Node`] field
///
/// Every field left as `None` keeps the default the node was built with.
/// Also deserializable from a JSON object keyed by field name, which is how
/// test scenarios usually describe atypical nodes:
///
/// ```
/// use scalelib::node::NodeOverrides;
/// let overrides = NodeOverrides::from_value(serde_json::json!({
///     "vcpu_count": 0,
///     "vm_size": "Standard_F2",
/// })).unwrap();
/// assert_eq!(overrides.vcpu_count, Some(0));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeOverrides {
    /// Identity handle
    pub node_id: Option<NodeId>,
    /// Node name
    pub name: Option<String>,
    /// Node array name
    pub nodearray: Option<String>,
    /// Bucket id, must not be empty
    pub bucket_id: Option<String>,
    /// Hostname, must not be empty
    pub hostname: Option<String>,
    /// Private address
    pub private_ip: Option<IpAddr>,
    /// Cloud instance id
    pub instance_id: Option<String>,
    /// VM size
    pub vm_size: Option<String>,
    /// Location
    pub location: Option<String>,
    /// Spot flag
    pub spot: Option<bool>,
    /// Virtual cpus. The physical count follows unless overridden too.
    pub vcpu_count: Option<u32>,
    /// Physical cpus
    pub pcpu_count: Option<u32>,
    /// GPUs
    pub gpu_count: Option<u32>,
    /// Memory in bytes
    pub memory: Option<Memory>,
    /// Infiniband flag
    pub infiniband: Option<bool>,
    /// Current status
    pub state: Option<NodeStatus>,
    /// Target status
    pub target_state: Option<NodeStatus>,
    /// Power status
    pub power_state: Option<NodeStatus>,
    /// Exists flag
    pub exists: Option<bool>,
    /// Placement group
    pub placement_group: Option<String>,
    /// Managed flag
    pub managed: Option<bool>,
    /// Scheduler resources, replacing the whole mapping
    pub resources: Option<Resources>,
    /// Software configuration
    pub software_configuration: Option<Resources>,
    /// Keep-alive flag
    pub keep_alive: Option<bool>,
}

impl NodeOverrides {
    /// Parse overrides from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| ScaleError::config(format!("invalid node overrides: {}", e)))
    }

    /// Write every set field into `node`
    ///
    /// Nothing is written when validation fails.
    pub fn apply(self, node: &mut Node) -> Result<()> {
        if let Some(hostname) = self.hostname.as_deref().filter(|h| h.is_empty()) {
            return Err(ScaleError::InvalidHostname(hostname.to_string()));
        }
        if self.bucket_id.as_deref().is_some_and(str::is_empty) {
            return Err(ScaleError::config("bucket_id override must not be empty"));
        }

        if let Some(v) = self.hostname {
            node.hostname = Some(v);
        }
        if let Some(v) = self.bucket_id {
            node.bucket_id = v;
        }
        if let Some(vcpu_count) = self.vcpu_count {
            node.vcpu_count = vcpu_count;
            node.pcpu_count = self.pcpu_count.unwrap_or(vcpu_count);
        } else if let Some(pcpu_count) = self.pcpu_count {
            node.pcpu_count = pcpu_count;
        }

        if let Some(v) = self.node_id {
            node.node_id = v;
        }
        if let Some(v) = self.name {
            node.name = v;
        }
        if let Some(v) = self.nodearray {
            node.nodearray = v;
        }
        if let Some(v) = self.private_ip {
            node.private_ip = Some(v);
        }
        if let Some(v) = self.instance_id {
            node.instance_id = Some(v);
        }
        if let Some(v) = self.vm_size {
            node.vm_size = v;
        }
        if let Some(v) = self.location {
            node.location = v;
        }
        if let Some(v) = self.spot {
            node.spot = v;
        }
        if let Some(v) = self.gpu_count {
            node.gpu_count = v;
        }
        if let Some(v) = self.memory {
            node.memory = v;
        }
        if let Some(v) = self.infiniband {
            node.infiniband = v;
        }
        if let Some(v) = self.state {
            node.state = v;
        }
        if let Some(v) = self.target_state {
            node.target_state = v;
        }
        if let Some(v) = self.power_state {
            node.power_state = v;
        }
        if let Some(v) = self.exists {
            node.exists = v;
        }
        if let Some(v) = self.placement_group {
            node.placement_group = Some(v);
        }
        if let Some(v) = self.managed {
            node.managed = v;
        }
        if let Some(v) = self.resources {
            node.resources = v;
        }
        if let Some(v) = self.software_configuration {
            node.software_configuration = v;
        }
        if let Some(v) = self.keep_alive {
            node.keep_alive = v;
        }
        Ok(())
    }
}
