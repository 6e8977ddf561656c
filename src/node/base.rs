//! Base node capability
//!
//! [`Node`] carries the fields the allocation pipeline reads from any node,
//! whichever view (scheduler or cloud) it came from. The scheduler-facing
//! flavours in [`super::scheduler`] only decide how those fields are populated.

use super::types::{Memory, NodeId, NodeStatus, Resources};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// A compute node as seen by the autoscaler
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) node_id: NodeId,
    pub(crate) name: String,
    pub(crate) nodearray: String,
    pub(crate) bucket_id: String,
    pub(crate) hostname: Option<String>,
    pub(crate) private_ip: Option<IpAddr>,
    pub(crate) instance_id: Option<String>,
    pub(crate) vm_size: String,
    pub(crate) location: String,
    pub(crate) spot: bool,
    pub(crate) vcpu_count: u32,
    pub(crate) pcpu_count: u32,
    pub(crate) gpu_count: u32,
    pub(crate) memory: Memory,
    pub(crate) infiniband: bool,
    pub(crate) state: NodeStatus,
    pub(crate) target_state: NodeStatus,
    pub(crate) power_state: NodeStatus,
    pub(crate) exists: bool,
    pub(crate) placement_group: Option<String>,
    pub(crate) managed: bool,
    pub(crate) resources: Resources,
    pub(crate) software_configuration: Resources,
    pub(crate) keep_alive: bool,
    /// Stands in for the hostname when a node has none
    pub(crate) fallback_id: String,
}

impl Node {
    /// Node identity handle
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node array (provisioning group) name
    pub fn nodearray(&self) -> &str {
        &self.nodearray
    }

    /// Bucket id, never empty
    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    /// Hostname, if known
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Hostname, or a unique token for nodes without one
    pub fn hostname_or_uuid(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.fallback_id)
    }

    /// Private network address, if resolved
    pub fn private_ip(&self) -> Option<IpAddr> {
        self.private_ip
    }

    /// Cloud instance id, if known
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// VM size
    pub fn vm_size(&self) -> &str {
        &self.vm_size
    }

    /// Location / region
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether this is a spot instance
    pub fn spot(&self) -> bool {
        self.spot
    }

    /// Virtual cpu count
    pub fn vcpu_count(&self) -> u32 {
        self.vcpu_count
    }

    /// Physical cpu count
    pub fn pcpu_count(&self) -> u32 {
        self.pcpu_count
    }

    /// GPU count
    pub fn gpu_count(&self) -> u32 {
        self.gpu_count
    }

    /// Memory
    pub fn memory(&self) -> Memory {
        self.memory
    }

    /// Whether the node has an infiniband interconnect
    pub fn infiniband(&self) -> bool {
        self.infiniband
    }

    /// Current status
    pub fn state(&self) -> &NodeStatus {
        &self.state
    }

    /// Status the node is moving towards
    pub fn target_state(&self) -> &NodeStatus {
        &self.target_state
    }

    /// Power status
    pub fn power_state(&self) -> &NodeStatus {
        &self.power_state
    }

    /// Whether the node exists in the underlying platform
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Placement group, if any
    pub fn placement_group(&self) -> Option<&str> {
        self.placement_group.as_deref()
    }

    /// Whether the autoscaler manages this node
    pub fn managed(&self) -> bool {
        self.managed
    }

    /// Scheduler resources
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Software configuration passed through to provisioning
    pub fn software_configuration(&self) -> &Resources {
        &self.software_configuration
    }

    /// Whether the node is protected from scale-down
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Resolve the delayed node id once the node is confirmed to exist
    pub fn resolve_node_id(&mut self, id: impl Into<String>) {
        self.node_id.resolve(id);
    }

    /// Record the cloud instance id
    pub fn set_instance_id(&mut self, instance_id: impl Into<String>) {
        self.instance_id = Some(instance_id.into());
    }

    /// Record the private address
    pub fn set_private_ip(&mut self, ip: Option<IpAddr>) {
        self.private_ip = ip;
    }

    /// Set the virtual cpu count
    pub fn set_vcpu_count(&mut self, vcpu_count: u32) {
        self.vcpu_count = vcpu_count;
    }

    /// Set the physical cpu count
    pub fn set_pcpu_count(&mut self, pcpu_count: u32) {
        self.pcpu_count = pcpu_count;
    }

    /// Set the GPU count
    pub fn set_gpu_count(&mut self, gpu_count: u32) {
        self.gpu_count = gpu_count;
    }

    /// Set the memory
    pub fn set_memory(&mut self, memory: Memory) {
        self.memory = memory;
    }

    /// Update the current status
    pub fn set_state(&mut self, state: NodeStatus) {
        self.state = state;
    }

    /// Update the target status
    pub fn set_target_state(&mut self, state: NodeStatus) {
        self.target_state = state;
    }

    /// Update the power status
    pub fn set_power_state(&mut self, state: NodeStatus) {
        self.power_state = state;
    }

    /// Mark whether the node exists
    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    /// Protect or release the node from scale-down
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    /// Set a single scheduler resource
    pub fn set_resource(&mut self, name: impl Into<String>, value: Value) {
        self.resources.insert(name.into(), value);
    }

    /// Snapshot of the node for reporting
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut ret = Map::new();
        ret.insert("name".into(), json!(self.name));
        ret.insert("hostname".into(), json!(self.hostname));
        ret.insert("node-id".into(), json!(self.node_id.to_string()));
        ret.insert("nodearray".into(), json!(self.nodearray));
        ret.insert("bucket-id".into(), json!(self.bucket_id));
        ret.insert(
            "private-ip".into(),
            json!(self.private_ip.map(|ip| ip.to_string())),
        );
        ret.insert("instance-id".into(), json!(self.instance_id));
        ret.insert("vm-size".into(), json!(self.vm_size));
        ret.insert("location".into(), json!(self.location));
        ret.insert("spot".into(), json!(self.spot));
        ret.insert("infiniband".into(), json!(self.infiniband));
        ret.insert("placement-group".into(), json!(self.placement_group));
        ret.insert("state".into(), json!(self.state.as_str()));
        ret.insert("target-state".into(), json!(self.target_state.as_str()));
        ret.insert("power-state".into(), json!(self.power_state.as_str()));
        ret.insert("exists".into(), json!(self.exists));
        ret.insert("managed".into(), json!(self.managed));
        ret.insert("keep-alive".into(), json!(self.keep_alive));
        ret.insert("resources".into(), json!(self.resources));
        ret.insert(
            "software-configuration".into(),
            json!(self.software_configuration),
        );
        ret
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node({}, {}, {}, {})",
            self.name,
            self.hostname_or_uuid(),
            self.vm_size,
            self.node_id
        )
    }
}

// Equality, hashing and ordering all key on hostname_or_uuid so that sorted
// reports and hash-based grouping agree with each other.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.hostname_or_uuid() == other.hostname_or_uuid()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hostname_or_uuid().hash(state);
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hostname_or_uuid().cmp(other.hostname_or_uuid())
    }
}
