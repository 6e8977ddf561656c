//! Scheduler-facing nodes
//!
//! [`SchedulerNode`] is the autoscaler's view of a node reported by the job
//! scheduler: only the hostname is certain, the cloud id is delayed and the
//! private address is looked up on a best-effort basis. [`TempNode`] has the
//! same shape but lets callers override any field, which is how hypothetical
//! and test nodes are synthesized.

use super::base::Node;
use super::overrides::NodeOverrides;
use super::resolver::{DisabledResolver, HostResolver, SystemResolver};
use super::types::{Memory, NodeId, NodeStatus, Resources};
use crate::error::{Result, ScaleError};
use crate::ident::{IdGenerator, RandomUuid};
use serde_json::{json, Map, Value};
use std::fmt;
use std::net::IpAddr;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::debug;

const UNKNOWN: &str = "unknown";

/// Collaborators used while constructing nodes
#[derive(Clone)]
pub struct NodeContext {
    resolver: Arc<dyn HostResolver>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for NodeContext {
    fn default() -> Self {
        Self {
            resolver: Arc::new(SystemResolver),
            ids: Arc::new(RandomUuid),
        }
    }
}

impl NodeContext {
    /// Context from explicit collaborators
    pub fn new(resolver: Arc<dyn HostResolver>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { resolver, ids }
    }

    /// Context that never touches DNS
    pub fn hermetic() -> Self {
        Self::default().with_resolver(DisabledResolver)
    }

    /// Replace the resolver
    pub fn with_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replace the identifier generator
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Host resolver in use
    pub fn resolver(&self) -> &dyn HostResolver {
        self.resolver.as_ref()
    }

    /// Identifier generator in use
    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext").finish_non_exhaustive()
    }
}

/// Defaults shared by both scheduler node flavours
fn scheduler_defaults(
    ctx: &NodeContext,
    hostname: &str,
    resources: Option<Resources>,
    bucket_id: Option<&str>,
    private_ip: Option<IpAddr>,
) -> Result<Node> {
    if hostname.is_empty() {
        return Err(ScaleError::InvalidHostname(hostname.to_string()));
    }

    let bucket_id = match bucket_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ctx.ids().generate("bucket"),
    };

    Ok(Node {
        node_id: NodeId::delayed(hostname),
        name: hostname.to_string(),
        nodearray: UNKNOWN.to_string(),
        bucket_id,
        hostname: Some(hostname.to_string()),
        private_ip,
        instance_id: None,
        vm_size: UNKNOWN.to_string(),
        location: UNKNOWN.to_string(),
        spot: false,
        vcpu_count: 1,
        pcpu_count: 1,
        gpu_count: 0,
        memory: Memory::default(),
        infiniband: false,
        state: NodeStatus::running(),
        target_state: NodeStatus::running(),
        power_state: NodeStatus::running(),
        exists: true,
        placement_group: None,
        managed: false,
        resources: resources.unwrap_or_default(),
        software_configuration: Resources::new(),
        keep_alive: false,
        fallback_id: ctx.ids().generate("node"),
    })
}

/// Base snapshot plus the capacity fields reports always expect
fn scheduler_dict(node: &Node) -> Map<String, Value> {
    let mut ret = node.to_dict();
    ret.insert("memory".into(), json!(node.memory()));
    ret.insert("vcpu-count".into(), json!(node.vcpu_count()));
    ret.insert("pcpu-count".into(), json!(node.pcpu_count()));
    ret.insert("gpu-count".into(), json!(node.gpu_count()));
    ret
}

/// A node as reported by the job scheduler
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchedulerNode(Node);

impl SchedulerNode {
    /// Build a scheduler node, resolving its address through the system resolver
    pub fn new(
        hostname: &str,
        resources: Option<Resources>,
        bucket_id: Option<&str>,
    ) -> Result<Self> {
        Self::with_context(&NodeContext::default(), hostname, resources, bucket_id)
    }

    /// Build a scheduler node with explicit collaborators
    pub fn with_context(
        ctx: &NodeContext,
        hostname: &str,
        resources: Option<Resources>,
        bucket_id: Option<&str>,
    ) -> Result<Self> {
        // scheduler_defaults checks this too, but only after the lookup
        if hostname.is_empty() {
            return Err(ScaleError::InvalidHostname(hostname.to_string()));
        }
        let private_ip = ctx.resolver().resolve(hostname);
        let node = scheduler_defaults(ctx, hostname, resources, bucket_id, private_ip)?;
        debug!(hostname, bucket_id = node.bucket_id(), "Created scheduler node");
        Ok(SchedulerNode(node))
    }

    /// Snapshot including `memory`, `vcpu-count`, `pcpu-count` and `gpu-count`
    pub fn to_dict(&self) -> Map<String, Value> {
        scheduler_dict(&self.0)
    }

    /// Unwrap into the base node
    pub fn into_node(self) -> Node {
        self.0
    }
}

impl Deref for SchedulerNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl DerefMut for SchedulerNode {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.0
    }
}

impl fmt::Display for SchedulerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scheduler{}", self.0)
    }
}

impl fmt::Debug for SchedulerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scheduler{:?}", self.0)
    }
}

/// A synthetic node whose every field may be overridden
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempNode(Node);

impl TempNode {
    /// Build a temp node with scheduler defaults and no private address
    pub fn new(
        hostname: &str,
        resources: Option<Resources>,
        bucket_id: Option<&str>,
    ) -> Result<Self> {
        Self::with_overrides(hostname, resources, bucket_id, NodeOverrides::default())
    }

    /// Build a temp node and apply `overrides` on top of the defaults
    pub fn with_overrides(
        hostname: &str,
        resources: Option<Resources>,
        bucket_id: Option<&str>,
        overrides: NodeOverrides,
    ) -> Result<Self> {
        Self::with_context(&NodeContext::hermetic(), hostname, resources, bucket_id, overrides)
    }

    /// Build a temp node with explicit collaborators
    pub fn with_context(
        ctx: &NodeContext,
        hostname: &str,
        resources: Option<Resources>,
        bucket_id: Option<&str>,
        overrides: NodeOverrides,
    ) -> Result<Self> {
        let mut node = scheduler_defaults(ctx, hostname, resources, bucket_id, None)?;
        overrides.apply(&mut node)?;
        Ok(TempNode(node))
    }

    /// Apply further overrides
    pub fn apply(&mut self, overrides: NodeOverrides) -> Result<()> {
        overrides.apply(&mut self.0)
    }

    /// Snapshot including `memory`, `vcpu-count`, `pcpu-count` and `gpu-count`
    pub fn to_dict(&self) -> Map<String, Value> {
        scheduler_dict(&self.0)
    }

    /// Unwrap into the base node
    pub fn into_node(self) -> Node {
        self.0
    }
}

impl Deref for TempNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl DerefMut for TempNode {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.0
    }
}

impl fmt::Display for TempNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Temp{}", self.0)
    }
}

impl fmt::Debug for TempNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Temp{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::IncrementingUuid;
    use crate::node::StaticResolver;
    use crate::partition::{partition, partition_single};
    use std::net::Ipv4Addr;

    fn ctx() -> NodeContext {
        NodeContext::hermetic().with_id_generator(IncrementingUuid::new())
    }

    #[test]
    fn test_scheduler_defaults() {
        let node = SchedulerNode::with_context(&ctx(), "htc-1", None, None).unwrap();

        assert_eq!(node.hostname(), Some("htc-1"));
        assert_eq!(node.name(), "htc-1");
        assert_eq!(node.node_id(), &NodeId::delayed("htc-1"));
        assert_eq!(node.bucket_id(), "bucket-0");
        assert_eq!(node.nodearray(), "unknown");
        assert_eq!(node.vm_size(), "unknown");
        assert_eq!(node.vcpu_count(), 1);
        assert_eq!(node.memory().bytes(), 0);
        assert!(node.exists());
        assert!(!node.managed());
        assert!(!node.keep_alive());
        assert!(node.resources().is_empty());
        assert_eq!(node.state(), &NodeStatus::running());
        assert_eq!(node.target_state(), &NodeStatus::running());
        assert_eq!(node.power_state(), &NodeStatus::running());
        assert_eq!(node.private_ip(), None);
    }

    #[test]
    fn test_bucket_id_supplied_or_generated() {
        let ctx = ctx();
        let supplied = SchedulerNode::with_context(&ctx, "a", None, Some("b1")).unwrap();
        assert_eq!(supplied.bucket_id(), "b1");

        let empty = SchedulerNode::with_context(&ctx, "b", None, Some("")).unwrap();
        assert_eq!(empty.bucket_id(), "bucket-0");

        let random = SchedulerNode::with_context(&NodeContext::hermetic(), "c", None, None)
            .unwrap();
        assert!(!random.bucket_id().is_empty());
    }

    #[test]
    fn test_empty_hostname_rejected() {
        let err = SchedulerNode::with_context(&ctx(), "", None, None).unwrap_err();
        assert!(matches!(err, ScaleError::InvalidHostname(_)));
        assert!(TempNode::new("", None, None).is_err());
    }

    #[test]
    fn test_unresolvable_hostname_succeeds() {
        let ctx = ctx().with_resolver(StaticResolver::new());
        let node = SchedulerNode::with_context(&ctx, "htc-404", None, None).unwrap();
        assert_eq!(node.private_ip(), None);
        assert_eq!(node.hostname(), Some("htc-404"));
        assert!(node.to_dict()["private-ip"].is_null());
    }

    #[test]
    fn test_private_ip_from_resolver() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        let ctx = ctx().with_resolver(StaticResolver::new().with_entry("htc-7", ip));
        let node = SchedulerNode::with_context(&ctx, "htc-7", None, None).unwrap();
        assert_eq!(node.private_ip(), Some(ip));
        assert_eq!(node.to_dict()["private-ip"], json!("10.0.0.7"));
    }

    #[test]
    fn test_to_dict_capacity_fields() {
        let mut resources = Resources::new();
        resources.insert("slots".to_string(), json!(4));
        let mut node = SchedulerNode::with_context(&ctx(), "htc-1", Some(resources), None).unwrap();
        node.set_vcpu_count(4);
        node.set_memory(Memory::from_gib(16.0));

        let dict = node.to_dict();
        assert_eq!(dict["vcpu-count"], json!(4));
        assert_eq!(dict["pcpu-count"], json!(1));
        assert_eq!(dict["gpu-count"], json!(0));
        assert_eq!(dict["memory"], json!("16.00g"));
        assert_eq!(dict["hostname"], json!("htc-1"));
        assert_eq!(dict["node-id"], json!("delayed:htc-1"));
        assert_eq!(dict["resources"], json!({"slots": 4}));
        assert_eq!(dict["state"], json!("running"));
    }

    #[test]
    fn test_ordering_by_hostname() {
        let ctx = ctx();
        let mut nodes: Vec<SchedulerNode> = ["b", "a", "c"]
            .iter()
            .map(|h| SchedulerNode::with_context(&ctx, h, None, None).unwrap())
            .collect();
        nodes.sort();

        let hostnames: Vec<&str> = nodes.iter().filter_map(|n| n.hostname()).collect();
        assert_eq!(hostnames, vec!["a", "b", "c"]);
        assert!(nodes[0] < nodes[1]);
    }

    #[test]
    fn test_display_prefixes() {
        let ctx = ctx();
        let scheduler = SchedulerNode::with_context(&ctx, "htc-1", None, None).unwrap();
        let temp = TempNode::with_context(&ctx, "htc-2", None, None, NodeOverrides::default())
            .unwrap();

        assert_eq!(
            scheduler.to_string(),
            "SchedulerNode(htc-1, htc-1, unknown, delayed:htc-1)"
        );
        assert_eq!(temp.to_string(), "TempNode(htc-2, htc-2, unknown, delayed:htc-2)");
        assert!(format!("{:?}", scheduler).starts_with("SchedulerNode {"));
        assert!(format!("{:?}", temp).starts_with("TempNode {"));
    }

    #[test]
    fn test_resolving_delayed_node_id() {
        let mut node = SchedulerNode::with_context(&ctx(), "htc-1", None, None).unwrap();
        node.resolve_node_id("vm-1");
        node.set_instance_id("i-123");
        assert_eq!(node.node_id().value(), Some("vm-1"));
        assert_eq!(node.instance_id(), Some("i-123"));
        // ordering key is unaffected
        assert_eq!(node.hostname_or_uuid(), "htc-1");
    }

    #[test]
    fn test_temp_node_overrides() {
        let overrides = NodeOverrides {
            vcpu_count: Some(0),
            vm_size: Some("Standard_F2".to_string()),
            exists: Some(false),
            placement_group: Some("pg0".to_string()),
            state: Some(NodeStatus::new("deallocated")),
            ..Default::default()
        };
        let node = TempNode::with_context(&ctx(), "tmp-1", None, Some("b1"), overrides).unwrap();

        assert_eq!(node.vcpu_count(), 0);
        assert_eq!(node.pcpu_count(), 0);
        assert_eq!(node.vm_size(), "Standard_F2");
        assert!(!node.exists());
        assert_eq!(node.placement_group(), Some("pg0"));
        assert_eq!(node.state().as_str(), "deallocated");
        assert_eq!(node.target_state(), &NodeStatus::running());
        assert_eq!(node.bucket_id(), "b1");
        assert_eq!(node.private_ip(), None);
    }

    #[test]
    fn test_temp_node_overrides_from_json() {
        let overrides = NodeOverrides::from_value(json!({
            "gpu_count": 8,
            "memory": 1024,
            "private_ip": "10.1.2.3",
            "node_id": {"resolved": "vm-9"},
        }))
        .unwrap();
        let mut node = TempNode::with_context(&ctx(), "gpu-1", None, None, overrides).unwrap();

        assert_eq!(node.gpu_count(), 8);
        assert_eq!(node.memory().bytes(), 1024);
        assert_eq!(node.private_ip(), Some(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))));
        assert_eq!(node.node_id().value(), Some("vm-9"));

        node.apply(NodeOverrides {
            keep_alive: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert!(node.keep_alive());
        node.set_exists(false);
        assert!(!node.exists());
    }

    #[test]
    fn test_invalid_overrides() {
        assert!(NodeOverrides::from_value(json!({"no_such_field": 1})).is_err());

        let empty_host = NodeOverrides {
            hostname: Some(String::new()),
            ..Default::default()
        };
        let err = TempNode::with_overrides("tmp-1", None, None, empty_host).unwrap_err();
        assert!(matches!(err, ScaleError::InvalidHostname(_)));

        let empty_bucket = NodeOverrides {
            bucket_id: Some(String::new()),
            ..Default::default()
        };
        assert!(TempNode::with_overrides("tmp-1", None, None, empty_bucket).is_err());
    }

    #[test]
    fn test_failed_apply_leaves_node_unchanged() {
        let mut node = TempNode::with_context(&ctx(), "tmp-1", None, Some("b1"), NodeOverrides::default())
            .unwrap();

        let err = node
            .apply(NodeOverrides {
                hostname: Some("other".to_string()),
                bucket_id: Some(String::new()),
                vcpu_count: Some(8),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ScaleError::Config(_)));
        assert_eq!(node.hostname(), Some("tmp-1"));
        assert_eq!(node.bucket_id(), "b1");
        assert_eq!(node.vcpu_count(), 1);

        let err = node
            .apply(NodeOverrides {
                hostname: Some(String::new()),
                vm_size: Some("Standard_F2".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ScaleError::InvalidHostname(_)));
        assert_eq!(node.hostname(), Some("tmp-1"));
        assert_eq!(node.vm_size(), "unknown");
    }

    #[test]
    fn test_group_nodes_by_bucket() {
        let ctx = ctx();
        let nodes = vec![
            SchedulerNode::with_context(&ctx, "a1", None, Some("b-a")).unwrap(),
            SchedulerNode::with_context(&ctx, "b1", None, Some("b-b")).unwrap(),
            SchedulerNode::with_context(&ctx, "a2", None, Some("b-a")).unwrap(),
        ];

        let by_bucket = partition(nodes.clone(), |n| n.bucket_id().to_string());
        assert_eq!(by_bucket["b-a"].len(), 2);
        assert_eq!(by_bucket["b-b"].len(), 1);

        let by_host = partition_single(nodes.clone(), |n| n.hostname_or_uuid().to_string())
            .unwrap();
        assert_eq!(by_host.len(), 3);

        let err = partition_single(nodes, |n| n.bucket_id().to_string()).unwrap_err();
        match err {
            ScaleError::PartitionCardinality { key, values } => {
                assert_eq!(key, "\"b-a\"");
                assert_eq!(values.len(), 2);
                assert!(values[0].starts_with("SchedulerNode {"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
