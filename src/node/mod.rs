//! Node model
//!
//! Provides the base [`Node`] capability and the scheduler-facing
//! [`SchedulerNode`] and [`TempNode`] built on top of it.

mod base;
mod overrides;
pub mod resolver;
mod scheduler;
mod types;

pub use base::Node;
pub use overrides::NodeOverrides;
pub use resolver::{DisabledResolver, HostResolver, StaticResolver, SystemResolver};
pub use scheduler::{NodeContext, SchedulerNode, TempNode};
pub use types::{Memory, NodeId, NodeStatus, Resources};
