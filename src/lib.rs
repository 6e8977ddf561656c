//! # ScaleLib - Scheduler Node Tooling for HPC Autoscalers
//!
//! ScaleLib provides the pieces an HPC autoscaler needs around its allocation
//! engine:
//!
//! - **Scheduler nodes**: the job scheduler's view of a compute node, with a
//!   delayed cloud identity and a best-effort private address
//! - **Singleton locking**: only one autoscaler instance acts on an
//!   environment at a time, on POSIX and Windows alike
//! - **Grouping and ids**: order-preserving partitioning and pluggable,
//!   test-friendly identifier generation
//!
//! ## Quick Start
//!
//! ```no_run
//! use scalelib::config::AutoscaleConfig;
//! use scalelib::lock::new_singleton_lock;
//! use scalelib::node::SchedulerNode;
//! use scalelib::partition::partition;
//!
//! let config = AutoscaleConfig::from_json_str("{}").unwrap();
//! let mut lock = new_singleton_lock(&config).unwrap();
//!
//! let mut nodes = vec![
//!     SchedulerNode::new("htc-2", None, Some("bucket-a")).unwrap(),
//!     SchedulerNode::new("htc-1", None, Some("bucket-a")).unwrap(),
//! ];
//! nodes.sort();
//!
//! let by_bucket = partition(nodes, |n| n.bucket_id().to_string());
//! assert_eq!(by_bucket["bucket-a"].len(), 2);
//!
//! lock.unlock().unwrap();
//! ```
//!
//! ## Deterministic Tests
//!
//! ```
//! use scalelib::ident::IncrementingUuid;
//! use scalelib::node::{NodeContext, SchedulerNode};
//!
//! let ctx = NodeContext::hermetic().with_id_generator(IncrementingUuid::new());
//! let node = SchedulerNode::with_context(&ctx, "htc-1", None, None).unwrap();
//! assert_eq!(node.bucket_id(), "bucket-0");
//! assert_eq!(node.private_ip(), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod ident;
pub mod lock;
pub mod node;
pub mod partition;

// Re-export commonly used types
pub use config::AutoscaleConfig;
pub use error::{Result, ScaleError};
pub use lock::{new_singleton_lock, SingletonLock};
pub use node::{SchedulerNode, TempNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use scalelib::prelude::*;
    //! ```

    pub use crate::config::{AutoscaleConfig, LockFileSetting};
    pub use crate::error::{Result, ScaleError};
    pub use crate::ident::{uuid, IdGenerator, IncrementingUuid, RandomUuid};
    pub use crate::lock::{new_singleton_lock, FileSingletonLock, NullSingletonLock, SingletonLock};
    pub use crate::node::{
        Node, NodeContext, NodeOverrides, Resources, SchedulerNode, TempNode,
    };
    pub use crate::partition::{partition, partition_single};
}
