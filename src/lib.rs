//! Shared graph cache and QoS negotiation engine for ROS 2-style DDS
//! middleware.
//!
//! This crate tracks the distributed discovery graph -- participants,
//! nodes, readers, writers, and their QoS -- the way
//! [rmw_dds_common](https://github.com/ros2/rmw_dds_common) does, and
//! negotiates QoS compatibility and BEST_AVAILABLE resolution over it. It
//! is deliberately independent of any one DDS vendor SDK: a hosting
//! middleware supplies its own GUID type, discovery transport, and
//! publisher through the small traits in [`gid`], [`listener`], and
//! [`context`].
//!
//! # Example
//!
//! ```
//! use ros2_graph_cache::{Context, ContextOptions, Gid};
//! use ros2_graph_cache::context::DiscoveryPublisher;
//! use ros2_graph_cache::entities_info::ParticipantEntitiesInfo;
//! use ros2_graph_cache::error::GraphResult;
//!
//! struct NullPublisher;
//! impl DiscoveryPublisher for NullPublisher {
//!   fn publish(&self, _message: &ParticipantEntitiesInfo) -> GraphResult<()> {
//!     Ok(())
//!   }
//! }
//!
//! let participant = Gid::from_bytes([1u8; 24]);
//! let context = Context::new(participant, ContextOptions::new().domain_id(0), NullPublisher);
//! context.add_node("listener", "/");
//! assert_eq!(context.cache().get_number_of_nodes(), 1);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod context;
pub mod entities_info;
pub mod error;
pub mod gid;
pub mod graph_cache;
pub mod listener;
pub mod qos;

#[doc(inline)]
pub use context::{Context, ContextOptions};
#[doc(inline)]
pub use error::{GraphError, GraphResult};
#[doc(inline)]
pub use gid::{Gid, NativeGuid};
#[doc(inline)]
pub use graph_cache::{EndpointInfo, GraphCache, NodeOrigin};
#[doc(inline)]
pub use qos::{
  check_compatible, resolve_for_topic, CompatibilityReport, QosProfile, TypeHash, Verdict,
};
