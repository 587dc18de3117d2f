//! Message types for ROS 2-style discovery, plus the cache-internal
//! records built on top of them.
//!
//! For background, see
//! [Node to Participant mapping](https://design.ros2.org/articles/Node_to_Participant_mapping.html).
//!
//! `NodeEntitiesInfo` and `ParticipantEntitiesInfo` are the wire schema
//!: any serialization can carry them, so they derive only
//! `Serialize`/`Deserialize`, never anything that depends on a specific
//! transport. `EntityInfo` and `ParticipantInfo` are this crate's
//! internal cache records and are never sent over the wire directly.

use serde::{Deserialize, Serialize};

use crate::gid::Gid;
use crate::qos::{QosProfile, TypeHash};

/// Information about a single writer or reader, as tracked by the graph
/// cache (EntityInfo). Immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
  pub topic_name: String,
  pub topic_type: String,
  pub topic_type_hash: TypeHash,
  pub participant_gid: Gid,
  pub qos: QosProfile,
}

/// Which side of a pub/sub pair an [`EntityInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
  Writer,
  Reader,
}

/// A ROS 2 node and how it maps onto DDS entities: the reader/writer
/// Gids it owns within one DomainParticipant.
///
/// See [NodeEntitiesInfo](https://github.com/ros2/rmw_dds_common/blob/master/rmw_dds_common/msg/NodeEntitiesInfo.msg).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntitiesInfo {
  pub node_name: String,
  pub node_namespace: String,
  pub reader_gid_seq: Vec<Gid>,
  pub writer_gid_seq: Vec<Gid>,
}

impl NodeEntitiesInfo {
  pub fn new(node_name: impl Into<String>, node_namespace: impl Into<String>) -> NodeEntitiesInfo {
    NodeEntitiesInfo {
      node_name: node_name.into(),
      node_namespace: node_namespace.into(),
      reader_gid_seq: Vec::new(),
      writer_gid_seq: Vec::new(),
    }
  }

  pub fn key(&self) -> (&str, &str) {
    (self.node_name.as_str(), self.node_namespace.as_str())
  }

  /// Append `gid` if not already present. Returns whether the list
  /// actually changed.
  pub fn add_reader(&mut self, gid: Gid) -> bool {
    if self.reader_gid_seq.contains(&gid) {
      false
    } else {
      self.reader_gid_seq.push(gid);
      true
    }
  }

  /// Append `gid` if not already present. Returns whether the list
  /// actually changed.
  pub fn add_writer(&mut self, gid: Gid) -> bool {
    if self.writer_gid_seq.contains(&gid) {
      false
    } else {
      self.writer_gid_seq.push(gid);
      true
    }
  }

  pub fn remove_reader(&mut self, gid: Gid) -> bool {
    remove_first(&mut self.reader_gid_seq, gid)
  }

  pub fn remove_writer(&mut self, gid: Gid) -> bool {
    remove_first(&mut self.writer_gid_seq, gid)
  }

  pub fn gid_seq(&self, kind: EndpointKind) -> &[Gid] {
    match kind {
      EndpointKind::Writer => &self.writer_gid_seq,
      EndpointKind::Reader => &self.reader_gid_seq,
    }
  }
}

fn remove_first(seq: &mut Vec<Gid>, gid: Gid) -> bool {
  if let Some(pos) = seq.iter().position(|g| *g == gid) {
    seq.remove(pos);
    true
  } else {
    false
  }
}

/// Wire message describing one DomainParticipant's full set of ROS 2
/// nodes. Each time a node's endpoint associations change, a fresh copy
/// of this message overwrites whatever the peer previously knew --
/// `update_participant_entities` replaces, never merges.
///
/// See [ParticipantEntitiesInfo](https://github.com/ros2/rmw_dds_common/blob/master/rmw_dds_common/msg/ParticipantEntitiesInfo.msg).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantEntitiesInfo {
  pub gid: Gid,
  pub node_entities_info_seq: Vec<NodeEntitiesInfo>,
}

impl ParticipantEntitiesInfo {
  pub fn new(gid: Gid, node_entities_info_seq: Vec<NodeEntitiesInfo>) -> ParticipantEntitiesInfo {
    ParticipantEntitiesInfo {
      gid,
      node_entities_info_seq,
    }
  }
}

/// Cache-internal record of one participant: its enclave plus the nodes
/// it has (locally or via a peer message) reported owning.
#[derive(Debug, Clone, Default)]
pub struct ParticipantInfo {
  pub enclave: String,
  pub node_entities_info_seq: Vec<NodeEntitiesInfo>,
}

impl ParticipantInfo {
  pub fn new(enclave: impl Into<String>) -> ParticipantInfo {
    ParticipantInfo {
      enclave: enclave.into(),
      node_entities_info_seq: Vec::new(),
    }
  }

  pub fn find_node(&self, name: &str, namespace: &str) -> Option<&NodeEntitiesInfo> {
    self
      .node_entities_info_seq
      .iter()
      .find(|n| n.node_name == name && n.node_namespace == namespace)
  }

  pub fn find_node_mut(&mut self, name: &str, namespace: &str) -> Option<&mut NodeEntitiesInfo> {
    self
      .node_entities_info_seq
      .iter_mut()
      .find(|n| n.node_name == name && n.node_namespace == namespace)
  }
}
