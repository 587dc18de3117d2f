//! The Graph Cache: a concurrent in-memory projection of the distributed
//! discovery graph.
//!
//! A single [`std::sync::Mutex`] protects three maps -- writers, readers,
//! participants -- all keyed by [`Gid`] and kept in `BTreeMap`s so that
//! iteration (introspection queries, the debug dump) is deterministic.
//! Every public operation, mutation or query, takes the lock for its
//! entire duration -- coarse-grained locking is deliberate here: the
//! cache is on the control plane, not the data plane, and a single lock
//! avoids ordering discipline across three maps when one logical
//! operation spans more than one of them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Mutex;

use log::{debug, trace};

use crate::entities_info::{EndpointKind, EntityInfo, NodeEntitiesInfo, ParticipantEntitiesInfo, ParticipantInfo};
use crate::error::{GraphError, GraphResult};
use crate::gid::Gid;
use crate::qos::QosProfile;

/// Placeholder node name used when an endpoint's participant is known but
/// no peer-reported node has claimed it yet.
pub const NODE_NAME_UNKNOWN: &str = "_NODE_NAME_UNKNOWN_";
/// Placeholder node namespace, paired with [`NODE_NAME_UNKNOWN`].
pub const NODE_NAMESPACE_UNKNOWN: &str = "_NODE_NAMESPACE_UNKNOWN_";
/// Placeholder node name used when an endpoint's participant is not in
/// the cache at all -- a DDS application with no ROS 2 layer above it.
pub const BARE_DDS_PARTICIPANT_NAME: &str = "_CREATED_BY_BARE_DDS_APP_";

/// Outcome of the endpoint -> node reverse lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
  /// The endpoint is claimed by a node in the owning participant's list.
  RosNode,
  /// The owning participant is known, but no node claims this endpoint
  /// yet -- the peer's `ParticipantEntitiesInfo` has not arrived, or not
  /// been processed, yet.
  UndiscoveredRosNode,
  /// The owning participant is not in the cache at all: a non-framework
  /// DDS application publishing on the same topics.
  BareDdsParticipant,
}

/// One row of a by-topic endpoint query: everything a caller needs to
/// display or act on a single writer or reader.
#[derive(Debug, Clone)]
pub struct EndpointInfo {
  pub node_name: String,
  pub node_namespace: String,
  pub topic_type: String,
  pub topic_type_hash: crate::qos::TypeHash,
  pub kind: EndpointKind,
  pub gid: Gid,
  pub qos: QosProfile,
}

type ChangeCallback = Box<dyn FnMut() + Send>;

struct Inner {
  writers: BTreeMap<Gid, EntityInfo>,
  readers: BTreeMap<Gid, EntityInfo>,
  participants: BTreeMap<Gid, ParticipantInfo>,
  on_change: Option<ChangeCallback>,
}

/// The concurrent graph cache. Cloneable handles are not provided
/// directly -- wrap in `Arc<GraphCache>` to share across threads, which
/// is how [`crate::context::Context`] and the listener worker use it.
pub struct GraphCache {
  inner: Mutex<Inner>,
}

impl Default for GraphCache {
  fn default() -> Self {
    GraphCache::new()
  }
}

impl GraphCache {
  pub fn new() -> GraphCache {
    GraphCache {
      inner: Mutex::new(Inner {
        writers: BTreeMap::new(),
        readers: BTreeMap::new(),
        participants: BTreeMap::new(),
        on_change: None,
      }),
    }
  }

  // -- change notification ------------------------------------------------

  /// Install the cache-change callback, replacing any previous one. The
  /// callback runs synchronously, with the cache lock held -- it must not
  /// call back into the cache, and should be short.
  pub fn set_change_callback<F>(&self, callback: F)
  where
    F: FnMut() + Send + 'static,
  {
    self.inner.lock().unwrap().on_change = Some(Box::new(callback));
  }

  /// Remove the cache-change callback, if any.
  pub fn clear_change_callback(&self) {
    self.inner.lock().unwrap().on_change = None;
  }

  fn notify(inner: &mut Inner) {
    if let Some(cb) = inner.on_change.as_mut() {
      cb();
    }
  }

  // -- DDS discovery plane -------------------------------------------------

  pub fn add_writer(
    &self,
    gid: Gid,
    topic_name: impl Into<String>,
    topic_type: impl Into<String>,
    topic_type_hash: crate::qos::TypeHash,
    participant_gid: Gid,
    qos: QosProfile,
  ) -> bool {
    self.add_entity(
      gid,
      topic_name,
      topic_type,
      topic_type_hash,
      participant_gid,
      qos,
      EndpointKind::Writer,
    )
  }

  pub fn add_reader(
    &self,
    gid: Gid,
    topic_name: impl Into<String>,
    topic_type: impl Into<String>,
    topic_type_hash: crate::qos::TypeHash,
    participant_gid: Gid,
    qos: QosProfile,
  ) -> bool {
    self.add_entity(
      gid,
      topic_name,
      topic_type,
      topic_type_hash,
      participant_gid,
      qos,
      EndpointKind::Reader,
    )
  }

  /// Legacy form of [`Self::add_writer`] for callers that predate
  /// type-hash discovery; equivalent to passing [`crate::qos::TypeHash::UNSET`].
  pub fn add_writer_without_type_hash(
    &self,
    gid: Gid,
    topic_name: impl Into<String>,
    topic_type: impl Into<String>,
    participant_gid: Gid,
    qos: QosProfile,
  ) -> bool {
    self.add_writer(
      gid,
      topic_name,
      topic_type,
      crate::qos::TypeHash::UNSET,
      participant_gid,
      qos,
    )
  }

  /// Legacy form of [`Self::add_reader`]; see [`Self::add_writer_without_type_hash`].
  pub fn add_reader_without_type_hash(
    &self,
    gid: Gid,
    topic_name: impl Into<String>,
    topic_type: impl Into<String>,
    participant_gid: Gid,
    qos: QosProfile,
  ) -> bool {
    self.add_reader(
      gid,
      topic_name,
      topic_type,
      crate::qos::TypeHash::UNSET,
      participant_gid,
      qos,
    )
  }

  /// Combined form dispatching to [`Self::add_writer`]/[`Self::add_reader`].
  #[allow(clippy::too_many_arguments)]
  pub fn add_entity(
    &self,
    gid: Gid,
    topic_name: impl Into<String>,
    topic_type: impl Into<String>,
    topic_type_hash: crate::qos::TypeHash,
    participant_gid: Gid,
    qos: QosProfile,
    kind: EndpointKind,
  ) -> bool {
    let mut inner = self.inner.lock().unwrap();
    let map = match kind {
      EndpointKind::Writer => &mut inner.writers,
      EndpointKind::Reader => &mut inner.readers,
    };
    if map.contains_key(&gid) {
      trace!("add_entity: {gid:?} already present, no-op");
      return false;
    }
    map.insert(
      gid,
      EntityInfo {
        topic_name: topic_name.into(),
        topic_type: topic_type.into(),
        topic_type_hash,
        participant_gid,
        qos,
      },
    );
    debug!("add_entity: inserted {gid:?} ({kind:?})");
    GraphCache::notify(&mut inner);
    true
  }

  pub fn remove_writer(&self, gid: Gid) -> bool {
    self.remove_entity(gid, EndpointKind::Writer)
  }

  pub fn remove_reader(&self, gid: Gid) -> bool {
    self.remove_entity(gid, EndpointKind::Reader)
  }

  pub fn remove_entity(&self, gid: Gid, kind: EndpointKind) -> bool {
    let mut inner = self.inner.lock().unwrap();
    let map = match kind {
      EndpointKind::Writer => &mut inner.writers,
      EndpointKind::Reader => &mut inner.readers,
    };
    let removed = map.remove(&gid).is_some();
    if removed {
      debug!("remove_entity: erased {gid:?} ({kind:?})");
      GraphCache::notify(&mut inner);
    }
    removed
  }

  // -- participant plane ----------------------------------------------------

  /// Insert a participant, or update its enclave if already present,
  /// preserving any existing node list. Returns whether the enclave
  /// value actually changed.
  pub fn add_participant(&self, gid: Gid, enclave: impl Into<String>) -> bool {
    let enclave = enclave.into();
    let mut inner = self.inner.lock().unwrap();
    let changed = match inner.participants.get_mut(&gid) {
      Some(existing) => {
        let changed = existing.enclave != enclave;
        existing.enclave = enclave;
        changed
      }
      None => {
        inner.participants.insert(gid, ParticipantInfo::new(enclave));
        true
      }
    };
    if changed {
      debug!("add_participant: {gid:?} updated");
      GraphCache::notify(&mut inner);
    }
    changed
  }

  pub fn remove_participant(&self, gid: Gid) -> bool {
    let mut inner = self.inner.lock().unwrap();
    let removed = inner.participants.remove(&gid).is_some();
    if removed {
      debug!("remove_participant: erased {gid:?}");
      GraphCache::notify(&mut inner);
    }
    removed
  }

  // -- peer discovery plane ---------------------------------------------

  /// Apply a peer-reported `ParticipantEntitiesInfo`: create the
  /// participant if absent (empty enclave) and replace its node list
  /// wholesale. A pre-existing enclave is preserved -- only the node
  /// list is overwritten.
  ///
  /// Always fires the change callback -- this is the authoritative path
  /// for peer-owned node structure, so every call counts as a change
  /// even when the replacement happens to equal the prior value.
  pub fn update_participant_entities(&self, msg: ParticipantEntitiesInfo) {
    let mut inner = self.inner.lock().unwrap();
    inner
      .participants
      .entry(msg.gid)
      .or_insert_with(|| ParticipantInfo::new(String::new()))
      .node_entities_info_seq = msg.node_entities_info_seq;
    debug!("update_participant_entities: {:?}", msg.gid);
    GraphCache::notify(&mut inner);
  }

  // -- local node plane ---------------------------------------------------

  pub fn add_node(
    &self,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> ParticipantEntitiesInfo {
    let mut inner = self.inner.lock().unwrap();
    let participant = inner
      .participants
      .entry(participant_gid)
      .or_insert_with(|| ParticipantInfo::new(String::new()));
    if participant.find_node(node_name, node_namespace).is_none() {
      participant
        .node_entities_info_seq
        .push(NodeEntitiesInfo::new(node_name, node_namespace));
      let snapshot = participant_entities_snapshot(participant, participant_gid);
      debug!("add_node: {node_namespace}/{node_name} on {participant_gid:?}");
      GraphCache::notify(&mut inner);
      snapshot
    } else {
      participant_entities_snapshot(participant, participant_gid)
    }
  }

  pub fn remove_node(
    &self,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    let mut inner = self.inner.lock().unwrap();
    let participant = inner
      .participants
      .get_mut(&participant_gid)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let position = participant
      .node_entities_info_seq
      .iter()
      .position(|n| n.node_name == node_name && n.node_namespace == node_namespace)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    participant.node_entities_info_seq.remove(position);
    let snapshot = participant_entities_snapshot(participant, participant_gid);
    debug!("remove_node: {node_namespace}/{node_name} on {participant_gid:?}");
    GraphCache::notify(&mut inner);
    Ok(snapshot)
  }

  pub fn associate_writer(
    &self,
    writer_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    self.associate(
      writer_gid,
      participant_gid,
      node_name,
      node_namespace,
      EndpointKind::Writer,
    )
  }

  pub fn associate_reader(
    &self,
    reader_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    self.associate(
      reader_gid,
      participant_gid,
      node_name,
      node_namespace,
      EndpointKind::Reader,
    )
  }

  fn associate(
    &self,
    endpoint_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
    kind: EndpointKind,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    let mut inner = self.inner.lock().unwrap();
    let participant = inner
      .participants
      .get_mut(&participant_gid)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let node = participant
      .find_node_mut(node_name, node_namespace)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let changed = match kind {
      EndpointKind::Writer => node.add_writer(endpoint_gid),
      EndpointKind::Reader => node.add_reader(endpoint_gid),
    };
    let snapshot = participant_entities_snapshot(participant, participant_gid);
    if changed {
      GraphCache::notify(&mut inner);
    }
    Ok(snapshot)
  }

  pub fn dissociate_writer(
    &self,
    writer_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    self.dissociate(
      writer_gid,
      participant_gid,
      node_name,
      node_namespace,
      EndpointKind::Writer,
    )
  }

  pub fn dissociate_reader(
    &self,
    reader_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    self.dissociate(
      reader_gid,
      participant_gid,
      node_name,
      node_namespace,
      EndpointKind::Reader,
    )
  }

  fn dissociate(
    &self,
    endpoint_gid: Gid,
    participant_gid: Gid,
    node_name: &str,
    node_namespace: &str,
    kind: EndpointKind,
  ) -> GraphResult<ParticipantEntitiesInfo> {
    let mut inner = self.inner.lock().unwrap();
    let participant = inner
      .participants
      .get_mut(&participant_gid)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let node = participant
      .find_node_mut(node_name, node_namespace)
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let changed = match kind {
      EndpointKind::Writer => node.remove_writer(endpoint_gid),
      EndpointKind::Reader => node.remove_reader(endpoint_gid),
    };
    let snapshot = participant_entities_snapshot(participant, participant_gid);
    if changed {
      GraphCache::notify(&mut inner);
    }
    Ok(snapshot)
  }

  // -- introspection --------------------------------------------------------

  pub fn get_writer_count(&self, topic: &str) -> usize {
    let inner = self.inner.lock().unwrap();
    inner.writers.values().filter(|e| e.topic_name == topic).count()
  }

  pub fn get_reader_count(&self, topic: &str) -> usize {
    let inner = self.inner.lock().unwrap();
    inner.readers.values().filter(|e| e.topic_name == topic).count()
  }

  pub fn get_writers_info_by_topic(
    &self,
    topic: &str,
    demangle_type: impl Fn(&str) -> String,
  ) -> Vec<EndpointInfo> {
    self.endpoints_info_by_topic(topic, EndpointKind::Writer, demangle_type)
  }

  pub fn get_readers_info_by_topic(
    &self,
    topic: &str,
    demangle_type: impl Fn(&str) -> String,
  ) -> Vec<EndpointInfo> {
    self.endpoints_info_by_topic(topic, EndpointKind::Reader, demangle_type)
  }

  fn endpoints_info_by_topic(
    &self,
    topic: &str,
    kind: EndpointKind,
    demangle_type: impl Fn(&str) -> String,
  ) -> Vec<EndpointInfo> {
    let inner = self.inner.lock().unwrap();
    let map = match kind {
      EndpointKind::Writer => &inner.writers,
      EndpointKind::Reader => &inner.readers,
    };
    map
      .iter()
      .filter(|(_, entity)| entity.topic_name == topic)
      .map(|(gid, entity)| {
        let (_, node_name, node_namespace) =
          Self::resolve_node_locked(&inner.participants, entity.participant_gid, *gid, kind);
        EndpointInfo {
          node_name,
          node_namespace,
          topic_type: demangle_type(&entity.topic_type),
          topic_type_hash: entity.topic_type_hash,
          kind,
          gid: *gid,
          qos: entity.qos,
        }
      })
      .collect()
  }

  /// Reverse lookup: given a participant and an endpoint within it,
  /// report which node (if any) claims the endpoint.
  pub fn resolve_node_for_endpoint(
    &self,
    participant_gid: Gid,
    endpoint_gid: Gid,
    kind: EndpointKind,
  ) -> (NodeOrigin, String, String) {
    let inner = self.inner.lock().unwrap();
    Self::resolve_node_locked(&inner.participants, participant_gid, endpoint_gid, kind)
  }

  fn resolve_node_locked(
    participants: &BTreeMap<Gid, ParticipantInfo>,
    participant_gid: Gid,
    endpoint_gid: Gid,
    kind: EndpointKind,
  ) -> (NodeOrigin, String, String) {
    match participants.get(&participant_gid) {
      None => (
        NodeOrigin::BareDdsParticipant,
        BARE_DDS_PARTICIPANT_NAME.to_owned(),
        BARE_DDS_PARTICIPANT_NAME.to_owned(),
      ),
      Some(participant) => {
        for node in &participant.node_entities_info_seq {
          if node.gid_seq(kind).contains(&endpoint_gid) {
            return (NodeOrigin::RosNode, node.node_name.clone(), node.node_namespace.clone());
          }
        }
        (
          NodeOrigin::UndiscoveredRosNode,
          NODE_NAME_UNKNOWN.to_owned(),
          NODE_NAMESPACE_UNKNOWN.to_owned(),
        )
      }
    }
  }

  /// Union of reader and writer topics, mapped to the set of types
  /// observed for each, after the caller's demangling functions are
  /// applied. Entries whose demangled topic is empty are omitted.
  pub fn get_names_and_types(
    &self,
    demangle_topic: impl Fn(&str) -> String,
    demangle_type: impl Fn(&str) -> String,
  ) -> BTreeMap<String, BTreeSet<String>> {
    let inner = self.inner.lock().unwrap();
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for entity in inner.writers.values().chain(inner.readers.values()) {
      let topic = demangle_topic(&entity.topic_name);
      if topic.is_empty() {
        continue;
      }
      out.entry(topic).or_default().insert(demangle_type(&entity.topic_type));
    }
    out
  }

  pub fn get_writer_names_and_types_by_node(
    &self,
    node_name: &str,
    node_namespace: &str,
    demangle_topic: impl Fn(&str) -> String,
    demangle_type: impl Fn(&str) -> String,
  ) -> GraphResult<BTreeMap<String, BTreeSet<String>>> {
    self.names_and_types_by_node(
      node_name,
      node_namespace,
      EndpointKind::Writer,
      demangle_topic,
      demangle_type,
    )
  }

  pub fn get_reader_names_and_types_by_node(
    &self,
    node_name: &str,
    node_namespace: &str,
    demangle_topic: impl Fn(&str) -> String,
    demangle_type: impl Fn(&str) -> String,
  ) -> GraphResult<BTreeMap<String, BTreeSet<String>>> {
    self.names_and_types_by_node(
      node_name,
      node_namespace,
      EndpointKind::Reader,
      demangle_topic,
      demangle_type,
    )
  }

  fn names_and_types_by_node(
    &self,
    node_name: &str,
    node_namespace: &str,
    kind: EndpointKind,
    demangle_topic: impl Fn(&str) -> String,
    demangle_type: impl Fn(&str) -> String,
  ) -> GraphResult<BTreeMap<String, BTreeSet<String>>> {
    let inner = self.inner.lock().unwrap();
    let node = inner
      .participants
      .values()
      .find_map(|p| p.find_node(node_name, node_namespace))
      .ok_or_else(|| node_not_found(node_name, node_namespace))?;
    let gids: BTreeSet<Gid> = node.gid_seq(kind).iter().copied().collect();
    let map = match kind {
      EndpointKind::Writer => &inner.writers,
      EndpointKind::Reader => &inner.readers,
    };
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (gid, entity) in map.iter().filter(|(gid, _)| gids.contains(gid)) {
      let _ = gid;
      let topic = demangle_topic(&entity.topic_name);
      if topic.is_empty() {
        continue;
      }
      out.entry(topic).or_default().insert(demangle_type(&entity.topic_type));
    }
    Ok(out)
  }

  pub fn get_number_of_nodes(&self) -> usize {
    let inner = self.inner.lock().unwrap();
    inner
      .participants
      .values()
      .map(|p| p.node_entities_info_seq.len())
      .sum()
  }

  /// Three parallel arrays -- names, namespaces, enclaves -- ordered by
  /// participant iteration then each participant's node list. The
  /// enclave array is provided unconditionally; callers who don't need
  /// it (the C API's optional out-param) simply ignore it.
  pub fn get_node_names(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
    let inner = self.inner.lock().unwrap();
    let mut names = Vec::new();
    let mut namespaces = Vec::new();
    let mut enclaves = Vec::new();
    for participant in inner.participants.values() {
      for node in &participant.node_entities_info_seq {
        names.push(node.node_name.clone());
        namespaces.push(node.node_namespace.clone());
        enclaves.push(participant.enclave.clone());
      }
    }
    (names, namespaces, enclaves)
  }

  /// Return the live `ParticipantEntitiesInfo` for `participant_gid`, if
  /// the cache knows it.
  pub fn participant_entities(&self, participant_gid: Gid) -> Option<ParticipantEntitiesInfo> {
    let inner = self.inner.lock().unwrap();
    inner
      .participants
      .get(&participant_gid)
      .map(|p| participant_entities_snapshot(p, participant_gid))
  }
}

fn participant_entities_snapshot(participant: &ParticipantInfo, gid: Gid) -> ParticipantEntitiesInfo {
  ParticipantEntitiesInfo::new(gid, participant.node_entities_info_seq.clone())
}

fn node_not_found(name: &str, namespace: &str) -> GraphError {
  GraphError::NodeNotFound {
    name: name.to_owned(),
    namespace: namespace.to_owned(),
  }
}

impl fmt::Display for GraphCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let inner = self.inner.lock().unwrap();
    writeln!(f, "== Graph Cache ==")?;
    writeln!(f, "-- writers --")?;
    for (gid, entity) in &inner.writers {
      writeln!(f, "{gid:?}, {}, {}", entity.topic_name, entity.topic_type)?;
    }
    writeln!(f, "-- readers --")?;
    for (gid, entity) in &inner.readers {
      writeln!(f, "{gid:?}, {}, {}", entity.topic_name, entity.topic_type)?;
    }
    writeln!(f, "-- participants --")?;
    for (gid, participant) in &inner.participants {
      writeln!(f, "{gid:?}, enclave={}", participant.enclave)?;
      for node in &participant.node_entities_info_seq {
        writeln!(f, "  node {}/{}", node.node_namespace, node.node_name)?;
        writeln!(f, "    readers: {:?}", node.reader_gid_seq)?;
        writeln!(f, "    writers: {:?}", node.writer_gid_seq)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::qos::{QosProfile, TypeHash};

  fn gid(n: u8) -> Gid {
    let mut bytes = [0u8; crate::gid::GID_STORAGE_SIZE];
    bytes[0] = n;
    Gid::from_bytes(bytes)
  }

  fn identity(s: &str) -> String {
    s.to_owned()
  }

  // -- two-peer convergence: local writer plus a peer-reported node --

  #[test]
  fn two_peer_convergence() {
    let cache = GraphCache::new();
    let g1 = gid(1);
    let w1 = gid(2);

    cache.add_participant(g1, "encA");
    cache.add_writer(
      w1,
      "/chatter",
      "std/String",
      TypeHash::UNSET,
      g1,
      QosProfile::conservative(),
    );
    cache.update_participant_entities(ParticipantEntitiesInfo::new(
      g1,
      vec![{
        let mut node = NodeEntitiesInfo::new("talker", "");
        node.add_writer(w1);
        node
      }],
    ));

    let names_and_types = cache.get_names_and_types(identity, identity);
    assert_eq!(names_and_types.len(), 1);
    assert!(names_and_types["/chatter"].contains("std/String"));

    let writers = cache.get_writers_info_by_topic("/chatter", identity);
    assert_eq!(writers.len(), 1);
    assert_eq!(writers[0].node_name, "talker");
    assert_eq!(writers[0].node_namespace, "");
    assert_eq!(writers[0].gid, w1);
  }

  // -- endpoint reported before its participant ---------------------

  #[test]
  fn endpoint_before_participant_reports_bare_dds() {
    let cache = GraphCache::new();
    let unknown_participant = gid(9);
    let w1 = gid(10);
    cache.add_writer(
      w1,
      "/t",
      "T",
      TypeHash::UNSET,
      unknown_participant,
      QosProfile::conservative(),
    );

    let writers = cache.get_writers_info_by_topic("/t", identity);
    assert_eq!(writers.len(), 1);
    assert_eq!(writers[0].node_name, BARE_DDS_PARTICIPANT_NAME);
    assert_eq!(writers[0].node_namespace, BARE_DDS_PARTICIPANT_NAME);
  }

  #[test]
  fn known_participant_without_claimed_endpoint_is_undiscovered() {
    let cache = GraphCache::new();
    let participant = gid(1);
    let w1 = gid(2);
    cache.add_participant(participant, "");
    cache.add_writer(
      w1,
      "/t",
      "T",
      TypeHash::UNSET,
      participant,
      QosProfile::conservative(),
    );
    let writers = cache.get_writers_info_by_topic("/t", identity);
    assert_eq!(writers[0].node_name, NODE_NAME_UNKNOWN);
    assert_eq!(writers[0].node_namespace, NODE_NAMESPACE_UNKNOWN);
  }

  // -- adds/removes reduce to the set difference --------------------------

  #[test]
  fn add_remove_reduces_to_set_difference() {
    let cache = GraphCache::new();
    let participant = gid(0);
    let ids: Vec<Gid> = (1..=5).map(gid).collect();
    for id in &ids {
      cache.add_writer(*id, "/t", "T", TypeHash::UNSET, participant, QosProfile::conservative());
    }
    cache.remove_writer(ids[1]);
    cache.remove_writer(ids[3]);

    assert_eq!(cache.get_writer_count("/t"), 3);
  }

  #[test]
  fn legacy_no_type_hash_form_is_equivalent_to_unset_hash() {
    let cache = GraphCache::new();
    let w = gid(1);
    assert!(cache.add_writer_without_type_hash(w, "/t", "T", gid(0), QosProfile::conservative()));
    let writers = cache.get_writers_info_by_topic("/t", identity);
    assert_eq!(writers[0].topic_type_hash, TypeHash::UNSET);
  }

  // -- idempotent add/remove return values ---------------------------------

  #[test]
  fn add_returns_true_once_then_false() {
    let cache = GraphCache::new();
    let w = gid(1);
    assert!(cache.add_writer(w, "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative()));
    assert!(!cache.add_writer(w, "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative()));
  }

  #[test]
  fn remove_returns_true_exactly_once() {
    let cache = GraphCache::new();
    let w = gid(1);
    cache.add_writer(w, "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative());
    assert!(cache.remove_writer(w));
    assert!(!cache.remove_writer(w));
  }

  // -- local mutation snapshot round-trips through a fresh cache ----------

  #[test]
  fn local_mutation_snapshot_round_trips() {
    let cache = GraphCache::new();
    let participant = gid(1);
    let writer = gid(2);
    cache.add_participant(participant, "enc");
    cache.add_node(participant, "talker", "/");
    let snapshot = cache
      .associate_writer(writer, participant, "talker", "/")
      .unwrap();

    assert_eq!(snapshot.gid, participant);
    assert_eq!(cache.participant_entities(participant).unwrap().node_entities_info_seq, snapshot.node_entities_info_seq);

    let fresh = GraphCache::new();
    fresh.update_participant_entities(snapshot.clone());
    assert_eq!(
      fresh.participant_entities(participant).unwrap().node_entities_info_seq,
      snapshot.node_entities_info_seq
    );
  }

  // -- update_participant_entities replaces, never merges -----------------

  #[test]
  fn update_participant_entities_replaces_not_merges() {
    let cache = GraphCache::new();
    let participant = gid(1);
    cache.update_participant_entities(ParticipantEntitiesInfo::new(
      participant,
      vec![NodeEntitiesInfo::new("a", "/")],
    ));
    cache.update_participant_entities(ParticipantEntitiesInfo::new(
      participant,
      vec![NodeEntitiesInfo::new("b", "/")],
    ));
    let info = cache.participant_entities(participant).unwrap();
    assert_eq!(info.node_entities_info_seq.len(), 1);
    assert_eq!(info.node_entities_info_seq[0].node_name, "b");
  }

  #[test]
  fn update_participant_entities_preserves_existing_enclave() {
    let cache = GraphCache::new();
    let participant = gid(1);
    cache.add_participant(participant, "secure-enclave");
    cache.update_participant_entities(ParticipantEntitiesInfo::new(
      participant,
      vec![NodeEntitiesInfo::new("a", "/")],
    ));
    assert_eq!(
      cache.inner.lock().unwrap().participants[&participant].enclave,
      "secure-enclave"
    );
  }

  // -- change callback fires exactly on state-changing operations ---------

  #[test]
  fn change_callback_counts_state_changes_only() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let cache = GraphCache::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    cache.set_change_callback(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    });

    let w = gid(1);
    assert!(cache.add_writer(w, "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative()));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // no-op add: no notification
    assert!(!cache.add_writer(w, "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative()));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(cache.remove_writer(w));
    assert_eq!(count.load(Ordering::SeqCst), 2);

    // no-op remove: no notification
    assert!(!cache.remove_writer(w));
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  // -- names_and_types covers the reader/writer union ----------------------

  #[test]
  fn names_and_types_covers_union_of_readers_and_writers() {
    let cache = GraphCache::new();
    let participant = gid(0);
    cache.add_writer(gid(1), "/t", "T", TypeHash::UNSET, participant, QosProfile::conservative());
    cache.add_reader(gid(2), "/t", "T", TypeHash::UNSET, participant, QosProfile::conservative());
    let map = cache.get_names_and_types(identity, identity);
    assert_eq!(map.len(), 1);
    assert!(map["/t"].contains("T"));
  }

  // -- by-node query on an unknown node fails cleanly ----------------------

  #[test]
  fn by_node_query_on_unknown_node_fails() {
    let cache = GraphCache::new();
    let result = cache.get_writer_names_and_types_by_node("ghost", "/", identity, identity);
    assert!(matches!(result, Err(GraphError::NodeNotFound { .. })));
  }

  #[test]
  fn remove_node_on_unknown_node_fails() {
    let cache = GraphCache::new();
    let participant = gid(1);
    cache.add_participant(participant, "");
    let result = cache.remove_node(participant, "ghost", "/");
    assert!(matches!(result, Err(GraphError::NodeNotFound { .. })));
  }

  #[test]
  fn associate_writer_on_unknown_node_fails() {
    let cache = GraphCache::new();
    let participant = gid(1);
    cache.add_participant(participant, "");
    let result = cache.associate_writer(gid(2), participant, "ghost", "/");
    assert!(result.is_err());
  }

  #[test]
  fn number_of_nodes_sums_across_participants() {
    let cache = GraphCache::new();
    cache.add_node(gid(1), "a", "/");
    cache.add_node(gid(1), "b", "/");
    cache.add_node(gid(2), "c", "/");
    assert_eq!(cache.get_number_of_nodes(), 3);
  }

  #[test]
  fn dump_contains_all_sections() {
    let cache = GraphCache::new();
    cache.add_writer(gid(1), "/t", "T", TypeHash::UNSET, gid(0), QosProfile::conservative());
    let dump = format!("{cache}");
    assert!(dump.contains("writers"));
    assert!(dump.contains("readers"));
    assert!(dump.contains("participants"));
  }
}

#[cfg(test)]
mod proptests {
  use super::*;
  use crate::qos::{QosProfile, TypeHash};
  use proptest::prelude::*;

  fn gid_strategy() -> impl Strategy<Value = Gid> {
    any::<u8>().prop_map(|n| {
      let mut bytes = [0u8; crate::gid::GID_STORAGE_SIZE];
      bytes[0] = n;
      Gid::from_bytes(bytes)
    })
  }

  proptest! {
    // Any interleaving of adds/removes on distinct gids settles to
    // the set difference.
    #[test]
    fn add_remove_interleavings_settle_to_set_difference(
      adds in prop::collection::hash_set(gid_strategy(), 1..12),
      removes in prop::collection::hash_set(gid_strategy(), 0..12),
    ) {
      let cache = GraphCache::new();
      let participant = Gid::ZERO;
      for g in &adds {
        cache.add_writer(*g, "/t", "T", TypeHash::UNSET, participant, QosProfile::conservative());
      }
      for g in &removes {
        cache.remove_writer(*g);
      }
      let expected: std::collections::HashSet<Gid> =
        adds.difference(&removes).copied().collect();
      prop_assert_eq!(cache.get_writer_count("/t"), expected.len());
    }
  }
}
