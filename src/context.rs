//! Top-level handle bundling a participant's identity, the shared graph
//! cache, and the means to announce local node structure to peers.
//!
//! The DDS participant and discovery transport are abstracted behind the
//! [`DiscoveryPublisher`] and [`crate::listener::DiscoverySource`] traits
//! so this crate never names a concrete DDS implementation.

use std::sync::Arc;

use log::{debug, error};

use crate::entities_info::ParticipantEntitiesInfo;
use crate::error::GraphResult;
use crate::gid::Gid;
use crate::graph_cache::GraphCache;
use crate::listener::{spawn, DiscoverySource, ListenerHandle};

/// Publishes this participant's `ParticipantEntitiesInfo` onto whatever
/// discovery transport the hosting middleware uses -- the
/// `ros_discovery_info` topic, in ROS 2 terms.
pub trait DiscoveryPublisher {
  fn publish(&self, message: &ParticipantEntitiesInfo) -> GraphResult<()>;
}

/// Builder for [`Context`], mirroring how a hosting DDS layer typically
/// configures a participant before nodes are attached to it.
pub struct ContextOptions {
  domain_id: u16,
  enclave: String,
}

impl ContextOptions {
  pub fn new() -> Self {
    Self {
      domain_id: 0,
      enclave: String::new(),
    }
  }

  /// Set the DDS Domain Id.
  ///
  /// Please refer to the
  /// [ROS_DOMAIN_ID](https://docs.ros.org/en/iron/Concepts/Intermediate/About-Domain-ID.html)
  /// or DDS documentation.
  pub fn domain_id(mut self, domain_id: u16) -> Self {
    self.domain_id = domain_id;
    self
  }

  /// Set the security enclave name reported for this participant.
  pub fn enclave(mut self, enclave: impl Into<String>) -> Self {
    self.enclave = enclave.into();
    self
  }
}

impl Default for ContextOptions {
  fn default() -> Self {
    Self::new()
  }
}

/// Bundles a participant's identity with the shared [`GraphCache`] and the
/// transport used to announce local node structure to peers.
///
/// `Context` is generic over `P: DiscoveryPublisher` so a hosting
/// middleware can plug in its own DDS writer without this crate depending
/// on any particular vendor SDK.
///
/// Context is shut down by dropping it, which also stops the listener
/// thread if one was started. There is no separate `shutdown()` method.
pub struct Context<P: DiscoveryPublisher> {
  participant_gid: Gid,
  domain_id: u16,
  cache: Arc<GraphCache>,
  publisher: P,
  listener: Option<ListenerHandle>,
}

impl<P: DiscoveryPublisher> Context<P> {
  /// Create a new Context for a participant, seeding the cache with our
  /// own, initially node-less, participant entry.
  pub fn new(participant_gid: Gid, options: ContextOptions, publisher: P) -> Context<P> {
    let cache = Arc::new(GraphCache::new());
    cache.add_participant(participant_gid, options.enclave.clone());
    Context {
      participant_gid,
      domain_id: options.domain_id,
      cache,
      publisher,
      listener: None,
    }
  }

  /// Borrow a handle to the shared graph cache. Cloning the `Arc` is the
  /// usual way to hand the cache to other components, e.g. a node's
  /// introspection queries.
  pub fn cache(&self) -> Arc<GraphCache> {
    self.cache.clone()
  }

  pub fn participant_gid(&self) -> Gid {
    self.participant_gid
  }

  pub fn domain_id(&self) -> u16 {
    self.domain_id
  }

  /// Start the background listener thread that drains peer
  /// `ParticipantEntitiesInfo` messages from `source` into the cache.
  /// Replaces any listener already running.
  pub fn start_listener<S>(&mut self, source: S)
  where
    S: DiscoverySource + 'static,
  {
    self.stop_listener();
    self.listener = Some(spawn(source, self.cache.clone()));
  }

  /// Stop the background listener, if one is running.
  pub fn stop_listener(&mut self) {
    if let Some(handle) = self.listener.take() {
      handle.stop();
    }
  }

  /// Publish our own `ParticipantEntitiesInfo`, as it currently stands in
  /// the cache, to peers.
  pub fn broadcast(&self) {
    let message = self
      .cache
      .participant_entities(self.participant_gid)
      .unwrap_or_else(|| ParticipantEntitiesInfo::new(self.participant_gid, Vec::new()));
    if let Err(e) = self.publisher.publish(&message) {
      error!("failed to publish participant entities info: {e}");
    }
  }

  /// Register a local node and broadcast the resulting participant state.
  pub fn add_node(&self, name: &str, namespace: &str) {
    self.cache.add_node(self.participant_gid, name, namespace);
    debug!("add_node: {namespace}/{name}");
    self.broadcast();
  }

  /// Unregister a local node and broadcast the resulting participant
  /// state.
  pub fn remove_node(&self, name: &str, namespace: &str) -> GraphResult<()> {
    self.cache.remove_node(self.participant_gid, name, namespace)?;
    self.broadcast();
    Ok(())
  }

  /// Associate a local writer with one of our nodes and broadcast.
  pub fn associate_writer(&self, writer_gid: Gid, node_name: &str, node_namespace: &str) -> GraphResult<()> {
    self
      .cache
      .associate_writer(writer_gid, self.participant_gid, node_name, node_namespace)?;
    self.broadcast();
    Ok(())
  }

  /// Associate a local reader with one of our nodes and broadcast.
  pub fn associate_reader(&self, reader_gid: Gid, node_name: &str, node_namespace: &str) -> GraphResult<()> {
    self
      .cache
      .associate_reader(reader_gid, self.participant_gid, node_name, node_namespace)?;
    self.broadcast();
    Ok(())
  }

  /// Dissociate a local writer from one of our nodes and broadcast.
  pub fn dissociate_writer(&self, writer_gid: Gid, node_name: &str, node_namespace: &str) -> GraphResult<()> {
    self
      .cache
      .dissociate_writer(writer_gid, self.participant_gid, node_name, node_namespace)?;
    self.broadcast();
    Ok(())
  }

  /// Dissociate a local reader from one of our nodes and broadcast.
  pub fn dissociate_reader(&self, reader_gid: Gid, node_name: &str, node_namespace: &str) -> GraphResult<()> {
    self
      .cache
      .dissociate_reader(reader_gid, self.participant_gid, node_name, node_namespace)?;
    self.broadcast();
    Ok(())
  }
}

impl<P: DiscoveryPublisher> Drop for Context<P> {
  fn drop(&mut self) {
    self.stop_listener();
  }
}
