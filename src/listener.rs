//! Background thread that drains peer-reported `ParticipantEntitiesInfo`
//! messages from a discovery transport into the graph cache.
//!
//! Built on mio 0.6's `Evented`/`Poll`. The event source is a trait, not a
//! concrete vendor reader type, so this crate never has to name a specific
//! DDS SDK.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, warn};
use mio::{Events, Poll, PollOpt, Ready, Token};
use mio_extras::channel::{self, Receiver, Sender};

use crate::entities_info::ParticipantEntitiesInfo;
use crate::error::GraphResult;
use crate::graph_cache::GraphCache;

const SOURCE_TOKEN: Token = Token(0);
const STOP_TOKEN: Token = Token(1);

/// A discovery transport the listener can poll for incoming peer
/// `ParticipantEntitiesInfo` messages.
///
/// `mio::Evented` lets the listener's `Poll` wait on it directly;
/// `try_take` drains whatever became readable, returning `None` once the
/// source has no more messages queued.
pub trait DiscoverySource: mio::Evented + Send {
  fn try_take(&self) -> GraphResult<Option<ParticipantEntitiesInfo>>;
}

/// Handle to a running listener thread.
///
/// Dropping this without calling [`ListenerHandle::stop`] detaches the
/// thread: it keeps running until the process exits. Callers that need a
/// clean shutdown should call `stop` explicitly, e.g. from
/// [`crate::context::Context`]'s `Drop` impl.
pub struct ListenerHandle {
  stop_tx: Sender<()>,
  join: Option<JoinHandle<()>>,
}

impl ListenerHandle {
  /// Signal the listener thread to stop and wait for it to exit.
  pub fn stop(mut self) {
    let _ = self.stop_tx.send(());
    if let Some(join) = self.join.take() {
      let _ = join.join();
    }
  }
}

/// Spawn the background listener thread.
///
/// Every message `source` yields is applied to `cache` via
/// [`GraphCache::update_participant_entities`] -- the
/// listener's entire job is connecting the discovery transport to that
/// one cache operation.
pub fn spawn<S>(source: S, cache: Arc<GraphCache>) -> ListenerHandle
where
  S: DiscoverySource + 'static,
{
  let (stop_tx, stop_rx): (Sender<()>, Receiver<()>) = channel::channel();

  let join = thread::Builder::new()
    .name("graph-cache-listener".to_owned())
    .spawn(move || run(source, cache, stop_rx))
    .expect("failed to spawn graph cache listener thread");

  ListenerHandle {
    stop_tx,
    join: Some(join),
  }
}

fn run<S: DiscoverySource>(source: S, cache: Arc<GraphCache>, stop_rx: Receiver<()>) {
  let poll = match Poll::new() {
    Ok(poll) => poll,
    Err(e) => {
      error!("graph cache listener: failed to create Poll: {e}");
      return;
    }
  };

  if let Err(e) = poll.register(&source, SOURCE_TOKEN, Ready::readable(), PollOpt::edge()) {
    error!("graph cache listener: failed to register discovery source: {e}");
    return;
  }
  if let Err(e) = poll.register(&stop_rx, STOP_TOKEN, Ready::readable(), PollOpt::edge()) {
    error!("graph cache listener: failed to register stop channel: {e}");
    return;
  }

  let mut events = Events::with_capacity(16);
  'outer: loop {
    if let Err(e) = poll.poll(&mut events, None) {
      error!("graph cache listener: poll failed: {e}");
      break;
    }
    for event in &events {
      match event.token() {
        SOURCE_TOKEN => loop {
          match source.try_take() {
            Ok(Some(message)) => cache.update_participant_entities(message),
            Ok(None) => break,
            Err(e) => {
              warn!("graph cache listener: discovery source error: {e}");
              break;
            }
          }
        },
        STOP_TOKEN => break 'outer,
        _ => (),
      }
    }
  }
}
