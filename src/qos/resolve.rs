//! BEST_AVAILABLE resolution.
//!
//! Subscription resolution is conservative (match the weakest publisher so
//! we always connect); publisher resolution is optimistic for
//! reliability/durability and conservative for deadline/lease -- this
//! asymmetry is fundamental and must not be simplified away.

use super::profile::{
  DurabilityKind, Duration, DurationPolicy, HistoryKind, HistoryPolicy, LivelinessKind,
  QosProfile, ReliabilityKind,
};

lazy_static! {
  /// Well-known defaults for service/client endpoints. BEST_AVAILABLE
  /// policies on a service profile resolve to these unconditionally;
  /// peer endpoints are never consulted.
  pub static ref SERVICES_DEFAULT_QOS: QosProfile = QosProfile {
    reliability: ReliabilityKind::Reliable,
    durability: DurabilityKind::Volatile,
    liveliness: LivelinessKind::Automatic,
    deadline: DurationPolicy::Default,
    liveliness_lease_duration: DurationPolicy::Default,
    history: HistoryPolicy {
      kind: HistoryKind::KeepLast,
      depth: 10,
    },
    lifespan: Duration::INFINITE,
  };
}

/// Resolve the "DEFAULT iff all peers DEFAULT, else max/min of the
/// concrete values" pattern shared by deadline and lease resolution.
///
/// An empty peer slice is treated the same as "all peers DEFAULT" -- this
/// is what keeps a deadline from collapsing to zero when nobody has
/// announced yet.
fn resolve_extremum<I: Iterator<Item = DurationPolicy>>(
  peers: I,
  pick: impl Fn(Duration, Duration) -> Duration,
) -> DurationPolicy {
  let mut extremum: Option<Duration> = None;
  for peer in peers {
    if let Some(value) = peer.as_value() {
      extremum = Some(match extremum {
        Some(current) => pick(current, value),
        None => value,
      });
    }
  }
  match extremum {
    Some(value) => DurationPolicy::Value(value),
    None => DurationPolicy::Default,
  }
}

fn max(a: Duration, b: Duration) -> Duration {
  if a >= b {
    a
  } else {
    b
  }
}

fn min(a: Duration, b: Duration) -> Duration {
  if a <= b {
    a
  } else {
    b
  }
}

/// Resolve every BEST_AVAILABLE policy on `subscriber` against the set of
/// `publishers` it has discovered. History, depth, and lifespan are never
/// touched.
pub fn resolve_subscription(publishers: &[QosProfile], subscriber: &mut QosProfile) {
  if subscriber.reliability.is_best_available() {
    subscriber.reliability = if !publishers.is_empty()
      && publishers
        .iter()
        .all(|p| p.reliability == ReliabilityKind::Reliable)
    {
      ReliabilityKind::Reliable
    } else {
      ReliabilityKind::BestEffort
    };
  }

  if subscriber.durability.is_best_available() {
    subscriber.durability = if !publishers.is_empty()
      && publishers
        .iter()
        .all(|p| p.durability == DurabilityKind::TransientLocal)
    {
      DurabilityKind::TransientLocal
    } else {
      DurabilityKind::Volatile
    };
  }

  if subscriber.liveliness.is_best_available() {
    subscriber.liveliness = if !publishers.is_empty()
      && publishers
        .iter()
        .all(|p| p.liveliness == LivelinessKind::ManualByTopic)
    {
      LivelinessKind::ManualByTopic
    } else {
      LivelinessKind::Automatic
    };
  }

  if subscriber.deadline.is_best_available() {
    subscriber.deadline = resolve_extremum(publishers.iter().map(|p| p.deadline), max);
  }

  if subscriber.liveliness_lease_duration.is_best_available() {
    subscriber.liveliness_lease_duration =
      resolve_extremum(publishers.iter().map(|p| p.liveliness_lease_duration), max);
  }
}

/// Resolve every BEST_AVAILABLE policy on `publisher` against the set of
/// `subscriptions` that have discovered it.
pub fn resolve_publisher(subscriptions: &[QosProfile], publisher: &mut QosProfile) {
  if publisher.reliability.is_best_available() {
    // Reliable is always compatible with whatever a subscriber asked for.
    publisher.reliability = ReliabilityKind::Reliable;
  }

  if publisher.durability.is_best_available() {
    publisher.durability = DurabilityKind::TransientLocal;
  }

  if publisher.liveliness.is_best_available() {
    publisher.liveliness = if subscriptions
      .iter()
      .any(|s| s.liveliness == LivelinessKind::ManualByTopic)
    {
      LivelinessKind::ManualByTopic
    } else {
      LivelinessKind::Automatic
    };
  }

  if publisher.deadline.is_best_available() {
    publisher.deadline = resolve_extremum(subscriptions.iter().map(|s| s.deadline), min);
  }

  if publisher.liveliness_lease_duration.is_best_available() {
    publisher.liveliness_lease_duration = resolve_extremum(
      subscriptions.iter().map(|s| s.liveliness_lease_duration),
      min,
    );
  }
}

/// Unconditionally replace every BEST_AVAILABLE policy on a service/client
/// profile with the corresponding field from [`SERVICES_DEFAULT_QOS`].
/// Peer endpoints are not consulted.
pub fn resolve_service_profile(profile: &mut QosProfile) {
  let defaults = &*SERVICES_DEFAULT_QOS;
  if profile.reliability.is_best_available() {
    profile.reliability = defaults.reliability;
  }
  if profile.durability.is_best_available() {
    profile.durability = defaults.durability;
  }
  if profile.liveliness.is_best_available() {
    profile.liveliness = defaults.liveliness;
  }
  if profile.deadline.is_best_available() {
    profile.deadline = defaults.deadline;
  }
  if profile.liveliness_lease_duration.is_best_available() {
    profile.liveliness_lease_duration = defaults.liveliness_lease_duration;
  }
}

/// Resolve `profile` for a single topic, consulting peer endpoints only
/// if some policy on it is still BEST_AVAILABLE.
///
/// `enumerate_peers` is the in-process stand-in for the C API's
/// `(node, allocator, topic, no_mangle, out_array)` enumerator: the
/// caller closes over whatever discovery source it has (typically a
/// [`crate::graph_cache::GraphCache`] query) and returns the peer
/// profiles found for the topic.
pub fn resolve_for_topic<F, E>(
  profile: &mut QosProfile,
  is_subscription: bool,
  enumerate_peers: F,
) -> Result<(), E>
where
  F: FnOnce() -> Result<Vec<QosProfile>, E>,
{
  if !profile.has_best_available() {
    return Ok(());
  }
  let peers = enumerate_peers()?;
  if is_subscription {
    resolve_subscription(&peers, profile);
  } else {
    resolve_publisher(&peers, profile);
  }
  Ok(())
}


#[cfg(test)]
mod proptests {
  use super::*;
  use crate::qos::compatibility::{check_compatible, Verdict};
  use proptest::prelude::*;

  fn concrete_profile_strategy() -> impl Strategy<Value = QosProfile> {
    (
      prop::bool::ANY,
      prop::bool::ANY,
      prop::bool::ANY,
      0i64..120,
      0i64..120,
    )
      .prop_map(|(reliable, transient, manual, deadline_sec, lease_sec)| QosProfile {
        reliability: if reliable {
          ReliabilityKind::Reliable
        } else {
          ReliabilityKind::BestEffort
        },
        durability: if transient {
          DurabilityKind::TransientLocal
        } else {
          DurabilityKind::Volatile
        },
        liveliness: if manual {
          LivelinessKind::ManualByTopic
        } else {
          LivelinessKind::Automatic
        },
        deadline: DurationPolicy::Value(Duration::from_secs(deadline_sec)),
        liveliness_lease_duration: DurationPolicy::Value(Duration::from_secs(lease_sec)),
        ..QosProfile::conservative()
      })
  }

  proptest! {
    // Resolving a subscription against any set of concrete publisher
    // profiles must leave it compatible with every one of them.
    #[test]
    fn resolved_subscription_is_compatible_with_every_publisher(
      publishers in prop::collection::vec(concrete_profile_strategy(), 1..6),
    ) {
      let mut sub = QosProfile {
        reliability: ReliabilityKind::BestAvailable,
        durability: DurabilityKind::BestAvailable,
        liveliness: LivelinessKind::BestAvailable,
        deadline: DurationPolicy::BestAvailable,
        liveliness_lease_duration: DurationPolicy::BestAvailable,
        ..QosProfile::conservative()
      };
      resolve_subscription(&publishers, &mut sub);
      prop_assert!(!sub.has_best_available());
      for publisher in &publishers {
        prop_assert_eq!(check_compatible(publisher, &sub).verdict, Verdict::Ok);
      }
    }

    // Resolving a publisher against any set of concrete subscriber
    // profiles must leave it compatible with every one of them.
    #[test]
    fn resolved_publisher_is_compatible_with_every_subscription(
      subscriptions in prop::collection::vec(concrete_profile_strategy(), 1..6),
    ) {
      let mut publisher = QosProfile {
        reliability: ReliabilityKind::BestAvailable,
        durability: DurabilityKind::BestAvailable,
        liveliness: LivelinessKind::BestAvailable,
        deadline: DurationPolicy::BestAvailable,
        liveliness_lease_duration: DurationPolicy::BestAvailable,
        ..QosProfile::conservative()
      };
      resolve_publisher(&subscriptions, &mut publisher);
      prop_assert!(!publisher.has_best_available());
      for subscription in &subscriptions {
        prop_assert_eq!(check_compatible(&publisher, subscription).verdict, Verdict::Ok);
      }
    }

  }
}
