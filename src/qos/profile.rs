//! The QoS profile data model.
//!
//! Mirrors the shape of a DDS QoS profile closely enough to negotiate with
//! real vendor endpoints, but adds the `BestAvailable` sentinel to every
//! policy that can meaningfully be deferred -- a concept that does not
//! exist in the wire-level DDS QoS structures themselves, only in the
//! request a ROS2-style middleware makes of this library before it talks
//! to the network.

use serde::{Deserialize, Serialize};

/// A DDS-style duration: `(seconds, nanoseconds)` with `nanoseconds < 1e9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
  pub sec: i64,
  pub nanosec: u32,
}

impl Duration {
  pub const ZERO: Duration = Duration { sec: 0, nanosec: 0 };
  /// Conventional "infinite" duration, matching the DDS INFINITE sentinel.
  pub const INFINITE: Duration = Duration {
    sec: i64::MAX,
    nanosec: 999_999_999,
  };

  pub fn new(sec: i64, nanosec: u32) -> Duration {
    assert!(nanosec < 1_000_000_000, "nanosecond field out of range");
    Duration { sec, nanosec }
  }

  pub fn from_secs(sec: i64) -> Duration {
    Duration { sec, nanosec: 0 }
  }
}

/// A policy value that may be left to the network ("request the best
/// available service level") or pinned to DEFAULT ("no constraint").
///
/// Used for `deadline` and `liveliness_lease_duration`: both share the
/// same three-way shape (DEFAULT sentinel, BEST_AVAILABLE sentinel, or a
/// concrete [`Duration`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationPolicy {
  /// No constraint requested; resolves to "whatever the peer offers".
  Default,
  /// Request the strongest feasible value; must be resolved before use.
  BestAvailable,
  /// A concrete, already-resolved value.
  Value(Duration),
}

impl DurationPolicy {
  pub fn is_default(&self) -> bool {
    matches!(self, DurationPolicy::Default)
  }

  pub fn is_best_available(&self) -> bool {
    matches!(self, DurationPolicy::BestAvailable)
  }

  pub fn as_value(&self) -> Option<Duration> {
    match self {
      DurationPolicy::Value(d) => Some(*d),
      _ => None,
    }
  }
}

impl Default for DurationPolicy {
  fn default() -> Self {
    DurationPolicy::Default
  }
}

macro_rules! sentinel_policy {
  ($name:ident { $($variant:ident),+ $(,)? }) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum $name {
      $($variant,)+
      SystemDefault,
      Unknown,
      BestAvailable,
    }

    impl $name {
      pub fn is_best_available(&self) -> bool {
        matches!(self, $name::BestAvailable)
      }

      /// Either SYSTEM_DEFAULT or UNKNOWN: a value whose eventual
      /// resolution is not yet known to this side.
      pub fn is_unresolved(&self) -> bool {
        matches!(self, $name::SystemDefault | $name::Unknown)
      }
    }
  };
}

sentinel_policy!(ReliabilityKind { BestEffort, Reliable });
sentinel_policy!(DurabilityKind { Volatile, TransientLocal });
sentinel_policy!(LivelinessKind { Automatic, ManualByTopic });

/// History policy: kind + depth. Never touched by BEST_AVAILABLE
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
  KeepLast,
  KeepAll,
  SystemDefault,
  Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPolicy {
  pub kind: HistoryKind,
  pub depth: i32,
}

impl Default for HistoryPolicy {
  fn default() -> Self {
    HistoryPolicy {
      kind: HistoryKind::KeepLast,
      depth: 1,
    }
  }
}

/// A fixed-shape bundle of DDS QoS policy fields, with BEST_AVAILABLE
/// sentinels for the policies the negotiation engine can defer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosProfile {
  pub reliability: ReliabilityKind,
  pub durability: DurabilityKind,
  pub liveliness: LivelinessKind,
  pub deadline: DurationPolicy,
  pub liveliness_lease_duration: DurationPolicy,
  pub history: HistoryPolicy,
  pub lifespan: Duration,
}

impl QosProfile {
  /// A profile with every policy at its most conservative, concrete
  /// setting -- BEST_EFFORT, VOLATILE, AUTOMATIC, no deadline, no lease.
  pub const fn conservative() -> QosProfile {
    QosProfile {
      reliability: ReliabilityKind::BestEffort,
      durability: DurabilityKind::Volatile,
      liveliness: LivelinessKind::Automatic,
      deadline: DurationPolicy::Default,
      liveliness_lease_duration: DurationPolicy::Default,
      history: HistoryPolicy {
        kind: HistoryKind::KeepLast,
        depth: 1,
      },
      lifespan: Duration::INFINITE,
    }
  }

  /// True if any policy is still set to BEST_AVAILABLE and needs
  /// resolving before this profile reaches the wire layer.
  pub fn has_best_available(&self) -> bool {
    self.reliability.is_best_available()
      || self.durability.is_best_available()
      || self.liveliness.is_best_available()
      || self.deadline.is_best_available()
      || self.liveliness_lease_duration.is_best_available()
  }
}

impl Default for QosProfile {
  fn default() -> Self {
    QosProfile::conservative()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn conservative_profile_has_no_pending_best_available() {
    assert!(!QosProfile::conservative().has_best_available());
  }

  #[test]
  fn has_best_available_detects_any_field() {
    let mut p = QosProfile::conservative();
    assert!(!p.has_best_available());
    p.liveliness = LivelinessKind::BestAvailable;
    assert!(p.has_best_available());
  }

  #[test]
  fn duration_policy_accessors() {
    assert!(DurationPolicy::Default.is_default());
    assert!(!DurationPolicy::BestAvailable.is_default());
    assert_eq!(
      DurationPolicy::Value(Duration::from_secs(3)).as_value(),
      Some(Duration::from_secs(3))
    );
    assert_eq!(DurationPolicy::Default.as_value(), None);
  }
}
