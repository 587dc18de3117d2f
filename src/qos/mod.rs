//! QoS negotiation: compatibility diagnosis and BEST_AVAILABLE resolution
//! over heterogeneous endpoint QoS announcements.
//!
//! All operations here are pure and stateless; unlike the graph cache,
//! there is no shared mutable state, so nothing in this module needs
//! locking.

pub mod compatibility;
pub mod profile;
pub mod resolve;
pub mod type_hash;

pub use compatibility::{check_compatible, CompatibilityReport, Verdict};
pub use profile::{
  DurabilityKind, Duration, DurationPolicy, HistoryKind, HistoryPolicy, LivelinessKind,
  QosProfile, ReliabilityKind,
};
pub use resolve::{
  resolve_for_topic, resolve_publisher, resolve_service_profile, resolve_subscription,
  SERVICES_DEFAULT_QOS,
};
pub use type_hash::{
  encode_type_hash_for_user_data_qos, parse_type_hash_from_user_data, TypeHash,
  TypeHashParseError, TYPE_HASH_SIZE,
};
