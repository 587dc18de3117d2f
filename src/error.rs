//! Crate-wide error type: INVALID_ARGUMENT, BAD_ALLOC, NODE_NAME_NON_EXISTENT,
//! and a catch-all ERROR, mirroring the status codes a C ABI layer over this
//! crate would report to callers.
//!
//! Rust's global allocator aborts the process on allocation failure
//! rather than returning a recoverable error, so nothing in this crate
//! actually constructs [`GraphError::BadAlloc`] internally -- the variant
//! is kept for callers bridging to an FFI boundary that does model
//! allocator failure.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("allocation failed")]
  BadAlloc,

  #[error("node '{namespace}/{name}' does not exist")]
  NodeNotFound { namespace: String, name: String },

  #[error("discovery transport error: {0}")]
  Discovery(String),

  #[error("{0}")]
  Other(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
