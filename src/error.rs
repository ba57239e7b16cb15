//! Error types for fastpaint
//!
//! The render tree core has very little exception-style control flow: most
//! "failures" are either programming errors (caught by debug assertions and
//! turned into safe no-ops in release builds) or expected structural outcomes
//! (expressed as `Option`/`None`). The error enum below covers the remaining
//! cases that are reportable API misuse rather than invariant violations.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

use crate::lifecycle::Phase;
use crate::tree::node::NodeId;

/// Result type alias for fastpaint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fastpaint
///
/// # Examples
///
/// ```
/// use fastpaint::{Error, TreeError};
/// use fastpaint::tree::node::NodeId;
///
/// fn insert() -> Result<(), Error> {
///     Err(Error::Tree(TreeError::StaleHandle {
///         id: NodeId::INVALID,
///     }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Tree mutation or lookup error
  #[error("Tree error: {0}")]
  Tree(#[from] TreeError),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur while mutating or querying the render tree
///
/// These indicate misuse of the tree API with handles that are no longer
/// (or never were) valid. Phase violations are deliberately *not* errors:
/// they are programming errors that assert in debug builds and degrade to
/// logged no-ops in release builds (see `RenderTree::insert_child`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
  /// A node handle refers to a freed or reused arena slot
  #[error("Stale node handle: {id}")]
  StaleHandle { id: NodeId },

  /// The receiver of a child mutation is a text node or other leaf kind
  #[error("Node {parent} cannot contain children")]
  NotAContainer { parent: NodeId },

  /// The reference child of an insertion is not a child of the receiver
  #[error("Reference child {before} is not a child of {parent}")]
  NotAChild { parent: NodeId, before: NodeId },

  /// The node being inserted is still linked into a tree
  #[error("Node {id} is already linked into a tree (phase {phase:?})")]
  AlreadyLinked { id: NodeId, phase: Phase },
}
