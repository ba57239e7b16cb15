//! Accessibility object cache
//!
//! A flat cache of accessibility entries keyed by node handle. The cache
//! subscribes to the tree's structural notifications: destroyed nodes drop
//! their entries immediately, and structural churn marks affected parents
//! dirty so the platform layer knows to re-query them. The cache never holds
//! a reference into the tree; it pulls fresh data on demand.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::tree::node::{NodeId, NodeKind};
use crate::tree::tree::{RenderTree, TreeObserver};

/// Accessibility role derived from the box kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxRole {
  /// The document root
  Document,
  /// Generic container
  Group,
  /// Static text
  Text,
  /// Table
  Table,
  /// Table row
  Row,
  /// Table cell
  Cell,
  /// Embedded content
  Image,
}

impl AxRole {
  fn from_kind(kind: NodeKind) -> AxRole {
    match kind {
      NodeKind::View => AxRole::Document,
      NodeKind::Text => AxRole::Text,
      NodeKind::Table => AxRole::Table,
      NodeKind::TableRow => AxRole::Row,
      NodeKind::TableCell => AxRole::Cell,
      NodeKind::Replaced => AxRole::Image,
      _ => AxRole::Group,
    }
  }
}

/// One cached accessibility entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxEntry {
  /// The render node this entry mirrors
  pub node: NodeId,
  /// Derived role
  pub role: AxRole,
}

/// Cache of accessibility entries, kept consistent through tree notifications
#[derive(Debug, Default)]
pub struct AxCache {
  entries: FxHashMap<NodeId, AxEntry>,
  dirty: FxHashSet<NodeId>,
}

impl AxCache {
  /// Creates an empty cache
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the entry for `id`, creating it on first access
  ///
  /// Anonymous nodes have no accessibility presence and yield `None`.
  pub fn get_or_create(&mut self, tree: &RenderTree, id: NodeId) -> Option<AxEntry> {
    let node = tree.get(id)?;
    if node.is_anonymous() {
      return None;
    }
    let entry = self.entries.entry(id).or_insert(AxEntry {
      node: id,
      role: AxRole::from_kind(node.kind),
    });
    Some(*entry)
  }

  /// Returns the cached entry for `id` without creating one
  pub fn get(&self, id: NodeId) -> Option<AxEntry> {
    self.entries.get(&id).copied()
  }

  /// Nodes whose children changed since the last [`AxCache::take_dirty`]
  pub fn take_dirty(&mut self) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = self.dirty.drain().collect();
    out.sort_unstable();
    out
  }

  /// Number of live entries
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// True when no entries are cached
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl TreeObserver for AxCache {
  fn children_changed(&mut self, parent: NodeId) {
    if self.entries.contains_key(&parent) {
      self.dirty.insert(parent);
    }
  }

  fn node_destroyed(&mut self, id: NodeId) {
    self.entries.remove(&id);
    self.dirty.remove(&id);
  }
}
