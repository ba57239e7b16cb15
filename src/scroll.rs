//! Scroll anchoring registry
//!
//! A scroll container keeps the content the user is looking at stable across
//! layout by anchoring to a node near the top of its viewport. The relation
//! lives outside the tree, keyed by handles in both directions: neither side
//! keeps the other alive, and a destroyed node simply vanishes from the
//! registry through the observer hook. Stale handles resolve to nothing.

use rustc_hash::FxHashMap;

use crate::geometry::Point;
use crate::map::{self, MapFlags};
use crate::tree::node::NodeId;
use crate::tree::tree::{RenderTree, TreeObserver};

/// One anchored scroller: which node it anchors to and where that node sat
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
  node: NodeId,
  /// Anchor origin in the scroller's space when the anchor was selected
  saved_origin: Point,
}

/// Tracks which node each scroll container is anchored to
#[derive(Debug, Default)]
pub struct ScrollAnchorRegistry {
  anchors: FxHashMap<NodeId, Anchor>,
  // Reverse index for cheap cleanup on destruction.
  anchored_by: FxHashMap<NodeId, Vec<NodeId>>,
}

impl ScrollAnchorRegistry {
  /// Creates an empty registry
  pub fn new() -> Self {
    Self::default()
  }

  /// Anchors `scroller` to `anchor`, remembering the anchor's current origin
  ///
  /// Replaces any previous anchor for the scroller.
  pub fn set_anchor(&mut self, tree: &RenderTree, scroller: NodeId, anchor: NodeId) {
    let saved_origin =
      map::map_point_to_ancestor(tree, anchor, Some(scroller), Point::ZERO, MapFlags::empty())
        .unwrap_or(Point::ZERO);
    self.clear_anchor(scroller);
    self.anchors.insert(
      scroller,
      Anchor {
        node: anchor,
        saved_origin,
      },
    );
    self.anchored_by.entry(anchor).or_default().push(scroller);
  }

  /// The anchor node for `scroller`, if one is set and still alive
  pub fn anchor_for(&self, tree: &RenderTree, scroller: NodeId) -> Option<NodeId> {
    let anchor = self.anchors.get(&scroller)?;
    tree.contains(anchor.node).then_some(anchor.node)
  }

  /// Drops the anchor relation for `scroller`
  pub fn clear_anchor(&mut self, scroller: NodeId) {
    if let Some(anchor) = self.anchors.remove(&scroller) {
      if let Some(scrollers) = self.anchored_by.get_mut(&anchor.node) {
        scrollers.retain(|&s| s != scroller);
        if scrollers.is_empty() {
          self.anchored_by.remove(&anchor.node);
        }
      }
    }
  }

  /// The scroll adjustment that keeps `scroller`'s anchor visually still
  ///
  /// Compares the anchor's current origin against the one saved when the
  /// anchor was set; the difference is how far the scroller must adjust its
  /// offset after layout. `None` when no live anchor exists or the anchor is
  /// no longer reachable from the scroller.
  pub fn adjustment_for(&self, tree: &RenderTree, scroller: NodeId) -> Option<Point> {
    let anchor = self.anchors.get(&scroller)?;
    if !tree.contains(anchor.node) {
      return None;
    }
    let current = map::map_point_to_ancestor(
      tree,
      anchor.node,
      Some(scroller),
      Point::ZERO,
      MapFlags::empty(),
    )?;
    Some(current - anchor.saved_origin)
  }

  /// Number of anchored scrollers
  pub fn len(&self) -> usize {
    self.anchors.len()
  }

  /// True when nothing is anchored
  pub fn is_empty(&self) -> bool {
    self.anchors.is_empty()
  }
}

impl TreeObserver for ScrollAnchorRegistry {
  fn node_destroyed(&mut self, id: NodeId) {
    // As a scroller: drop its anchor relation, including the reverse entry.
    self.clear_anchor(id);
    // As an anchor: drop every scroller that pointed at it.
    if let Some(scrollers) = self.anchored_by.remove(&id) {
      for scroller in scrollers {
        self.anchors.remove(&scroller);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{Rect, Size};
  use crate::style::ComputedStyle;
  use crate::tree::node::NodeKind;
  use std::cell::RefCell;
  use std::rc::Rc;
  use std::sync::Arc;

  fn setup() -> (RenderTree, NodeId, NodeId) {
    let mut tree = RenderTree::new(Size::new(800.0, 600.0));
    let root = tree.root();
    let scroller = tree.create_node(NodeKind::Block, Arc::new(ComputedStyle::default()));
    tree.insert_child(root, scroller, None).unwrap();
    tree.set_geometry(scroller, Rect::from_xywh(0.0, 0.0, 300.0, 300.0));
    let content = tree.create_node(NodeKind::Block, Arc::new(ComputedStyle::default()));
    tree.insert_child(scroller, content, None).unwrap();
    tree.set_geometry(content, Rect::from_xywh(0.0, 500.0, 300.0, 40.0));
    (tree, scroller, content)
  }

  #[test]
  fn test_anchor_tracks_layout_movement() {
    let (mut tree, scroller, content) = setup();
    let mut registry = ScrollAnchorRegistry::new();
    registry.set_anchor(&tree, scroller, content);
    assert_eq!(registry.anchor_for(&tree, scroller), Some(content));
    assert_eq!(
      registry.adjustment_for(&tree, scroller),
      Some(Point::ZERO)
    );

    // Content above grew; the anchor moved down by 60.
    tree.set_geometry(content, Rect::from_xywh(0.0, 560.0, 300.0, 40.0));
    assert_eq!(
      registry.adjustment_for(&tree, scroller),
      Some(Point::new(0.0, 60.0))
    );
  }

  #[test]
  fn test_destroyed_anchor_clears_relation() {
    let (mut tree, scroller, content) = setup();
    let registry = Rc::new(RefCell::new(ScrollAnchorRegistry::new()));
    tree.add_observer(registry.clone());
    registry.borrow_mut().set_anchor(&tree, scroller, content);

    tree.destroy(content).unwrap();
    assert_eq!(registry.borrow().anchor_for(&tree, scroller), None);
    assert!(registry.borrow().is_empty());
  }

  #[test]
  fn test_destroyed_scroller_clears_relation() {
    let (mut tree, scroller, content) = setup();
    let registry = Rc::new(RefCell::new(ScrollAnchorRegistry::new()));
    tree.add_observer(registry.clone());
    registry.borrow_mut().set_anchor(&tree, scroller, content);

    tree.destroy(scroller).unwrap();
    assert!(registry.borrow().is_empty());
  }

  #[test]
  fn test_destroyed_scroller_purges_reverse_index() {
    let (mut tree, scroller, content) = setup();
    let registry = Rc::new(RefCell::new(ScrollAnchorRegistry::new()));
    tree.add_observer(registry.clone());
    registry.borrow_mut().set_anchor(&tree, scroller, content);

    // Detach the anchor so it outlives its scroller.
    tree.remove_child(scroller, content).unwrap();
    tree.destroy(scroller).unwrap();

    assert!(registry.borrow().is_empty());
    // The surviving anchor must not keep the dead scroller in the reverse
    // index.
    assert!(!registry.borrow().anchored_by.contains_key(&content));
  }

  #[test]
  fn test_stale_handle_resolves_to_nothing() {
    let (mut tree, scroller, content) = setup();
    let mut registry = ScrollAnchorRegistry::new();
    registry.set_anchor(&tree, scroller, content);
    // Destroy without the observer wired up; the lookup still degrades
    // gracefully.
    tree.destroy(content).unwrap();
    assert_eq!(registry.anchor_for(&tree, scroller), None);
    assert_eq!(registry.adjustment_for(&tree, scroller), None);
  }
}
