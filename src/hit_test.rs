//! Point-to-node hit testing
//!
//! Descends the structural tree from the view, visiting children back to
//! front (later siblings paint on top), and returns the deepest visible node
//! whose border box contains the point. Scroll offsets and translation
//! transforms are honored; a node behind a non-invertible transform falls
//! back to its untransformed border box.

use crate::geometry::Point;
use crate::style::Visibility;
use crate::tree::node::NodeId;
use crate::tree::tree::RenderTree;

/// The result of a hit test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestResult {
  /// Deepest node containing the point
  pub node: NodeId,
}

/// Finds the topmost node under `point`, given in view coordinates
pub fn hit_test(tree: &RenderTree, point: Point) -> Option<HitTestResult> {
  hit_test_from(tree, tree.root(), point)
}

/// Finds the topmost node under `point` within `id`'s subtree
///
/// `point` is given in `id`'s local coordinate space. Nothing outside the
/// subtree is considered, so a miss inside a small subtree is `None` even
/// when an ancestor would have caught the point.
pub fn hit_test_from(tree: &RenderTree, id: NodeId, point: Point) -> Option<HitTestResult> {
  hit_node(tree, id, point).map(|node| HitTestResult { node })
}

fn hit_node(tree: &RenderTree, id: NodeId, point: Point) -> Option<NodeId> {
  let node = tree.get(id)?;
  if node.style.visibility != Visibility::Visible {
    return None;
  }

  // Children first, topmost last sibling first.
  let children = tree.child_ids(id);
  for &child in children.iter().rev() {
    let Some(child_node) = tree.get(child) else {
      continue;
    };
    let mut local = point - child_node.location + node.scroll_offset;
    if let Some(transform) = child_node.style.transform {
      if transform.is_translation() {
        local = Point::new(local.x - transform.m[0][3], local.y - transform.m[1][3]);
      }
    }
    if let Some(hit) = hit_node(tree, child, local) {
      return Some(hit);
    }
  }

  if node.border_box().contains_point(point) {
    return Some(id);
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{Rect, Size, Transform3D};
  use crate::style::ComputedStyle;
  use crate::tree::node::NodeKind;
  use std::sync::Arc;

  fn new_tree() -> RenderTree {
    RenderTree::new(Size::new(800.0, 600.0))
  }

  fn insert_block(tree: &mut RenderTree, parent: NodeId, rect: Rect) -> NodeId {
    let id = tree.create_node(NodeKind::Block, Arc::new(ComputedStyle::default()));
    tree.insert_child(parent, id, None).unwrap();
    tree.set_geometry(id, rect);
    id
  }

  #[test]
  fn test_hits_deepest_containing_node() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = insert_block(&mut tree, root, Rect::from_xywh(10.0, 10.0, 200.0, 200.0));
    let inner = insert_block(&mut tree, outer, Rect::from_xywh(20.0, 20.0, 50.0, 50.0));

    assert_eq!(
      hit_test(&tree, Point::new(40.0, 40.0)),
      Some(HitTestResult { node: inner })
    );
    assert_eq!(
      hit_test(&tree, Point::new(15.0, 15.0)),
      Some(HitTestResult { node: outer })
    );
    assert_eq!(
      hit_test(&tree, Point::new(500.0, 500.0)),
      Some(HitTestResult { node: root })
    );
  }

  #[test]
  fn test_subtree_rooted_query_uses_local_coordinates() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = insert_block(&mut tree, root, Rect::from_xywh(100.0, 100.0, 200.0, 200.0));
    let inner = insert_block(&mut tree, outer, Rect::from_xywh(20.0, 20.0, 50.0, 50.0));

    // Same physical point, expressed in the outer node's space.
    assert_eq!(
      hit_test_from(&tree, outer, Point::new(40.0, 40.0)),
      Some(HitTestResult { node: inner })
    );
    // A point outside the subtree is a miss, not a fallback to an ancestor.
    assert_eq!(hit_test_from(&tree, outer, Point::new(500.0, 500.0)), None);
  }

  #[test]
  fn test_later_sibling_wins_overlap() {
    let mut tree = new_tree();
    let root = tree.root();
    let _under = insert_block(&mut tree, root, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
    let over = insert_block(&mut tree, root, Rect::from_xywh(50.0, 0.0, 100.0, 100.0));

    assert_eq!(
      hit_test(&tree, Point::new(70.0, 10.0)),
      Some(HitTestResult { node: over })
    );
  }

  #[test]
  fn test_hidden_node_is_transparent_to_hits() {
    let mut tree = new_tree();
    let root = tree.root();
    let hidden = {
      let mut style = ComputedStyle::default();
      style.visibility = Visibility::Hidden;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
      id
    };
    let result = hit_test(&tree, Point::new(10.0, 10.0)).unwrap();
    assert_ne!(result.node, hidden);
    assert_eq!(result.node, tree.root());
  }

  #[test]
  fn test_scroll_offset_shifts_hit_region() {
    let mut tree = new_tree();
    let root = tree.root();
    let scroller = insert_block(&mut tree, root, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
    let child = insert_block(&mut tree, scroller, Rect::from_xywh(0.0, 150.0, 100.0, 20.0));
    tree.set_scroll_offset(scroller, Point::new(0.0, 140.0));

    // Child sits at y 10..30 after scrolling.
    assert_eq!(
      hit_test(&tree, Point::new(50.0, 20.0)),
      Some(HitTestResult { node: child })
    );
  }

  #[test]
  fn test_translated_node_hits_at_new_position() {
    let mut tree = new_tree();
    let root = tree.root();
    let moved = {
      let mut style = ComputedStyle::default();
      style.transform = Some(Transform3D::translation(200.0, 0.0));
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(0.0, 0.0, 50.0, 50.0));
      id
    };
    assert_eq!(
      hit_test(&tree, Point::new(210.0, 10.0)),
      Some(HitTestResult { node: moved })
    );
    assert_eq!(hit_test(&tree, Point::new(10.0, 10.0)).unwrap().node, root);
  }
}
