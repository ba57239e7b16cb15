//! Coordinate mapping between node spaces
//!
//! Geometry travels the containment chain (not the structural parent chain:
//! out-of-flow boxes jump via [`RenderTree::container_of`]). Shapes are
//! carried as quads so rotations and perspective lose no precision until the
//! final bounding-box step.
//!
//! One step from a node into its container applies, in order: the node's own
//! transform about its origin, the translation to the node's location,
//! flow-thread-to-visual conversion when the container is a fragmentation
//! context, the container's block-flip for flipped writing modes, the
//! container's perspective, and finally the container's scroll offset. Scroll
//! is skipped for containers that scroll in their own composited backing,
//! since the backing moves instead of the content.

use bitflags::bitflags;

use crate::geometry::{Point, Quad, Rect, Transform3D};
use crate::tree::node::{NodeFlags, NodeId, NodeKind, RenderNode};
use crate::tree::tree::RenderTree;

bitflags! {
  /// Options for a mapping walk
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct MapFlags: u8 {
    /// Apply transforms and perspective along the chain
    const APPLY_TRANSFORMS = 1 << 0;
    /// Apply the block-axis flip of flipped-blocks writing-mode containers
    const APPLY_CONTAINER_FLIP = 1 << 1;
  }
}

impl MapFlags {
  /// The flag set used for paint invalidation rect mapping
  pub fn for_visual_rects() -> MapFlags {
    MapFlags::APPLY_TRANSFORMS | MapFlags::APPLY_CONTAINER_FLIP
  }
}

/// Maps a quad from `from`'s local space into `ancestor`'s space
///
/// `ancestor` defaults to the view root. Returns `None` when `from` is stale
/// or `ancestor` is not reachable through the containment chain.
pub fn map_quad_to_ancestor(
  tree: &RenderTree,
  from: NodeId,
  ancestor: Option<NodeId>,
  quad: Quad,
  flags: MapFlags,
) -> Option<Quad> {
  let target = ancestor.unwrap_or_else(|| tree.root());
  let mut quad = quad;
  let mut current = from;
  while current != target {
    let node = tree.get(current)?;
    let (container, skipped) = tree.container_of(current, Some(target));
    let container = container?;
    quad = step_into_container(tree, node, container, target, quad, flags)?;
    if skipped {
      // The containment jump passed over `target`; re-express the result in
      // the target's space by subtracting the target's own position within
      // the container we landed in.
      let offset = map_point_to_ancestor(tree, target, Some(container), Point::ZERO, flags)?;
      return Some(quad.translate(Point::new(-offset.x, -offset.y)));
    }
    current = container;
  }
  Some(quad)
}

/// Maps a point from `from`'s local space into `ancestor`'s space
pub fn map_point_to_ancestor(
  tree: &RenderTree,
  from: NodeId,
  ancestor: Option<NodeId>,
  point: Point,
  flags: MapFlags,
) -> Option<Point> {
  let quad = Quad {
    points: [point; 4],
  };
  map_quad_to_ancestor(tree, from, ancestor, quad, flags).map(|q| q.points[0])
}

/// Maps a rect from `from`'s local space into `ancestor`'s space
///
/// Rotations and perspective turn the rect into a general quad; the result
/// is its axis-aligned bounding box.
pub fn map_rect_to_ancestor(
  tree: &RenderTree,
  from: NodeId,
  ancestor: Option<NodeId>,
  rect: Rect,
  flags: MapFlags,
) -> Option<Rect> {
  map_quad_to_ancestor(tree, from, ancestor, Quad::from_rect(rect), flags)
    .map(Quad::bounding_box)
}

/// Maps a point from `ancestor`'s space down into `to`'s local space
///
/// The inverse walk. Transforms along the chain must be invertible as pure
/// translations; a rotation, scale or perspective yields `None` and the
/// caller falls back to a coarser strategy.
pub fn map_point_from_ancestor(
  tree: &RenderTree,
  to: NodeId,
  ancestor: Option<NodeId>,
  point: Point,
  flags: MapFlags,
) -> Option<Point> {
  let target = ancestor.unwrap_or_else(|| tree.root());
  // Collect the chain top-down, then unwind each step.
  let mut chain = Vec::new();
  let mut current = to;
  while current != target {
    chain.push(current);
    let (container, _) = tree.container_of(current, Some(target));
    current = container?;
  }
  let mut point = point;
  for &id in chain.iter().rev() {
    let node = tree.get(id)?;
    let (container, _) = tree.container_of(id, Some(target));
    let container_node = tree.get(container?)?;
    point = unstep_from_container(node, container_node, point, flags)?;
  }
  Some(point)
}

/// Maps `rect` from `from`'s local space into `ancestor`'s space, clipping by
/// every overflow-clipping container crossed on the way
///
/// This is the mapping the invalidation engine uses: the result is the part
/// of the rect that can actually produce pixels inside the ancestor. A rect
/// clipped away entirely comes back as `Rect::ZERO` (still `Some`; `None`
/// means the walk itself failed).
pub fn map_to_visual_rect_in_ancestor_space(
  tree: &RenderTree,
  from: NodeId,
  ancestor: Option<NodeId>,
  rect: Rect,
) -> Option<Rect> {
  let target = ancestor.unwrap_or_else(|| tree.root());
  let flags = MapFlags::for_visual_rects();
  let mut quad = Quad::from_rect(rect);
  let mut current = from;
  while current != target {
    let node = tree.get(current)?;
    let (container, skipped) = tree.container_of(current, Some(target));
    let container = container?;
    quad = step_into_container(tree, node, container, target, quad, flags)?;
    if skipped {
      let offset = map_point_to_ancestor(tree, target, Some(container), Point::ZERO, flags)?;
      quad = quad.translate(Point::new(-offset.x, -offset.y));
      return Some(quad.bounding_box());
    }
    let container_node = tree.get(container)?;
    if container != target && container_node.style.clips_overflow() {
      let bounds = quad.bounding_box();
      match bounds.intersect(container_node.border_box()) {
        Some(clipped) => quad = Quad::from_rect(clipped),
        // Fully clipped: nothing of this rect reaches the ancestor.
        None => return Some(Rect::ZERO),
      }
    }
    current = container;
  }
  Some(quad.bounding_box())
}

fn step_into_container(
  tree: &RenderTree,
  node: &RenderNode,
  container: NodeId,
  target: NodeId,
  mut quad: Quad,
  flags: MapFlags,
) -> Option<Quad> {
  let container_node = tree.get(container)?;

  if flags.contains(MapFlags::APPLY_TRANSFORMS) {
    if let Some(transform) = node.style.transform {
      quad = transform
        .about_origin(node.style.transform_origin)
        .project_quad(quad);
    }
  }

  quad = quad.translate(node.location);

  if matches!(container_node.kind, NodeKind::FlowThread) {
    // Flow-thread coordinates convert to the visual position of the column
    // the shape starts in; a shape spanning a column break stays with its
    // origin column.
    if let Some(info) = container_node.fragmentation {
      let bounds = quad.bounding_box();
      let visual = info.flow_to_visual(bounds.origin);
      quad = quad.translate(visual - bounds.origin);
    }
  }

  if flags.contains(MapFlags::APPLY_CONTAINER_FLIP)
    && container_node.style.writing_mode.is_flipped_blocks()
  {
    let width = container_node.size.width;
    quad = Quad {
      points: quad.points.map(|p| Point::new(width - p.x, p.y)),
    };
  }

  if flags.contains(MapFlags::APPLY_TRANSFORMS) {
    if let Some(distance) = container_node.style.perspective {
      quad = Transform3D::perspective(distance)
        .about_origin(container_node.style.perspective_origin)
        .project_quad(quad);
    }
  }

  if container != target && scroll_applies(container_node) {
    let scroll = container_node.scroll_offset;
    quad = quad.translate(Point::new(-scroll.x, -scroll.y));
  }

  Some(quad)
}

fn unstep_from_container(
  node: &RenderNode,
  container_node: &RenderNode,
  mut point: Point,
  flags: MapFlags,
) -> Option<Point> {
  if scroll_applies(container_node) {
    point = point.translate(container_node.scroll_offset);
  }
  if flags.contains(MapFlags::APPLY_TRANSFORMS) && container_node.style.perspective.is_some() {
    return None;
  }
  if matches!(container_node.kind, NodeKind::FlowThread) && container_node.fragmentation.is_some() {
    // Column mapping is not invertible point-wise here.
    return None;
  }
  if flags.contains(MapFlags::APPLY_CONTAINER_FLIP)
    && container_node.style.writing_mode.is_flipped_blocks()
  {
    point = Point::new(container_node.size.width - point.x, point.y);
  }
  point = point - node.location;
  if flags.contains(MapFlags::APPLY_TRANSFORMS) {
    if let Some(transform) = node.style.transform {
      if !transform.is_translation() {
        return None;
      }
      point = Point::new(point.x - transform.m[0][3], point.y - transform.m[1][3]);
    }
  }
  Some(point)
}

// A container's scroll shifts its children's painted positions unless the
// container scrolls in its own composited backing, where the backing moves
// and the content stays put.
fn scroll_applies(container: &RenderNode) -> bool {
  (container.style.overflow_x.is_scrollable() || container.style.overflow_y.is_scrollable())
    && !container.flags.contains(NodeFlags::COMPOSITED_SCROLLING)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::Size;
  use crate::style::{ComputedStyle, Overflow, Position, WritingMode};
  use crate::tree::node::FragmentationInfo;
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
  fn test_translation_chain() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = insert_block(&mut tree, root, Rect::from_xywh(10.0, 20.0, 200.0, 200.0));
    let inner = insert_block(&mut tree, outer, Rect::from_xywh(5.0, 5.0, 50.0, 50.0));

    let mapped = map_rect_to_ancestor(
      &tree,
      inner,
      None,
      Rect::from_xywh(0.0, 0.0, 50.0, 50.0),
      MapFlags::empty(),
    )
    .unwrap();
    assert_eq!(mapped, Rect::from_xywh(15.0, 25.0, 50.0, 50.0));
  }

  #[test]
  fn test_point_round_trip() {
    let mut tree = new_tree();
    let root = tree.root();
    let outer = insert_block(&mut tree, root, Rect::from_xywh(10.0, 20.0, 200.0, 200.0));
    let inner = insert_block(&mut tree, outer, Rect::from_xywh(7.0, 3.0, 50.0, 50.0));

    let local = Point::new(4.0, 9.0);
    let up = map_point_to_ancestor(&tree, inner, None, local, MapFlags::empty()).unwrap();
    let down = map_point_from_ancestor(&tree, inner, None, up, MapFlags::empty()).unwrap();
    assert!(down.approx_eq(local, 1e-5));
  }

  #[test]
  fn test_scroll_offset_subtracted() {
    let mut tree = new_tree();
    let root = tree.root();
    let scroller = {
      let mut style = ComputedStyle::default();
      style.overflow_y = Overflow::Scroll;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
      id
    };
    let child = insert_block(&mut tree, scroller, Rect::from_xywh(0.0, 150.0, 100.0, 20.0));
    tree.set_scroll_offset(scroller, Point::new(0.0, 120.0));

    let mapped = map_point_to_ancestor(&tree, child, None, Point::ZERO, MapFlags::empty()).unwrap();
    assert_eq!(mapped, Point::new(0.0, 30.0));
  }

  #[test]
  fn test_composited_scrolling_keeps_content_still() {
    let mut tree = new_tree();
    let root = tree.root();
    let scroller = {
      let mut style = ComputedStyle::default();
      style.overflow_y = Overflow::Scroll;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      id
    };
    tree.set_composited_scrolling(scroller, true);
    let child = insert_block(&mut tree, scroller, Rect::from_xywh(0.0, 150.0, 100.0, 20.0));
    tree.set_scroll_offset(scroller, Point::new(0.0, 120.0));

    // The backing moves instead; positions inside it do not change.
    let mapped =
      map_point_to_ancestor(&tree, child, Some(scroller), Point::ZERO, MapFlags::empty()).unwrap();
    assert_eq!(mapped, Point::new(0.0, 150.0));
  }

  #[test]
  fn test_transform_applied_about_origin() {
    let mut tree = new_tree();
    let root = tree.root();
    let id = {
      let mut style = ComputedStyle::default();
      style.transform = Some(Transform3D::scale(2.0, 2.0));
      style.transform_origin = Point::new(50.0, 50.0);
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
      id
    };

    let mapped = map_rect_to_ancestor(
      &tree,
      id,
      None,
      Rect::from_xywh(0.0, 0.0, 100.0, 100.0),
      MapFlags::APPLY_TRANSFORMS,
    )
    .unwrap();
    assert_eq!(mapped, Rect::from_xywh(-50.0, -50.0, 200.0, 200.0));
  }

  #[test]
  fn test_transforms_skipped_without_flag() {
    let mut tree = new_tree();
    let root = tree.root();
    let id = {
      let mut style = ComputedStyle::default();
      style.transform = Some(Transform3D::translation(40.0, 0.0));
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(10.0, 0.0, 100.0, 100.0));
      id
    };

    let without = map_point_to_ancestor(&tree, id, None, Point::ZERO, MapFlags::empty()).unwrap();
    let with =
      map_point_to_ancestor(&tree, id, None, Point::ZERO, MapFlags::APPLY_TRANSFORMS).unwrap();
    assert_eq!(without, Point::new(10.0, 0.0));
    assert_eq!(with, Point::new(50.0, 0.0));
  }

  #[test]
  fn test_flipped_blocks_container_flips_x() {
    let mut tree = new_tree();
    let root = tree.root();
    let container = {
      let mut style = ComputedStyle::default();
      style.writing_mode = WritingMode::VerticalRl;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(0.0, 0.0, 300.0, 100.0));
      id
    };
    let child = insert_block(&mut tree, container, Rect::from_xywh(10.0, 0.0, 40.0, 20.0));

    let mapped = map_rect_to_ancestor(
      &tree,
      child,
      Some(container),
      Rect::from_xywh(0.0, 0.0, 40.0, 20.0),
      MapFlags::APPLY_CONTAINER_FLIP,
    )
    .unwrap();
    // x' spans [300 - 50, 300 - 10].
    assert_eq!(mapped, Rect::from_xywh(250.0, 0.0, 40.0, 20.0));
  }

  #[test]
  fn test_absolute_skips_unpositioned_ancestor() {
    let mut tree = new_tree();
    let root = tree.root();
    let positioned = {
      let mut style = ComputedStyle::default();
      style.position = Position::Relative;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(100.0, 100.0, 400.0, 400.0));
      id
    };
    let middle = insert_block(&mut tree, positioned, Rect::from_xywh(50.0, 50.0, 300.0, 300.0));
    let abs = {
      let mut style = ComputedStyle::default();
      style.position = Position::Absolute;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(middle, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(20.0, 20.0, 10.0, 10.0));
      id
    };

    // Relative to the view, `middle`'s offset does not contribute.
    let mapped = map_point_to_ancestor(&tree, abs, None, Point::ZERO, MapFlags::empty()).unwrap();
    assert_eq!(mapped, Point::new(120.0, 120.0));

    // Mapping to the skipped structural parent compensates for its offset.
    let to_middle =
      map_point_to_ancestor(&tree, abs, Some(middle), Point::ZERO, MapFlags::empty()).unwrap();
    assert_eq!(to_middle, Point::new(-30.0, -30.0));
  }

  #[test]
  fn test_flow_thread_boundary_converts_once() {
    let mut tree = new_tree();
    let root = tree.root();
    let multicol = insert_block(&mut tree, root, Rect::from_xywh(0.0, 0.0, 210.0, 400.0));
    let thread = tree.create_node(NodeKind::FlowThread, Arc::new(ComputedStyle::default()));
    tree.insert_child(multicol, thread, None).unwrap();
    tree.set_fragmentation_info(
      thread,
      FragmentationInfo {
        column_width: 100.0,
        column_height: 400.0,
        column_gap: 10.0,
      },
    );
    let content = insert_block(&mut tree, thread, Rect::from_xywh(0.0, 430.0, 100.0, 20.0));

    // Flow y=430 lands 30px into the second column.
    let mapped = map_point_to_ancestor(&tree, content, None, Point::ZERO, MapFlags::empty()).unwrap();
    assert_eq!(mapped, Point::new(110.0, 30.0));
  }

  #[test]
  fn test_visual_rect_clipped_by_overflow_container() {
    let mut tree = new_tree();
    let root = tree.root();
    let clipper = {
      let mut style = ComputedStyle::default();
      style.overflow_x = Overflow::Hidden;
      style.overflow_y = Overflow::Hidden;
      let id = tree.create_node(NodeKind::Block, Arc::new(style));
      tree.insert_child(root, id, None).unwrap();
      tree.set_geometry(id, Rect::from_xywh(10.0, 10.0, 100.0, 100.0));
      id
    };
    let child = insert_block(&mut tree, clipper, Rect::from_xywh(80.0, 0.0, 60.0, 20.0));

    let mapped = map_to_visual_rect_in_ancestor_space(
      &tree,
      child,
      None,
      Rect::from_xywh(0.0, 0.0, 60.0, 20.0),
    )
    .unwrap();
    // Clipped to the container's 100px width before translating on.
    assert_eq!(mapped, Rect::from_xywh(90.0, 10.0, 20.0, 20.0));

    let far = insert_block(&mut tree, clipper, Rect::from_xywh(200.0, 0.0, 60.0, 20.0));
    let gone = map_to_visual_rect_in_ancestor_space(
      &tree,
      far,
      None,
      Rect::from_xywh(0.0, 0.0, 60.0, 20.0),
    )
    .unwrap();
    assert_eq!(gone, Rect::ZERO);
  }
}
