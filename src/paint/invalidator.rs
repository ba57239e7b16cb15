//! Paint invalidation walk
//!
//! After layout, dirty bits and pending full-invalidation reasons are spread
//! over the tree. The invalidator walks the tree once, pruning subtrees with
//! no marks, and for each checked node diffs the visual rect it painted last
//! time against the one it would paint now. The diff classifies into a
//! [`InvalidationReason`]; raster commands for the affected regions go to the
//! sink, expressed in the coordinate space of the node's paint-invalidation
//! container (its backing).
//!
//! The walk errs toward repainting: any case the classification cannot prove
//! coverable by a cheaper strategy falls through to a full old+new emission.
//! Nothing here ever erases a pending mark without acting on it.

use crate::geometry::{Point, Rect};
use crate::lifecycle::Phase;
use crate::map;
use crate::paint::reason::InvalidationReason;
use crate::paint::sink::{CompositorSink, InvalidationCommand, LayerCommand};
use crate::tree::node::{NodeFlags, NodeId};
use crate::tree::tree::RenderTree;

/// Runs the paint invalidation phase over a render tree
///
/// Stateless between runs; all persistent state lives on the nodes
/// (`previous_*` fields). One instance can serve many trees.
///
/// # Examples
///
/// ```
/// use fastpaint::{PaintInvalidator, RecordingSink, RenderTree};
/// use fastpaint::geometry::Size;
///
/// let mut tree = RenderTree::new(Size::new(800.0, 600.0));
/// let mut sink = RecordingSink::new();
/// PaintInvalidator::new().invalidate(&mut tree, &mut sink);
/// ```
#[derive(Debug, Default)]
pub struct PaintInvalidator;

/// What checking one node told the walk about its descendants
struct NodeOutcome {
  reason: InvalidationReason,
  /// The node's backing-relative position moved; descendants moved with it
  location_changed: bool,
}

impl NodeOutcome {
  fn clean() -> Self {
    Self {
      reason: InvalidationReason::None,
      location_changed: false,
    }
  }
}

impl PaintInvalidator {
  /// Creates an invalidator
  pub fn new() -> Self {
    Self
  }

  /// Walks the whole tree, emitting commands for every dirty region
  ///
  /// Enters the paint-invalidation lifecycle phase for the duration of the
  /// walk and restores the previous phase afterwards. Pending layer
  /// structure commands are drained to the sink first so the compositor
  /// knows about new backings before rects arrive for them.
  pub fn invalidate(&self, tree: &mut RenderTree, sink: &mut dyn CompositorSink) {
    let previous_phase = tree.advance_phase(Phase::PaintInvalidation);

    let layer_commands: Vec<LayerCommand> = tree.pending_layer_commands.drain(..).collect();
    for command in layer_commands {
      sink.update_layer(command);
    }

    let root = tree.root();
    self.walk(tree, sink, root, root, false, false);

    tree.advance_phase(previous_phase);
  }

  /// One step of the walk
  ///
  /// `forced_full` carries an ancestor's subtree invalidation down: every
  /// node under it repaints unconditionally. `check_all` is the weaker
  /// channel: an ancestor requested that the whole subtree be *checked*, but
  /// each node still classifies its own transition. It is raised both by the
  /// explicit subtree flag and by the walk itself whenever a checked node's
  /// backing-relative position moved, since every descendant moved with it
  /// without carrying a mark of its own.
  fn walk(
    &self,
    tree: &mut RenderTree,
    sink: &mut dyn CompositorSink,
    id: NodeId,
    backing: NodeId,
    forced_full: bool,
    check_all: bool,
  ) {
    let Some(node) = tree.get(id) else {
      return;
    };
    let check_self = forced_full || check_all || node.should_check_for_paint_invalidation();
    let check_children = check_self
      || node
        .flags
        .contains(NodeFlags::CHILD_SHOULD_CHECK_PAINT_INVALIDATION);
    if !check_self && !check_children {
      // Clean subtree.
      return;
    }

    // A node with its own backing invalidates into itself; so do its
    // descendants, until the next backing below.
    let own_backing = if node.is_paint_invalidation_container() {
      id
    } else {
      backing
    };
    let mut check_all_below = check_all
      || node
        .flags
        .contains(NodeFlags::MAY_NEED_PAINT_INVALIDATION_SUBTREE);

    let mut forced_full_below = forced_full;
    if check_self {
      let outcome = self.invalidate_node(tree, sink, id, own_backing, forced_full);
      if outcome.reason == InvalidationReason::Subtree {
        forced_full_below = true;
      }
      if outcome.location_changed {
        // Every descendant's backing-relative position moved with this node,
        // even though none of them carries a check bit of its own. They must
        // each recompute and re-store their visual rects.
        check_all_below = true;
      }
    }

    let children = tree.child_ids(id);
    tree.clear_paint_invalidation_flags(id);
    for child in children {
      self.walk(tree, sink, child, own_backing, forced_full_below, check_all_below);
    }
  }

  fn invalidate_node(
    &self,
    tree: &mut RenderTree,
    sink: &mut dyn CompositorSink,
    id: NodeId,
    backing: NodeId,
    forced_subtree: bool,
  ) -> NodeOutcome {
    let Some(node) = tree.get(id) else {
      return NodeOutcome::clean();
    };
    let local_rect = node.local_visual_rect();
    let new_rect = if id == backing {
      local_rect
    } else {
      map::map_to_visual_rect_in_ancestor_space(tree, id, Some(backing), local_rect)
        .unwrap_or(Rect::ZERO)
    };
    let new_location = if id == backing {
      Point::ZERO
    } else {
      map::map_point_to_ancestor(
        tree,
        id,
        Some(backing),
        Point::ZERO,
        map::MapFlags::for_visual_rects(),
      )
      .unwrap_or(Point::ZERO)
    };

    let node = match tree.get(id) {
      Some(node) => node,
      None => return NodeOutcome::clean(),
    };
    let old_rect = node.previous_visual_rect;
    let old_location = node.previous_location;
    let old_backing = node.previous_backing;
    let pending = node.full_invalidation_reason;
    let selection = node.flags.contains(NodeFlags::SHOULD_INVALIDATE_SELECTION);
    let obscured = node.flags.contains(NodeFlags::BACKGROUND_OBSCURED);
    let obscured_before = node.previous_background_obscured;
    let has_outline = node.style.has_outline();
    let paints_own = node.paints_own_content();

    let backing_changed = old_backing.is_some() && old_backing != Some(backing);

    let mut reason = if forced_subtree {
      InvalidationReason::Subtree
    } else {
      pending
    };
    if backing_changed {
      // Rects cached against the old backing mean nothing in the new one;
      // repaint fully on both sides.
      reason = reason.upgraded_with(InvalidationReason::BoundsChange);
    }
    if !reason.is_full() {
      reason = reason.upgraded_with(classify_geometry(
        old_rect,
        new_rect,
        old_location,
        new_location,
        has_outline,
        obscured != obscured_before,
        paints_own,
      ));
    }
    if selection && reason == InvalidationReason::None {
      reason = InvalidationReason::Selection;
    }

    if !tree.is_printing() {
      self.emit(
        sink,
        id,
        backing,
        old_backing,
        backing_changed,
        old_rect,
        new_rect,
        reason,
      );
    }

    if let Some(node) = tree.get_mut(id) {
      node.previous_visual_rect = new_rect;
      node.previous_location = new_location;
      node.previous_backing = Some(backing);
      node.previous_background_obscured = obscured;
      if reason != InvalidationReason::None {
        node.last_invalidation_reason = reason;
      }
      if reason.is_full() {
        node.flags |= NodeFlags::NEEDS_REPAINT;
      }
    }
    log::debug!("{}: {} (backing {})", id, reason, backing);
    NodeOutcome {
      reason,
      location_changed: new_location != old_location || new_rect.origin != old_rect.origin,
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn emit(
    &self,
    sink: &mut dyn CompositorSink,
    id: NodeId,
    backing: NodeId,
    old_backing: Option<NodeId>,
    backing_changed: bool,
    old_rect: Rect,
    new_rect: Rect,
    reason: InvalidationReason,
  ) {
    if reason == InvalidationReason::None {
      return;
    }

    if backing_changed {
      if let Some(old_backing) = old_backing {
        sink.update_layer(LayerCommand::Move {
          node: id,
          from: old_backing,
          to: backing,
        });
        if !old_rect.is_empty() {
          sink.invalidate(InvalidationCommand {
            backing: old_backing,
            rect: old_rect,
            reason,
          });
        }
      }
      if !new_rect.is_empty() {
        sink.invalidate(InvalidationCommand {
          backing,
          rect: new_rect,
          reason,
        });
      }
      return;
    }

    if reason == InvalidationReason::Incremental {
      for rect in incremental_rects(old_rect, new_rect) {
        sink.invalidate(InvalidationCommand {
          backing,
          rect,
          reason,
        });
      }
      return;
    }

    // Full emission: old and new rects, deduplicated by containment.
    if old_rect.contains_rect(new_rect) || new_rect.is_empty() {
      if !old_rect.is_empty() {
        sink.invalidate(InvalidationCommand {
          backing,
          rect: old_rect,
          reason,
        });
      }
      return;
    }
    if new_rect.contains_rect(old_rect) || old_rect.is_empty() {
      sink.invalidate(InvalidationCommand {
        backing,
        rect: new_rect,
        reason,
      });
      return;
    }
    sink.invalidate(InvalidationCommand {
      backing,
      rect: old_rect,
      reason,
    });
    sink.invalidate(InvalidationCommand {
      backing,
      rect: new_rect,
      reason,
    });
  }
}

/// Classifies a visual rect transition with no pending full reason
fn classify_geometry(
  old_rect: Rect,
  new_rect: Rect,
  old_location: Point,
  new_location: Point,
  has_outline: bool,
  obscuration_changed: bool,
  paints_own_content: bool,
) -> InvalidationReason {
  // An outline's shape depends on descendant geometry the rect diff cannot
  // see; any check of an outlined node repaints it.
  if has_outline {
    return InvalidationReason::Outline;
  }
  if obscuration_changed {
    return InvalidationReason::BackgroundObscurationChange;
  }
  if old_rect == new_rect {
    // Identical bounds can still paint elsewhere when the border-box origin
    // moved (flipped writing modes make this reachable).
    if new_location != old_location && !old_rect.is_empty() {
      return InvalidationReason::LocationChange;
    }
    return InvalidationReason::None;
  }
  if old_rect.origin != new_rect.origin {
    if old_rect.size == new_rect.size && !old_rect.is_empty() {
      // Pure translation: the full old and new rects repaint, classified as
      // a move rather than a resize.
      return InvalidationReason::LocationChange;
    }
    // Moved and resized at once; edge strips cannot cover that.
    return InvalidationReason::BoundsChange;
  }
  if !paints_own_content {
    // A pure container resizing in place paints nothing of its own; its
    // children carry their own marks.
    return InvalidationReason::None;
  }
  if old_rect.is_empty() && !new_rect.is_empty() {
    return InvalidationReason::BecameVisible;
  }
  if new_rect.is_empty() && !old_rect.is_empty() {
    return InvalidationReason::BecameInvisible;
  }
  if old_rect.is_empty() && new_rect.is_empty() {
    return InvalidationReason::None;
  }
  InvalidationReason::Incremental
}

/// The non-overlapping edge strips between two same-origin rects
fn incremental_rects(old: Rect, new: Rect) -> Vec<Rect> {
  debug_assert_eq!(old.origin, new.origin);
  let mut out = Vec::with_capacity(2);
  if old.width() != new.width() {
    let x0 = old.max_x().min(new.max_x());
    let x1 = old.max_x().max(new.max_x());
    out.push(Rect::from_xywh(
      x0,
      old.min_y(),
      x1 - x0,
      old.height().max(new.height()),
    ));
  }
  if old.height() != new.height() {
    let y0 = old.max_y().min(new.max_y());
    let y1 = old.max_y().max(new.max_y());
    // Capped at the shared width so the strips never overlap.
    let width = old.max_x().min(new.max_x()) - old.min_x();
    out.push(Rect::from_xywh(old.min_x(), y0, width, y1 - y0));
  }
  out
}
