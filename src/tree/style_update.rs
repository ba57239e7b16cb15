//! Style application
//!
//! `apply_style` is the single entry point for swapping a node's computed
//! style. The raw diff from [`crate::style::diff::classify`] is adjusted
//! against node state twice (once against the pre-change state and once
//! against the post-change state) because compositing decisions on either
//! side of the swap can demand more work. Adjustment is strictly upgrading:
//! bits are only ever added, so neither pass can cancel work the other
//! discovered.

use std::sync::Arc;

use crate::paint::reason::InvalidationReason;
use crate::style::diff::{classify, StyleDiff};
use crate::style::ComputedStyle;
use crate::tree::node::{NodeFlags, NodeId};
use crate::tree::tree::RenderTree;

/// Upgrades a classified diff using the node's current state
///
/// A transform, opacity, filter or z-index change on a node whose layer
/// paints into its own composited backing is carried entirely by the
/// compositor: no main-thread repaint. Without such a backing the change
/// repaints the node and every descendant, since their painted positions all
/// depend on it.
pub(crate) fn adjust_style_difference(
  tree: &RenderTree,
  id: NodeId,
  mut diff: StyleDiff,
) -> StyleDiff {
  let Some(node) = tree.get(id) else {
    return diff;
  };
  if diff.compositable_property_changed() && !node.is_composited() {
    diff |= StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT | StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE;
  }
  diff
}

/// Swaps `id`'s computed style for `new_style` and records the required work
///
/// Returns the fully adjusted diff. Layout dirty bits, paint invalidation
/// reasons, overflow recalc marks and layer structure updates are all pushed
/// onto the tree as side effects; the caller only reacts to the returned
/// diff if it wants to.
pub fn apply_style(tree: &mut RenderTree, id: NodeId, new_style: Arc<ComputedStyle>) -> StyleDiff {
  let Some(node) = tree.get(id) else {
    return StyleDiff::empty();
  };
  let old_style = node.style.clone();
  if *old_style == *new_style {
    return StyleDiff::empty();
  }

  let mut diff = classify(&old_style, &new_style);
  // First adjustment sees the pre-change compositing state.
  diff = adjust_style_difference(tree, id, diff);

  style_will_change(tree, id, diff);

  if let Some(node) = tree.get_mut(id) {
    node.style = new_style.clone();
  }

  let layer_changed = tree.update_layer_state(id);
  if layer_changed {
    // Gaining or losing a backing reshuffles what paints where.
    tree.set_should_do_full_invalidation(id, InvalidationReason::StyleChange);
  }

  // Second adjustment sees the post-change compositing state; it can only
  // add bits.
  diff = adjust_style_difference(tree, id, diff);

  style_did_change(tree, id, &old_style, &new_style, diff);
  diff
}

fn style_will_change(tree: &mut RenderTree, id: NodeId, diff: StyleDiff) {
  if diff.needs_full_layout() {
    if let Some(node) = tree.get_mut(id) {
      node.flags |= NodeFlags::SELF_NEEDS_LAYOUT;
    }
  } else if diff.contains(StyleDiff::NEEDS_POSITIONED_MOVEMENT_LAYOUT) {
    if let Some(node) = tree.get_mut(id) {
      node.flags |= NodeFlags::NEEDS_POSITIONED_MOVEMENT_LAYOUT;
    }
  }
}

fn style_did_change(
  tree: &mut RenderTree,
  id: NodeId,
  old_style: &ComputedStyle,
  new_style: &ComputedStyle,
  diff: StyleDiff,
) {
  if diff.contains(StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE) {
    tree.set_should_do_full_invalidation(id, InvalidationReason::Subtree);
    tree.set_may_need_paint_invalidation_subtree(id);
  } else if diff.contains(StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT) {
    tree.set_should_do_full_invalidation(id, InvalidationReason::StyleChange);
  }

  if diff.contains(StyleDiff::TEXT_DECORATION_OR_COLOR_CHANGED)
    && !diff.needs_paint_invalidation()
  {
    // Color only shows where something is painted with it.
    let paints_with_color = tree.get(id).is_some_and(|node| {
      node.kind.is_text()
        || old_style.has_text_decoration
        || new_style.has_text_decoration
        || new_style.has_outline()
    });
    if paints_with_color {
      tree.set_should_do_full_invalidation(id, InvalidationReason::StyleChange);
    }
  }

  if diff.needs_layout() {
    // Layout will move things; make sure the walk revisits this node even if
    // nothing else marked it.
    tree.set_may_need_paint_invalidation(id);
  }

  if diff.contains(StyleDiff::NEEDS_RECOMPUTE_OVERFLOW) && !diff.needs_full_layout() {
    tree.set_needs_overflow_recalc(id);
  }
}
