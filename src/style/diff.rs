//! Style diff classification
//!
//! `classify` is the pure entry point of a style transition: given the old
//! and new computed style it produces a bitset describing what kind of work
//! the change requires. The bits are intentionally coarse; the tree layer
//! upgrades them further with node context (`adjust_style_difference`) before
//! translating them into dirty bits, and upgrades are the only legal
//! post-processing: a diff is never weakened after classification.

use bitflags::bitflags;

use crate::style::ComputedStyle;

bitflags! {
  /// What a style transition requires, as classified from the two snapshots
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct StyleDiff: u16 {
    /// Geometry changed in a way that needs a full layout pass
    const NEEDS_FULL_LAYOUT = 1 << 0;
    /// Only positioning offsets changed on an out-of-flow box
    const NEEDS_POSITIONED_MOVEMENT_LAYOUT = 1 << 1;
    /// The node itself must repaint
    const NEEDS_PAINT_INVALIDATION_OBJECT = 1 << 2;
    /// The node and every descendant must repaint
    const NEEDS_PAINT_INVALIDATION_SUBTREE = 1 << 3;
    /// Transform or perspective changed
    const TRANSFORM_CHANGED = 1 << 4;
    /// Opacity changed
    const OPACITY_CHANGED = 1 << 5;
    /// z-index changed
    const Z_INDEX_CHANGED = 1 << 6;
    /// Filter changed
    const FILTER_CHANGED = 1 << 7;
    /// Text decoration or color changed (cheap unless text/borders exist)
    const TEXT_DECORATION_OR_COLOR_CHANGED = 1 << 8;
    /// Visual overflow must be recomputed without relayout
    const NEEDS_RECOMPUTE_OVERFLOW = 1 << 9;
  }
}

impl StyleDiff {
  /// True if any layout work is required
  pub fn needs_layout(self) -> bool {
    self.intersects(StyleDiff::NEEDS_FULL_LAYOUT | StyleDiff::NEEDS_POSITIONED_MOVEMENT_LAYOUT)
  }

  /// True if a full layout is required
  pub fn needs_full_layout(self) -> bool {
    self.contains(StyleDiff::NEEDS_FULL_LAYOUT)
  }

  /// True if any paint invalidation is required
  pub fn needs_paint_invalidation(self) -> bool {
    self.intersects(
      StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT | StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE,
    )
  }

  /// True if the change touched a property the compositor can own directly
  pub fn compositable_property_changed(self) -> bool {
    self.intersects(
      StyleDiff::TRANSFORM_CHANGED
        | StyleDiff::OPACITY_CHANGED
        | StyleDiff::Z_INDEX_CHANGED
        | StyleDiff::FILTER_CHANGED,
    )
  }
}

/// Classifies a style transition into a [`StyleDiff`]
///
/// The classification is conservative in the "invalidate more" direction:
/// any property the core cannot prove paint-neutral maps to at least an
/// object-level invalidation.
pub fn classify(old: &ComputedStyle, new: &ComputedStyle) -> StyleDiff {
  let mut diff = StyleDiff::empty();

  // Structure and box-model changes need a full layout.
  if old.display != new.display
    || old.position != new.position
    || old.writing_mode != new.writing_mode
    || old.direction != new.direction
    || old.width != new.width
    || old.height != new.height
    || old.border_width != new.border_width
  {
    diff |= StyleDiff::NEEDS_FULL_LAYOUT | StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT;
  }

  // A display-type change rebuilds box semantics; nothing painted under the
  // old interpretation can be trusted.
  if old.display != new.display {
    diff |= StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE;
  }

  // Offset-only changes on positioned boxes move the box without resizing it.
  let offsets_changed = old.top != new.top
    || old.right != new.right
    || old.bottom != new.bottom
    || old.left != new.left;
  if offsets_changed {
    if new.position.is_out_of_flow() && !diff.needs_full_layout() {
      diff |= StyleDiff::NEEDS_POSITIONED_MOVEMENT_LAYOUT;
    } else if new.position.is_positioned() {
      diff |= StyleDiff::NEEDS_FULL_LAYOUT | StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT;
    }
  }

  if old.overflow_x != new.overflow_x || old.overflow_y != new.overflow_y {
    diff |= StyleDiff::NEEDS_FULL_LAYOUT | StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT;
  }

  if old.visibility != new.visibility || old.background_color != new.background_color {
    diff |= StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT;
  }

  if old.color != new.color || old.has_text_decoration != new.has_text_decoration {
    diff |= StyleDiff::TEXT_DECORATION_OR_COLOR_CHANGED;
  }

  if old.transform != new.transform
    || old.transform_origin != new.transform_origin
    || old.perspective != new.perspective
    || old.perspective_origin != new.perspective_origin
  {
    diff |= StyleDiff::TRANSFORM_CHANGED | StyleDiff::NEEDS_RECOMPUTE_OVERFLOW;
  }

  if old.opacity != new.opacity {
    diff |= StyleDiff::OPACITY_CHANGED;
  }

  if old.z_index != new.z_index {
    diff |= StyleDiff::Z_INDEX_CHANGED;
  }

  if old.has_filter != new.has_filter {
    diff |= StyleDiff::FILTER_CHANGED | StyleDiff::NEEDS_RECOMPUTE_OVERFLOW;
  }

  if old.outline_width != new.outline_width {
    // Outlines paint outside the border box, so visual overflow changes too.
    diff |= StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT | StyleDiff::NEEDS_RECOMPUTE_OVERFLOW;
  }

  diff
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::style::{Display, Position, Rgba};

  #[test]
  fn test_identical_styles_produce_empty_diff() {
    let style = ComputedStyle::default();
    assert_eq!(classify(&style, &style.clone()), StyleDiff::empty());
  }

  #[test]
  fn test_width_change_needs_full_layout() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.width = Some(120.0);
    let diff = classify(&old, &new);
    assert!(diff.needs_full_layout());
    assert!(diff.needs_paint_invalidation());
  }

  #[test]
  fn test_offset_change_on_absolute_is_movement_only() {
    let mut old = ComputedStyle::default();
    old.position = Position::Absolute;
    let mut new = old.clone();
    new.left = Some(50.0);
    let diff = classify(&old, &new);
    assert!(diff.contains(StyleDiff::NEEDS_POSITIONED_MOVEMENT_LAYOUT));
    assert!(!diff.needs_full_layout());
  }

  #[test]
  fn test_offset_change_on_static_is_ignored() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.left = Some(50.0);
    // Offsets have no effect on static boxes.
    assert!(!classify(&old, &new).needs_layout());
  }

  #[test]
  fn test_background_change_is_paint_only() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.background_color = Rgba::new(255, 0, 0, 255);
    let diff = classify(&old, &new);
    assert!(diff.contains(StyleDiff::NEEDS_PAINT_INVALIDATION_OBJECT));
    assert!(!diff.needs_layout());
    assert!(!diff.contains(StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE));
  }

  #[test]
  fn test_display_change_invalidates_subtree() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.display = Display::Table;
    let diff = classify(&old, &new);
    assert!(diff.contains(StyleDiff::NEEDS_PAINT_INVALIDATION_SUBTREE));
    assert!(diff.needs_full_layout());
  }

  #[test]
  fn test_transform_change_flags_transform_bit() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.transform = Some(crate::geometry::Transform3D::translation(5.0, 0.0));
    let diff = classify(&old, &new);
    assert!(diff.contains(StyleDiff::TRANSFORM_CHANGED));
    assert!(diff.contains(StyleDiff::NEEDS_RECOMPUTE_OVERFLOW));
    // Transform alone does not demand layout; the upgrade pass decides
    // whether paint invalidation is needed based on compositing state.
    assert!(!diff.needs_layout());
  }

  #[test]
  fn test_color_change_is_decoration_bit_only() {
    let old = ComputedStyle::default();
    let mut new = old.clone();
    new.color = Rgba::new(200, 0, 0, 255);
    let diff = classify(&old, &new);
    assert!(diff.contains(StyleDiff::TEXT_DECORATION_OR_COLOR_CHANGED));
    assert!(!diff.needs_paint_invalidation());
  }
}
