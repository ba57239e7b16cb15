//! Paint invalidation reasons
//!
//! The reason enum is totally ordered by severity; marking a node with a
//! reason never downgrades an already-recorded stronger one. `Subtree`
//! dominates everything and short-circuits finer-grained classification for
//! all descendants.

use std::fmt;

/// Why a region must be repainted
///
/// Derive order is the severity order: later variants dominate earlier ones.
/// `DelayedFull` is the weakest *full* reason, a placeholder that any
/// concrete full reason may replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InvalidationReason {
  /// Nothing to repaint
  #[default]
  None,
  /// Same-size or grow/shrink on one axis; only edge delta strips repaint
  Incremental,
  /// The selection over the node changed
  Selection,
  /// Bounds unchanged but the backing-relative location moved
  LocationChange,
  /// Full invalidation requested, concrete reason to be decided later
  DelayedFull,
  /// Empty before, non-empty now
  BecameVisible,
  /// Non-empty before, empty now
  BecameInvisible,
  /// Whether children fully obscure the background changed
  BackgroundObscurationChange,
  /// An outline is present; outline shape depends on descendant geometry
  Outline,
  /// The bounds moved or resized in a way incremental repaint cannot cover
  BoundsChange,
  /// A style change requires re-recording the node's paint
  StyleChange,
  /// The node and every descendant must repaint unconditionally
  Subtree,
}

impl InvalidationReason {
  /// True for reasons that require repainting the full visual rect
  pub fn is_full(self) -> bool {
    self >= InvalidationReason::DelayedFull
  }

  /// Merges a newly requested reason into an existing slot
  ///
  /// The slot is monotone: an empty or delayed-full slot accepts the new
  /// reason, anything else keeps the stronger of the two.
  pub fn upgraded_with(self, new: InvalidationReason) -> InvalidationReason {
    match self {
      InvalidationReason::None => new,
      InvalidationReason::DelayedFull if new != InvalidationReason::None => new.max(self),
      _ => self.max(new),
    }
  }
}

impl fmt::Display for InvalidationReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      InvalidationReason::None => "none",
      InvalidationReason::Incremental => "incremental",
      InvalidationReason::Selection => "selection",
      InvalidationReason::LocationChange => "location change",
      InvalidationReason::DelayedFull => "delayed full",
      InvalidationReason::BecameVisible => "became visible",
      InvalidationReason::BecameInvisible => "became invisible",
      InvalidationReason::BackgroundObscurationChange => "background obscuration change",
      InvalidationReason::Outline => "outline",
      InvalidationReason::BoundsChange => "bounds change",
      InvalidationReason::StyleChange => "style change",
      InvalidationReason::Subtree => "subtree",
    };
    f.write_str(name)
  }
}
