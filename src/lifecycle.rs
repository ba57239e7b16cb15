//! Document lifecycle phases
//!
//! The tree is mutated and walked on one thread under a strict phase
//! discipline: style → layout → paint invalidation → paint → compositing.
//! Structural tree mutation is only legal in phases that allow it, tracked by
//! an explicit phase value held by the tree plus a scoped override counter.
//!
//! Violations are programming errors: they assert in debug builds and degrade
//! to logged no-ops in release builds (the caller's risk, per the mutation
//! contract on `RenderTree::insert_child`).

/// A lifecycle phase of the document update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  /// Between updates; mutation allowed
  Idle,
  /// Style recalculation; mutation allowed (style drives tree shape)
  StyleRecalc,
  /// Active layout; mutation forbidden
  Layout,
  /// Paint invalidation tree walk; mutation forbidden
  PaintInvalidation,
  /// Paint; mutation forbidden
  Paint,
  /// Compositing update; mutation forbidden
  Compositing,
}

impl Phase {
  /// Whether structural tree mutations are legal during this phase
  pub fn allows_tree_mutations(self) -> bool {
    matches!(self, Phase::Idle | Phase::StyleRecalc)
  }
}

/// Lifecycle state carried by the render tree
///
/// Tracks the active phase and an override counter for the rare callers that
/// must restructure the tree from inside a locked phase.
#[derive(Debug, Clone)]
pub struct DocumentLifecycle {
  phase: Phase,
  mutation_overrides: u32,
}

impl DocumentLifecycle {
  /// Starts a lifecycle in the idle phase
  pub fn new() -> Self {
    Self {
      phase: Phase::Idle,
      mutation_overrides: 0,
    }
  }

  /// The currently active phase
  pub fn phase(&self) -> Phase {
    self.phase
  }

  /// Enters `phase`, returning the previous one
  pub fn advance_to(&mut self, phase: Phase) -> Phase {
    let previous = self.phase;
    log::trace!("lifecycle: {:?} -> {:?}", previous, phase);
    self.phase = phase;
    previous
  }

  /// Whether structural mutation is currently legal
  pub fn allows_tree_mutations(&self) -> bool {
    self.mutation_overrides > 0 || self.phase.allows_tree_mutations()
  }

  /// Pushes a scoped mutation override (see `RenderTree::with_mutations_allowed`)
  pub(crate) fn push_mutation_override(&mut self) {
    self.mutation_overrides += 1;
  }

  /// Pops a scoped mutation override
  pub(crate) fn pop_mutation_override(&mut self) {
    debug_assert!(self.mutation_overrides > 0);
    self.mutation_overrides = self.mutation_overrides.saturating_sub(1);
  }
}

impl Default for DocumentLifecycle {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_idle_allows_mutations() {
    assert!(Phase::Idle.allows_tree_mutations());
    assert!(Phase::StyleRecalc.allows_tree_mutations());
    assert!(!Phase::Layout.allows_tree_mutations());
    assert!(!Phase::PaintInvalidation.allows_tree_mutations());
  }

  #[test]
  fn test_override_unlocks_locked_phase() {
    let mut lifecycle = DocumentLifecycle::new();
    lifecycle.advance_to(Phase::Layout);
    assert!(!lifecycle.allows_tree_mutations());
    lifecycle.push_mutation_override();
    assert!(lifecycle.allows_tree_mutations());
    lifecycle.pop_mutation_override();
    assert!(!lifecycle.allows_tree_mutations());
  }

  #[test]
  fn test_advance_returns_previous() {
    let mut lifecycle = DocumentLifecycle::new();
    assert_eq!(lifecycle.advance_to(Phase::Layout), Phase::Idle);
    assert_eq!(lifecycle.advance_to(Phase::Idle), Phase::Layout);
  }
}
