//! Render tree arena and mutation protocol
//!
//! Nodes live in a slot arena addressed by generation-checked [`NodeId`]
//! handles. Child lists are intrusive doubly linked lists expressed through
//! handles: `first_child`/`next_sibling` are the owning direction,
//! `parent`/`prev_sibling` are back-references. Destroying a subtree frees
//! slots along the owning edges; back-references never keep anything alive.
//!
//! # Mutation protocol
//!
//! Structural mutation (insert, remove, destroy) is only legal while the
//! lifecycle phase allows it. Violations are programming errors: they fail a
//! debug assertion, and in release builds the operation is dropped with a
//! warning. The worst outcome of a dropped mutation is a stale-pixel bug,
//! which is the direction this subsystem is designed to fail in.
//!
//! Insertion consults the anonymous wrapper rules (see
//! [`crate::tree::anonymous`]) before touching the raw links, so callers
//! never need to know tabular structure requirements.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{Result, TreeError};
use crate::geometry::{Point, Rect, Size};
use crate::lifecycle::{DocumentLifecycle, Phase};
use crate::paint::reason::InvalidationReason;
use crate::paint::sink::LayerCommand;
use crate::style::ComputedStyle;
use crate::tree::anonymous;
use crate::tree::node::{FragmentationInfo, NodeFlags, NodeId, NodeKind, RenderNode};

/// Subscriber to structural tree notifications
///
/// The accessibility cache and scroll anchor registry subscribe to these; the
/// tree never pushes data beyond the notification points, consumers pull what
/// they need afterwards.
pub trait TreeObserver {
  /// A node was linked into the tree
  fn inserted_into_tree(&mut self, _id: NodeId) {}

  /// A node is about to be unlinked (links are still intact)
  fn will_be_removed_from_tree(&mut self, _id: NodeId) {}

  /// A node's child list changed
  fn children_changed(&mut self, _parent: NodeId) {}

  /// A node was destroyed; identity-keyed caches must drop their entries now
  fn node_destroyed(&mut self, _id: NodeId) {}
}

#[derive(Debug)]
struct Slot {
  generation: u32,
  node: Option<RenderNode>,
}

/// The render tree
///
/// Owns every node, the lifecycle phase, and the queue of pending layer
/// structure commands drained by the paint invalidator.
pub struct RenderTree {
  slots: Vec<Slot>,
  free_list: Vec<u32>,
  root: NodeId,
  pub(crate) lifecycle: DocumentLifecycle,
  printing: bool,
  observers: Vec<Rc<RefCell<dyn TreeObserver>>>,
  pub(crate) pending_layer_commands: Vec<LayerCommand>,
}

impl RenderTree {
  /// Creates a tree with a view root covering `viewport`
  pub fn new(viewport: Size) -> Self {
    let mut tree = Self {
      slots: Vec::new(),
      free_list: Vec::new(),
      root: NodeId::INVALID,
      lifecycle: DocumentLifecycle::new(),
      printing: false,
      observers: Vec::new(),
      pending_layer_commands: Vec::new(),
    };
    let root = tree.allocate(NodeKind::View, Arc::new(ComputedStyle::default()));
    if let Some(node) = tree.get_mut(root) {
      node.size = viewport;
    }
    tree.root = root;
    tree
  }

  /// The view root
  pub fn root(&self) -> NodeId {
    self.root
  }

  /// Currently active lifecycle phase
  pub fn phase(&self) -> Phase {
    self.lifecycle.phase()
  }

  /// Enters a lifecycle phase, returning the previous one
  pub fn advance_phase(&mut self, phase: Phase) -> Phase {
    self.lifecycle.advance_to(phase)
  }

  /// Runs `f` with structural mutation temporarily allowed
  ///
  /// The escape hatch for callers that must restructure the tree from inside
  /// a locked phase. Use sparingly; the override nests.
  pub fn with_mutations_allowed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
    self.lifecycle.push_mutation_override();
    let result = f(self);
    self.lifecycle.pop_mutation_override();
    result
  }

  /// Whether the document is printing (suppresses invalidation emission)
  pub fn is_printing(&self) -> bool {
    self.printing
  }

  /// Sets printing mode
  pub fn set_printing(&mut self, printing: bool) {
    self.printing = printing;
  }

  /// Registers a structural notification subscriber
  pub fn add_observer(&mut self, observer: Rc<RefCell<dyn TreeObserver>>) {
    self.observers.push(observer);
  }

  fn notify(&self, f: impl Fn(&mut dyn TreeObserver)) {
    for observer in &self.observers {
      f(&mut *observer.borrow_mut());
    }
  }

  // ===== ARENA =====

  fn allocate(&mut self, kind: NodeKind, style: Arc<ComputedStyle>) -> NodeId {
    let index = match self.free_list.pop() {
      Some(index) => index,
      None => {
        self.slots.push(Slot {
          generation: 0,
          node: None,
        });
        (self.slots.len() - 1) as u32
      }
    };
    let generation = self.slots[index as usize].generation;
    let id = NodeId { index, generation };
    self.slots[index as usize].node = Some(RenderNode::new(id, kind, style));
    id
  }

  /// True if `id` refers to a live node
  pub fn contains(&self, id: NodeId) -> bool {
    self
      .slots
      .get(id.index as usize)
      .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
  }

  /// Resolves a handle, `None` for stale or freed handles
  pub fn get(&self, id: NodeId) -> Option<&RenderNode> {
    let slot = self.slots.get(id.index as usize)?;
    if slot.generation != id.generation {
      return None;
    }
    slot.node.as_ref()
  }

  /// Mutable handle resolution
  pub fn get_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
    let slot = self.slots.get_mut(id.index as usize)?;
    if slot.generation != id.generation {
      return None;
    }
    slot.node.as_mut()
  }

  fn free_slot(&mut self, id: NodeId) {
    if let Some(slot) = self.slots.get_mut(id.index as usize) {
      if slot.generation == id.generation {
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
      }
    }
  }

  /// Number of live nodes, including the root
  pub fn node_count(&self) -> usize {
    self.slots.iter().filter(|slot| slot.node.is_some()).count()
  }

  // ===== CREATION =====

  /// Creates an unlinked node for a document element
  pub fn create_node(&mut self, kind: NodeKind, style: Arc<ComputedStyle>) -> NodeId {
    let id = self.allocate(kind, style);
    self.update_layer_state(id);
    id
  }

  /// Creates an unlinked anonymous node
  ///
  /// The style is derived from `parent_style` (inherited properties only)
  /// with the display mapped from `kind`; anonymous nodes never carry author
  /// styles.
  pub fn create_anonymous(&mut self, kind: NodeKind, parent_style: &ComputedStyle) -> NodeId {
    let style = ComputedStyle::anonymous_with_display(parent_style, kind.anonymous_display());
    let id = self.allocate(kind, Arc::new(style));
    if let Some(node) = self.get_mut(id) {
      node.flags |= NodeFlags::IS_ANONYMOUS;
    }
    id
  }

  // ===== LINKAGE QUERIES =====

  /// Parent handle of `id`
  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.parent)
  }

  /// First child handle of `id`
  pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.first_child)
  }

  /// Last child handle of `id`
  pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.last_child)
  }

  /// Next sibling handle of `id`
  pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.next_sibling)
  }

  /// Previous sibling handle of `id`
  pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.prev_sibling)
  }

  /// Child handles of `id`, front to back
  pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut current = self.first_child(id);
    while let Some(child) = current {
      out.push(child);
      current = self.next_sibling(child);
    }
    out
  }

  // ===== TRAVERSAL =====

  /// Next node in pre-order, never ascending above `boundary`
  ///
  /// Repeating this from `boundary` visits every descendant of `boundary`
  /// exactly once and then yields `None`; the traversal cannot escape into
  /// siblings of an ancestor outside the subtree.
  pub fn next_in_preorder(&self, id: NodeId, boundary: Option<NodeId>) -> Option<NodeId> {
    if let Some(first) = self.first_child(id) {
      return Some(first);
    }
    self.next_in_preorder_after_children(id, boundary)
  }

  /// Pre-order successor skipping `id`'s children
  pub fn next_in_preorder_after_children(
    &self,
    id: NodeId,
    boundary: Option<NodeId>,
  ) -> Option<NodeId> {
    let mut current = id;
    loop {
      if boundary == Some(current) {
        return None;
      }
      if let Some(next) = self.next_sibling(current) {
        return Some(next);
      }
      current = self.parent(current)?;
    }
  }

  /// Previous node in pre-order
  pub fn previous_in_preorder(&self, id: NodeId) -> Option<NodeId> {
    if let Some(prev) = self.prev_sibling(id) {
      // Deepest last descendant of the previous sibling.
      let mut current = prev;
      while let Some(last) = self.last_child(current) {
        current = last;
      }
      return Some(current);
    }
    self.parent(id)
  }

  // ===== MUTATION =====

  fn mutation_allowed(&self, operation: &str) -> bool {
    if self.lifecycle.allows_tree_mutations() {
      return true;
    }
    debug_assert!(
      false,
      "structural tree mutation ({}) during {:?}",
      operation,
      self.lifecycle.phase()
    );
    log::warn!(
      "dropped {} during {:?}: structural mutation is not allowed in this phase",
      operation,
      self.lifecycle.phase()
    );
    false
  }

  /// Inserts `child` into `parent`'s child list before `before` (end if
  /// `None`)
  ///
  /// Runs the anonymous wrapper synthesizer first when the (parent kind,
  /// child kind) pair requires one, so the child may end up linked inside a
  /// synthesized wrapper rather than directly under `parent`.
  ///
  /// Only legal while the lifecycle phase allows structural mutation; a
  /// violation asserts in debug builds and silently drops the insertion in
  /// release builds.
  pub fn insert_child(
    &mut self,
    parent: NodeId,
    child: NodeId,
    before: Option<NodeId>,
  ) -> Result<()> {
    if !self.contains(parent) {
      return Err(TreeError::StaleHandle { id: parent }.into());
    }
    if !self.contains(child) {
      return Err(TreeError::StaleHandle { id: child }.into());
    }
    let parent_kind = self.get(parent).map(|n| n.kind);
    if parent_kind.is_some_and(NodeKind::is_leaf) {
      return Err(TreeError::NotAContainer { parent }.into());
    }
    if let Some(before) = before {
      if self.parent(before) != Some(parent) {
        return Err(TreeError::NotAChild { parent, before }.into());
      }
    }
    {
      // Setting a parent pointer on a node that is still linked elsewhere
      // would corrupt both lists.
      let child_node = self
        .get(child)
        .ok_or(TreeError::StaleHandle { id: child })?;
      if child_node.parent.is_some()
        || child_node.prev_sibling.is_some()
        || child_node.next_sibling.is_some()
      {
        debug_assert!(false, "inserting a node that is already linked: {}", child);
        return Err(
          TreeError::AlreadyLinked {
            id: child,
            phase: self.lifecycle.phase(),
          }
          .into(),
        );
      }
    }
    if !self.mutation_allowed("insert_child") {
      return Ok(());
    }

    let parent_kind = parent_kind.unwrap_or(NodeKind::Block);
    let child_kind = self.get(child).map(|n| n.kind).unwrap_or(NodeKind::Block);
    if let Some(wrapper_kind) = anonymous::required_wrapper_kind(parent_kind, child_kind) {
      return anonymous::insert_with_wrapper(self, parent, child, before, wrapper_kind);
    }

    self.raw_insert(parent, child, before);
    self.did_insert(parent, child);
    Ok(())
  }

  fn raw_insert(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
    match before {
      Some(before) => {
        let prev = self.prev_sibling(before);
        if let Some(node) = self.get_mut(child) {
          node.parent = Some(parent);
          node.prev_sibling = prev;
          node.next_sibling = Some(before);
        }
        if let Some(node) = self.get_mut(before) {
          node.prev_sibling = Some(child);
        }
        match prev {
          Some(prev) => {
            if let Some(node) = self.get_mut(prev) {
              node.next_sibling = Some(child);
            }
          }
          None => {
            if let Some(node) = self.get_mut(parent) {
              node.first_child = Some(child);
            }
          }
        }
      }
      None => {
        let last = self.last_child(parent);
        if let Some(node) = self.get_mut(child) {
          node.parent = Some(parent);
          node.prev_sibling = last;
          node.next_sibling = None;
        }
        match last {
          Some(last) => {
            if let Some(node) = self.get_mut(last) {
              node.next_sibling = Some(child);
            }
          }
          None => {
            if let Some(node) = self.get_mut(parent) {
              node.first_child = Some(child);
            }
          }
        }
        if let Some(node) = self.get_mut(parent) {
          node.last_child = Some(child);
        }
      }
    }
  }

  fn did_insert(&mut self, parent: NodeId, child: NodeId) {
    log::trace!("inserted {} into {}", child, parent);

    // Flow thread membership propagates downward.
    let inside_flow_thread = self.get(parent).is_some_and(|p| {
      matches!(p.kind, NodeKind::FlowThread) || p.flags.contains(NodeFlags::INSIDE_FLOW_THREAD)
    });
    if inside_flow_thread {
      self.set_flow_thread_flag_recursive(child, true);
    }

    // Freshly inserted content has no previous visual rect; it must fully
    // paint on the next update, and the parent must be rechecked.
    self.set_should_do_full_invalidation(child, InvalidationReason::StyleChange);
    self.set_may_need_paint_invalidation(parent);

    self.notify(|observer| observer.inserted_into_tree(child));
    self.notify(|observer| observer.children_changed(parent));
  }

  fn set_flow_thread_flag_recursive(&mut self, id: NodeId, value: bool) {
    if let Some(node) = self.get_mut(id) {
      node.flags.set(NodeFlags::INSIDE_FLOW_THREAD, value);
    }
    let mut current = self.first_child(id);
    while let Some(child) = current {
      // An inner fragmentation context owns its own membership.
      if !matches!(self.get(child).map(|n| n.kind), Some(NodeKind::FlowThread)) {
        self.set_flow_thread_flag_recursive(child, value);
      }
      current = self.next_sibling(child);
    }
  }

  /// Unlinks `child` from `parent` without destroying it
  ///
  /// Ownership of the detached subtree transfers to the caller: the nodes
  /// stay allocated and may be reinserted or destroyed.
  pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
    if !self.contains(parent) {
      return Err(TreeError::StaleHandle { id: parent }.into());
    }
    if self.parent(child) != Some(parent) {
      return Err(TreeError::NotAChild {
        parent,
        before: child,
      }
      .into());
    }
    if !self.mutation_allowed("remove_child") {
      return Ok(());
    }

    self.notify(|observer| observer.will_be_removed_from_tree(child));

    // The child's pixels are still on screen; the parent conservatively
    // repaints to cover the hole.
    self.set_should_do_full_invalidation(parent, InvalidationReason::StyleChange);

    self.raw_remove(parent, child);
    self.set_flow_thread_flag_recursive(child, false);

    // The detached subtree's cached rects are meaningless in its next home.
    if let Some(node) = self.get_mut(child) {
      node.previous_visual_rect = Rect::ZERO;
      node.previous_location = Point::ZERO;
      node.previous_backing = None;
    }

    self.notify(|observer| observer.children_changed(parent));
    log::trace!("removed {} from {}", child, parent);
    Ok(())
  }

  fn raw_remove(&mut self, parent: NodeId, child: NodeId) {
    let (prev, next) = match self.get(child) {
      Some(node) => (node.prev_sibling, node.next_sibling),
      None => return,
    };
    match prev {
      Some(prev) => {
        if let Some(node) = self.get_mut(prev) {
          node.next_sibling = next;
        }
      }
      None => {
        if let Some(node) = self.get_mut(parent) {
          node.first_child = next;
        }
      }
    }
    match next {
      Some(next) => {
        if let Some(node) = self.get_mut(next) {
          node.prev_sibling = prev;
        }
      }
      None => {
        if let Some(node) = self.get_mut(parent) {
          node.last_child = prev;
        }
      }
    }
    if let Some(node) = self.get_mut(child) {
      node.parent = None;
      node.prev_sibling = None;
      node.next_sibling = None;
    }
  }

  /// Destroys `id` and its entire subtree
  ///
  /// Explicit teardown: children are destroyed first (they are owned), the
  /// node is detached, observers are told, and the arena slot is freed with a
  /// generation bump so outstanding handles go stale instead of aliasing.
  pub fn destroy(&mut self, id: NodeId) -> Result<()> {
    if !self.contains(id) {
      return Err(TreeError::StaleHandle { id }.into());
    }
    if !self.mutation_allowed("destroy") {
      return Ok(());
    }
    self.destroy_internal(id);
    Ok(())
  }

  fn destroy_internal(&mut self, id: NodeId) {
    // Children first, including leftover anonymous ones.
    let children = self.child_ids(id);
    for child in children {
      self.destroy_internal(child);
    }

    if let Some(parent) = self.parent(id) {
      self.notify(|observer| observer.will_be_removed_from_tree(id));
      self.set_should_do_full_invalidation(parent, InvalidationReason::StyleChange);
      self.raw_remove(parent, id);
      self.notify(|observer| observer.children_changed(parent));
    }

    self.notify(|observer| observer.node_destroyed(id));
    self.free_slot(id);
    log::trace!("destroyed {}", id);
  }

  /// Destroys `id` together with any anonymous wrappers it leaves empty
  ///
  /// Walks upward while each successive parent is anonymous, would become
  /// childless, and is not tracked by another subsystem (a flow thread, or an
  /// anonymous continuation target); those are hard stop conditions. The
  /// highest qualifying ancestor becomes the destruction root, so no empty
  /// anonymous shells dangle.
  pub fn destroy_and_cleanup_anonymous_wrappers(&mut self, id: NodeId) -> Result<()> {
    if !self.contains(id) {
      return Err(TreeError::StaleHandle { id }.into());
    }
    let mut destroy_root = id;
    while let Some(parent) = self.parent(destroy_root) {
      let Some(parent_node) = self.get(parent) else {
        break;
      };
      if !parent_node.is_anonymous() {
        break;
      }
      if matches!(parent_node.kind, NodeKind::FlowThread) {
        break;
      }
      if parent_node.flags.contains(NodeFlags::IS_CONTINUATION) {
        break;
      }
      if parent_node.first_child != Some(destroy_root)
        || parent_node.last_child != Some(destroy_root)
      {
        // The wrapper keeps other children; it stays.
        break;
      }
      destroy_root = parent;
    }
    self.destroy(destroy_root)
  }

  // ===== DIRTY BITS =====

  /// Marks `id` as needing a full paint invalidation with `reason`
  ///
  /// The stored reason is monotone: it only ever gets stronger, except that
  /// the `DelayedFull` placeholder yields to any concrete reason. Ancestors
  /// are eagerly marked so the tree walk can prune clean subtrees.
  pub fn set_should_do_full_invalidation(&mut self, id: NodeId, reason: InvalidationReason) {
    debug_assert!(reason.is_full(), "{} is not a full invalidation reason", reason);
    let Some(node) = self.get_mut(id) else {
      return;
    };
    let current = node.full_invalidation_reason;
    let upgrading_delayed =
      current == InvalidationReason::DelayedFull && reason != InvalidationReason::DelayedFull;
    let merged = current.upgraded_with(reason);
    if merged == current && current != InvalidationReason::None {
      return;
    }
    node.full_invalidation_reason = merged;
    if current == InvalidationReason::None || !upgrading_delayed {
      self.mark_ancestors_for_paint_invalidation(id);
    }
  }

  /// Requests an invalidation check for `id` on the next walk
  pub fn set_may_need_paint_invalidation(&mut self, id: NodeId) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    if node.flags.contains(NodeFlags::MAY_NEED_PAINT_INVALIDATION) {
      return;
    }
    node.flags |= NodeFlags::MAY_NEED_PAINT_INVALIDATION;
    self.mark_ancestors_for_paint_invalidation(id);
  }

  /// Requests an invalidation check for `id` and its whole subtree
  pub fn set_may_need_paint_invalidation_subtree(&mut self, id: NodeId) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    if node
      .flags
      .contains(NodeFlags::MAY_NEED_PAINT_INVALIDATION_SUBTREE)
    {
      return;
    }
    node.flags |= NodeFlags::MAY_NEED_PAINT_INVALIDATION_SUBTREE;
    self.set_may_need_paint_invalidation(id);
  }

  /// Marks the selection over `id` as changed
  pub fn set_should_invalidate_selection(&mut self, id: NodeId) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    node.flags |= NodeFlags::SHOULD_INVALIDATE_SELECTION;
    self.mark_ancestors_for_paint_invalidation(id);
  }

  pub(crate) fn mark_ancestors_for_paint_invalidation(&mut self, id: NodeId) {
    let mut current = self.parent(id);
    while let Some(parent) = current {
      let Some(node) = self.get_mut(parent) else {
        return;
      };
      if node
        .flags
        .contains(NodeFlags::CHILD_SHOULD_CHECK_PAINT_INVALIDATION)
        || node.should_check_for_paint_invalidation()
      {
        // Already on a marked path; everything above was marked when this
        // ancestor was.
        return;
      }
      node.flags |= NodeFlags::CHILD_SHOULD_CHECK_PAINT_INVALIDATION;
      current = node.parent;
    }
  }

  pub(crate) fn clear_paint_invalidation_flags(&mut self, id: NodeId) {
    if let Some(node) = self.get_mut(id) {
      node.flags.remove(
        NodeFlags::MAY_NEED_PAINT_INVALIDATION
          | NodeFlags::MAY_NEED_PAINT_INVALIDATION_SUBTREE
          | NodeFlags::CHILD_SHOULD_CHECK_PAINT_INVALIDATION
          | NodeFlags::SHOULD_INVALIDATE_SELECTION,
      );
      node.full_invalidation_reason = InvalidationReason::None;
    }
  }

  /// Marks visual overflow as stale for `id` and tells ancestors
  pub fn set_needs_overflow_recalc(&mut self, id: NodeId) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    let already = node.flags.contains(NodeFlags::NEEDS_OVERFLOW_RECALC);
    node.flags |= NodeFlags::NEEDS_OVERFLOW_RECALC;
    if already {
      return;
    }
    // Cells and rows propagate through their structural parent; their
    // containing block is the table wrapper, which would skip the section.
    let mut current = self.parent(id);
    while let Some(parent) = current {
      let Some(node) = self.get_mut(parent) else {
        return;
      };
      if node.flags.contains(NodeFlags::CHILD_NEEDS_OVERFLOW_RECALC) {
        return;
      }
      node.flags |= NodeFlags::CHILD_NEEDS_OVERFLOW_RECALC;
      current = node.parent;
    }
  }

  // ===== GEOMETRY & LAYER STATE =====

  /// Sets the used border-box produced by layout
  pub fn set_geometry(&mut self, id: NodeId, rect: Rect) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    let changed = node.location != rect.origin || node.size != rect.size;
    node.location = rect.origin;
    node.size = rect.size;
    if changed {
      self.set_may_need_paint_invalidation(id);
    }
  }

  /// Sets the scroll offset of a scroll container
  ///
  /// Every descendant's backing-relative position changes, so the whole
  /// subtree is queued for a check.
  pub fn set_scroll_offset(&mut self, id: NodeId, offset: Point) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    if node.scroll_offset == offset {
      return;
    }
    node.scroll_offset = offset;
    self.set_may_need_paint_invalidation_subtree(id);
  }

  /// Records whether opaque children fully obscure `id`'s background
  pub fn set_background_obscured(&mut self, id: NodeId, obscured: bool) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    if node.flags.contains(NodeFlags::BACKGROUND_OBSCURED) == obscured {
      return;
    }
    node.flags.set(NodeFlags::BACKGROUND_OBSCURED, obscured);
    self.set_may_need_paint_invalidation(id);
  }

  /// Installs fragmentation geometry on a flow thread node
  pub fn set_fragmentation_info(&mut self, id: NodeId, info: FragmentationInfo) {
    if let Some(node) = self.get_mut(id) {
      debug_assert!(matches!(node.kind, NodeKind::FlowThread));
      node.fragmentation = Some(info);
    }
  }

  /// Marks `id` as a `::before` generated node
  pub fn set_before_content(&mut self, id: NodeId) {
    if let Some(node) = self.get_mut(id) {
      node.flags |= NodeFlags::BEFORE_CONTENT;
    }
  }

  /// Marks an anonymous block as a continuation target
  ///
  /// Continuations are tracked by their owning block; wrapper cleanup must
  /// leave them alone even when they become childless.
  pub fn set_continuation(&mut self, id: NodeId) {
    if let Some(node) = self.get_mut(id) {
      node.flags |= NodeFlags::IS_CONTINUATION;
    }
  }

  /// Reconciles layer and compositing flags with the node's current style
  ///
  /// Emits layer structure commands when the node gains or loses an
  /// independent backing; the invalidator drains them to the sink.
  pub(crate) fn update_layer_state(&mut self, id: NodeId) -> bool {
    let Some(node) = self.get(id) else {
      return false;
    };
    let requires_layer =
      node.style.requires_layer() || node.flags.contains(NodeFlags::COMPOSITED_SCROLLING);
    let composited = requires_layer
      && (node.style.has_direct_compositing_reasons()
        || node.flags.contains(NodeFlags::COMPOSITED_SCROLLING));
    let had_layer = node.has_layer();
    let was_composited = node.is_composited();
    if requires_layer == had_layer && composited == was_composited {
      return false;
    }
    if let Some(node) = self.get_mut(id) {
      node.flags.set(NodeFlags::HAS_LAYER, requires_layer);
      node.flags.set(NodeFlags::COMPOSITED, composited);
    }
    if composited && !was_composited {
      self.pending_layer_commands.push(LayerCommand::Add { node: id });
    } else if !composited && was_composited {
      self
        .pending_layer_commands
        .push(LayerCommand::Remove { node: id });
    }
    true
  }

  /// Marks a scroll container as scrolling in its own composited backing
  pub fn set_composited_scrolling(&mut self, id: NodeId, enabled: bool) {
    let Some(node) = self.get_mut(id) else {
      return;
    };
    if node.flags.contains(NodeFlags::COMPOSITED_SCROLLING) == enabled {
      return;
    }
    node.flags.set(NodeFlags::COMPOSITED_SCROLLING, enabled);
    self.update_layer_state(id);
    // Backing assignment changed for the whole subtree.
    self.set_may_need_paint_invalidation_subtree(id);
  }

  // ===== CONTAINER RESOLUTION =====

  /// The containing node for layout purposes
  ///
  /// Differs from `parent` for out-of-flow boxes: absolute positioning skips
  /// to the nearest positioned (or transformed) ancestor, fixed positioning
  /// to the nearest transform/perspective/filter ancestor or the view.
  ///
  /// When `ancestor` is given, the second return value reports whether the
  /// jump skipped past it (the "ancestor skipped" fast path in mapping).
  pub fn container_of(&self, id: NodeId, ancestor: Option<NodeId>) -> (Option<NodeId>, bool) {
    let Some(node) = self.get(id) else {
      return (None, false);
    };
    if node.kind.is_text() {
      return (node.parent, false);
    }
    match node.style.position {
      crate::style::Position::Absolute => self.container_skipping(id, ancestor, |n| {
        n.style.position.is_positioned() || n.style.has_transform_related_property()
      }),
      crate::style::Position::Fixed => self.container_skipping(id, ancestor, |n| {
        n.style.establishes_fixed_containment()
      }),
      _ => (node.parent, false),
    }
  }

  fn container_skipping(
    &self,
    id: NodeId,
    ancestor: Option<NodeId>,
    qualifies: impl Fn(&RenderNode) -> bool,
  ) -> (Option<NodeId>, bool) {
    let mut skipped = false;
    let mut current = self.parent(id);
    while let Some(candidate) = current {
      let Some(node) = self.get(candidate) else {
        return (None, skipped);
      };
      if matches!(node.kind, NodeKind::View) || qualifies(node) {
        return (Some(candidate), skipped);
      }
      if ancestor == Some(candidate) {
        skipped = true;
      }
      current = node.parent;
    }
    (None, skipped)
  }

  /// The nearest ancestor (or `id` itself) owning an independent backing
  pub fn paint_invalidation_container_of(&self, id: NodeId) -> NodeId {
    let mut current = Some(id);
    while let Some(candidate) = current {
      if let Some(node) = self.get(candidate) {
        if node.is_paint_invalidation_container() {
          return candidate;
        }
        current = node.parent;
      } else {
        break;
      }
    }
    self.root
  }
}
