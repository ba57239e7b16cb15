//! Anonymous wrapper synthesis
//!
//! Tabular nodes have hard structural requirements: cells live in rows, rows
//! in sections, sections (and captions, columns) in tables. Callers insert
//! children wherever the document says they belong; when the target parent
//! cannot legally hold the child, an anonymous wrapper of the required kind
//! is synthesized on the fly. Wrappers cascade in both directions through the
//! recursive insertion path: a cell inserted into a plain block grows a
//! row, a section, and a table around itself in one call.
//!
//! Adjacent misplaced children coalesce: if the sibling immediately before
//! the insertion point is an anonymous wrapper that can accept the child
//! (directly or through further cascade), the child joins it instead of
//! growing a parallel wrapper chain. `::before` generated wrappers are never
//! reused; they belong to their generating node.

use crate::error::Result;
use crate::tree::node::{NodeFlags, NodeId, NodeKind, SectionKind};
use crate::tree::tree::RenderTree;

/// The wrapper kind required between `parent` and `child`, if any
///
/// Returns the innermost missing wrapper; outer levels are synthesized by
/// recursion when the wrapper itself cannot live under `parent`.
pub(crate) fn required_wrapper_kind(parent: NodeKind, child: NodeKind) -> Option<NodeKind> {
  use NodeKind::*;
  match child {
    TableColumn => match parent {
      Table | TableColumnGroup => None,
      _ => Some(Table),
    },
    TableColumnGroup | TableCaption | TableSection(_) => match parent {
      Table => None,
      _ => Some(Table),
    },
    TableRow => match parent {
      TableSection(_) => None,
      _ => Some(TableSection(SectionKind::Body)),
    },
    TableCell => match parent {
      TableRow => None,
      _ => Some(TableRow),
    },
    // Non-tabular content inside a table part needs the inverse chain down
    // to an anonymous cell.
    _ => match parent {
      Table => Some(TableSection(SectionKind::Body)),
      TableSection(_) => Some(TableRow),
      TableRow => Some(TableCell),
      _ => None,
    },
  }
}

/// Whether an existing anonymous wrapper of `candidate` kind can absorb a
/// `child`, directly or through further synthesis inside it
fn can_coalesce(candidate: NodeKind, child: NodeKind) -> bool {
  use NodeKind::*;
  match candidate {
    Table => child.is_table_part(),
    TableSection(_) => matches!(child, TableRow | TableCell),
    TableRow => matches!(child, TableCell),
    _ => false,
  }
}

/// Inserts `child` under `parent` through a wrapper of `wrapper_kind`
///
/// Reuses the anonymous sibling immediately before the insertion point when
/// it can hold the child; otherwise creates a fresh wrapper. Both the
/// wrapper-into-parent and child-into-wrapper steps go back through
/// [`RenderTree::insert_child`], so missing outer and inner levels cascade.
pub(crate) fn insert_with_wrapper(
  tree: &mut RenderTree,
  parent: NodeId,
  child: NodeId,
  before: Option<NodeId>,
  wrapper_kind: NodeKind,
) -> Result<()> {
  let child_kind = match tree.get(child) {
    Some(node) => node.kind,
    None => return Ok(()),
  };

  let candidate = match before {
    Some(before) => tree.prev_sibling(before),
    None => tree.last_child(parent),
  };
  if let Some(candidate) = candidate {
    if let Some(node) = tree.get(candidate) {
      if node.is_anonymous()
        && !node.flags.contains(NodeFlags::BEFORE_CONTENT)
        && can_coalesce(node.kind, child_kind)
      {
        log::trace!("coalescing {} into existing wrapper {}", child, candidate);
        return tree.insert_child(candidate, child, None);
      }
    }
  }

  let parent_style = match tree.get(parent) {
    Some(node) => node.style.clone(),
    None => return Ok(()),
  };
  let wrapper = tree.create_anonymous(wrapper_kind, &parent_style);
  log::trace!(
    "synthesized anonymous {:?} wrapper {} for {}",
    wrapper_kind,
    wrapper,
    child
  );
  tree.insert_child(parent, wrapper, before)?;
  tree.insert_child(wrapper, child, None)
}
