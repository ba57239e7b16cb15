//! A table built with misplaced parts, driven through layout and invalidation

use std::sync::Arc;

use fastpaint::geometry::{Rect, Size};
use fastpaint::style::Rgba;
use fastpaint::{
  apply_style, ComputedStyle, InvalidationReason, NodeId, NodeKind, PaintInvalidator,
  RecordingSink, RenderTree, SectionKind,
};

struct Fixture {
  tree: RenderTree,
  table: NodeId,
  section: NodeId,
  row: NodeId,
  cells: [NodeId; 2],
}

fn cell_style() -> ComputedStyle {
  let mut style = ComputedStyle::default();
  style.background_color = Rgba::new(240, 240, 240, 255);
  style
}

/// Builds a table by inserting rows directly into the table node, letting the
/// tree synthesize the section, then lays it out and settles invalidation.
fn build() -> Fixture {
  let mut tree = RenderTree::new(Size::new(800.0, 600.0));
  let root = tree.root();
  let table = tree.create_node(NodeKind::Table, Arc::new(ComputedStyle::default()));
  tree.insert_child(root, table, None).unwrap();

  let row = tree.create_node(NodeKind::TableRow, Arc::new(ComputedStyle::default()));
  tree.insert_child(table, row, None).unwrap();
  let section = tree.parent(row).unwrap();

  let cells = [
    tree.create_node(NodeKind::TableCell, Arc::new(cell_style())),
    tree.create_node(NodeKind::TableCell, Arc::new(cell_style())),
  ];
  for cell in cells {
    tree.insert_child(row, cell, None).unwrap();
  }

  tree.set_geometry(table, Rect::from_xywh(10.0, 10.0, 200.0, 50.0));
  tree.set_geometry(section, Rect::from_xywh(0.0, 0.0, 200.0, 50.0));
  tree.set_geometry(row, Rect::from_xywh(0.0, 0.0, 200.0, 50.0));
  tree.set_geometry(cells[0], Rect::from_xywh(0.0, 0.0, 100.0, 50.0));
  tree.set_geometry(cells[1], Rect::from_xywh(100.0, 0.0, 100.0, 50.0));

  let mut sink = RecordingSink::new();
  PaintInvalidator::new().invalidate(&mut tree, &mut sink);

  Fixture {
    tree,
    table,
    section,
    row,
    cells,
  }
}

#[test]
fn section_is_synthesized_between_table_and_row() {
  let f = build();
  let section = f.tree.get(f.section).unwrap();
  assert_eq!(section.kind, NodeKind::TableSection(SectionKind::Body));
  assert!(section.is_anonymous());
  assert_eq!(f.tree.parent(f.section), Some(f.table));
  assert_eq!(f.tree.child_ids(f.section), vec![f.row]);
}

#[test]
fn cell_style_change_invalidates_only_that_cell() {
  let mut f = build();
  let mut style = cell_style();
  style.background_color = Rgba::new(255, 0, 0, 255);
  apply_style(&mut f.tree, f.cells[1], Arc::new(style));

  let mut sink = RecordingSink::new();
  PaintInvalidator::new().invalidate(&mut f.tree, &mut sink);

  let root = f.tree.root();
  // Cell 1 lives at table(10,10) + 100 across.
  assert_eq!(
    sink.rects_for(root),
    vec![Rect::from_xywh(110.0, 10.0, 100.0, 50.0)]
  );
  assert_eq!(sink.invalidations[0].reason, InvalidationReason::StyleChange);
}

#[test]
fn cell_resize_is_incremental_within_the_table() {
  let mut f = build();
  f.tree
    .set_geometry(f.cells[0], Rect::from_xywh(0.0, 0.0, 80.0, 50.0));

  let mut sink = RecordingSink::new();
  PaintInvalidator::new().invalidate(&mut f.tree, &mut sink);
  let root = f.tree.root();
  assert_eq!(
    sink.rects_for(root),
    vec![Rect::from_xywh(90.0, 10.0, 20.0, 50.0)]
  );
  assert_eq!(sink.invalidations[0].reason, InvalidationReason::Incremental);
}

#[test]
fn removing_a_cell_repaints_its_old_region_conservatively() {
  let mut f = build();
  f.tree.remove_child(f.row, f.cells[1]).unwrap();

  let mut sink = RecordingSink::new();
  PaintInvalidator::new().invalidate(&mut f.tree, &mut sink);
  // The row repaints fully, covering the removed cell's pixels.
  let bounds = sink.total_bounds();
  assert!(bounds.contains_rect(Rect::from_xywh(110.0, 10.0, 100.0, 50.0)));
  f.tree.destroy(f.cells[1]).unwrap();
}

#[test]
fn destroying_last_row_with_cleanup_removes_the_section() {
  let mut f = build();
  // Remove the cells first so the row is the section's sole concern.
  f.tree.destroy(f.cells[0]).unwrap();
  f.tree.destroy(f.cells[1]).unwrap();
  f.tree.destroy_and_cleanup_anonymous_wrappers(f.row).unwrap();

  assert!(!f.tree.contains(f.row));
  assert!(!f.tree.contains(f.section));
  // The table itself is a real node, not an anonymous wrapper; it stays.
  assert!(f.tree.contains(f.table));
  assert!(f.tree.child_ids(f.table).is_empty());
}

#[test]
fn second_row_coalesces_into_the_same_section() {
  let mut f = build();
  let row2 = f
    .tree
    .create_node(NodeKind::TableRow, Arc::new(ComputedStyle::default()));
  f.tree.insert_child(f.table, row2, None).unwrap();

  assert_eq!(f.tree.parent(row2), Some(f.section));
  assert_eq!(f.tree.child_ids(f.section), vec![f.row, row2]);
}
