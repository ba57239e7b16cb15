//! Render tree node record
//!
//! One concrete node record serves every box kind: a closed `NodeKind` tag
//! plus shared linkage, style, and dirty-state fields. Kind-specific behavior
//! (wrapper rules, container resolution, paint semantics) dispatches on the
//! tag instead of a subtype hierarchy.
//!
//! Nodes live in the tree's arena and are addressed by [`NodeId`] handles.
//! `parent` and `prev_sibling` are back-references (never owning);
//! `first_child` and `next_sibling` express ownership, so freeing a subtree
//! is "walk the owning edges and release slots".

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::geometry::{Point, Rect, Size};
use crate::paint::reason::InvalidationReason;
use crate::style::{ComputedStyle, Display};

/// A stable handle to a node in the render tree arena
///
/// Handles carry a generation so a handle to a destroyed node can never
/// silently alias a reused slot; identity reuse after destruction corrupts
/// identity-keyed caches otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
  pub(crate) index: u32,
  pub(crate) generation: u32,
}

impl NodeId {
  /// A handle that never resolves
  pub const INVALID: NodeId = NodeId {
    index: u32::MAX,
    generation: 0,
  };
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}v{}", self.index, self.generation)
  }
}

/// Which table section a section node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
  /// `<thead>` / `display: table-header-group`
  Header,
  /// `<tbody>` / `display: table-row-group`
  Body,
  /// `<tfoot>` / `display: table-footer-group`
  Footer,
}

/// The kind of box a render node represents
///
/// Kind determines structural legality (tabular rules), container resolution,
/// and paint semantics, but every kind shares the same linkage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
  /// The root of the tree; owns the viewport
  View,
  /// Block-level container
  Block,
  /// Inline-level container
  Inline,
  /// Text run (leaf; shares its parent's style)
  Text,
  /// Table wrapper box
  Table,
  /// Table row group
  TableSection(SectionKind),
  /// Table row
  TableRow,
  /// Table cell
  TableCell,
  /// Table column (leaf, layout metadata only)
  TableColumn,
  /// Table column group
  TableColumnGroup,
  /// Table caption
  TableCaption,
  /// Replaced content (image, canvas, ...)
  Replaced,
  /// Fragmentation context: children are laid out in flow-thread coordinates
  FlowThread,
}

impl NodeKind {
  /// Maps a display value to the node kind it generates
  pub fn from_display(display: Display) -> NodeKind {
    match display {
      Display::None | Display::Block => NodeKind::Block,
      Display::Inline => NodeKind::Inline,
      Display::InlineBlock => NodeKind::Block,
      Display::Table | Display::InlineTable => NodeKind::Table,
      Display::TableHeaderGroup => NodeKind::TableSection(SectionKind::Header),
      Display::TableRowGroup => NodeKind::TableSection(SectionKind::Body),
      Display::TableFooterGroup => NodeKind::TableSection(SectionKind::Footer),
      Display::TableRow => NodeKind::TableRow,
      Display::TableCell => NodeKind::TableCell,
      Display::TableColumn => NodeKind::TableColumn,
      Display::TableColumnGroup => NodeKind::TableColumnGroup,
      Display::TableCaption => NodeKind::TableCaption,
    }
  }

  /// The display value an anonymous node of this kind carries
  pub fn anonymous_display(self) -> Display {
    match self {
      NodeKind::Table => Display::Table,
      NodeKind::TableSection(SectionKind::Header) => Display::TableHeaderGroup,
      NodeKind::TableSection(_) => Display::TableRowGroup,
      NodeKind::TableRow => Display::TableRow,
      NodeKind::TableCell => Display::TableCell,
      NodeKind::TableColumnGroup => Display::TableColumnGroup,
      NodeKind::Inline => Display::Inline,
      _ => Display::Block,
    }
  }

  /// True for the table wrapper box
  pub fn is_table(self) -> bool {
    matches!(self, NodeKind::Table)
  }

  /// True for any row group
  pub fn is_table_section(self) -> bool {
    matches!(self, NodeKind::TableSection(_))
  }

  /// True for table rows
  pub fn is_table_row(self) -> bool {
    matches!(self, NodeKind::TableRow)
  }

  /// True for table cells
  pub fn is_table_cell(self) -> bool {
    matches!(self, NodeKind::TableCell)
  }

  /// True for columns and column groups
  pub fn is_table_column_or_group(self) -> bool {
    matches!(self, NodeKind::TableColumn | NodeKind::TableColumnGroup)
  }

  /// True for any table-internal kind
  pub fn is_table_part(self) -> bool {
    self.is_table_section()
      || self.is_table_row()
      || self.is_table_cell()
      || self.is_table_column_or_group()
      || matches!(self, NodeKind::TableCaption)
  }

  /// True for leaf kinds that never have render children
  pub fn is_leaf(self) -> bool {
    matches!(self, NodeKind::Text | NodeKind::Replaced | NodeKind::TableColumn)
  }

  /// True for text runs
  pub fn is_text(self) -> bool {
    matches!(self, NodeKind::Text)
  }
}

bitflags! {
  /// Dirty-state and identity bits carried by every node
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct NodeFlags: u32 {
    /// Layout must rerun for this node
    const SELF_NEEDS_LAYOUT = 1 << 0;
    /// Only the position of this out-of-flow node must be recomputed
    const NEEDS_POSITIONED_MOVEMENT_LAYOUT = 1 << 1;
    /// The invalidation walk must check this node
    const MAY_NEED_PAINT_INVALIDATION = 1 << 2;
    /// The invalidation walk must check this node and all descendants
    const MAY_NEED_PAINT_INVALIDATION_SUBTREE = 1 << 3;
    /// Some descendant requested an invalidation check
    const CHILD_SHOULD_CHECK_PAINT_INVALIDATION = 1 << 4;
    /// The selection painted over this node changed
    const SHOULD_INVALIDATE_SELECTION = 1 << 5;
    /// Synthesized node with no document counterpart
    const IS_ANONYMOUS = 1 << 6;
    /// Node owns a paint layer
    const HAS_LAYER = 1 << 7;
    /// Node's layer has its own composited backing
    const COMPOSITED = 1 << 8;
    /// Node's backing scrolls independently of its contents
    const COMPOSITED_SCROLLING = 1 << 9;
    /// Node is inside a fragmentation context's flow thread
    const INSIDE_FLOW_THREAD = 1 << 10;
    /// Anonymous block serving as a continuation target; cleanup must not
    /// destroy it even when it becomes childless
    const IS_CONTINUATION = 1 << 11;
    /// `::before` generated content; never reused as a wrapper target
    const BEFORE_CONTENT = 1 << 12;
    /// Visual overflow must be recomputed
    const NEEDS_OVERFLOW_RECALC = 1 << 13;
    /// A descendant needs overflow recomputation
    const CHILD_NEEDS_OVERFLOW_RECALC = 1 << 14;
    /// Background is fully obscured by opaque children
    const BACKGROUND_OBSCURED = 1 << 15;
    /// The cached paint record for this node must be re-recorded
    const NEEDS_REPAINT = 1 << 16;
  }
}

/// A node in the render tree
///
/// Geometry (`location`, `size`) is the used border-box produced by layout,
/// expressed relative to the node's container. The `previous_*` fields
/// persist between lifecycle updates so the invalidation engine can diff the
/// old and new visual state.
#[derive(Debug, Clone)]
pub struct RenderNode {
  /// This node's own handle
  pub id: NodeId,
  /// Box kind tag
  pub kind: NodeKind,
  /// Owned computed style (shared with derived anonymous siblings)
  pub style: Arc<ComputedStyle>,

  // Linkage. parent/prev_sibling are back references; first_child/next_sibling
  // are the owning edges.
  pub(crate) parent: Option<NodeId>,
  pub(crate) first_child: Option<NodeId>,
  pub(crate) last_child: Option<NodeId>,
  pub(crate) prev_sibling: Option<NodeId>,
  pub(crate) next_sibling: Option<NodeId>,

  /// Dirty-state bits
  pub flags: NodeFlags,
  /// Strongest pending full-invalidation reason, `None` when clean
  pub(crate) full_invalidation_reason: InvalidationReason,

  /// Border-box origin relative to the container, set by layout
  pub location: Point,
  /// Border-box size, set by layout
  pub size: Size,
  /// Scroll offset applied to children when this box is a scroll container
  pub scroll_offset: Point,

  /// Visual rect from the previous lifecycle update, in backing space
  pub(crate) previous_visual_rect: Rect,
  /// Backing-relative location from the previous lifecycle update
  pub(crate) previous_location: Point,
  /// Backing container resolved during the previous invalidation walk
  pub(crate) previous_backing: Option<NodeId>,
  /// BACKGROUND_OBSCURED as observed by the previous invalidation walk
  pub(crate) previous_background_obscured: bool,
  /// Reason recorded the last time this node's paint record was invalidated
  pub last_invalidation_reason: InvalidationReason,

  /// Column geometry when `kind` is `FlowThread`
  pub fragmentation: Option<FragmentationInfo>,
}

/// Column geometry for a fragmentation context
///
/// Content inside the flow thread is authored in one unbroken coordinate
/// space; mapping out of the thread translates flow coordinates into the
/// visual position of the column they fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentationInfo {
  /// Width of each column
  pub column_width: f32,
  /// Height of each column (the fragmentation stride)
  pub column_height: f32,
  /// Gap between adjacent columns
  pub column_gap: f32,
}

impl FragmentationInfo {
  /// Translates a point from flow-thread coordinates to visual coordinates
  pub fn flow_to_visual(&self, p: Point) -> Point {
    if self.column_height <= 0.0 {
      return p;
    }
    let column = (p.y / self.column_height).floor().max(0.0);
    Point::new(
      p.x + column * (self.column_width + self.column_gap),
      p.y - column * self.column_height,
    )
  }
}

impl RenderNode {
  pub(crate) fn new(id: NodeId, kind: NodeKind, style: Arc<ComputedStyle>) -> Self {
    Self {
      id,
      kind,
      style,
      parent: None,
      first_child: None,
      last_child: None,
      prev_sibling: None,
      next_sibling: None,
      flags: NodeFlags::empty(),
      full_invalidation_reason: InvalidationReason::None,
      location: Point::ZERO,
      size: Size::ZERO,
      scroll_offset: Point::ZERO,
      previous_visual_rect: Rect::ZERO,
      previous_location: Point::ZERO,
      previous_backing: None,
      previous_background_obscured: false,
      last_invalidation_reason: InvalidationReason::None,
      fragmentation: None,
    }
  }

  /// Parent handle, if linked
  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  /// First child handle
  pub fn first_child(&self) -> Option<NodeId> {
    self.first_child
  }

  /// Last child handle
  pub fn last_child(&self) -> Option<NodeId> {
    self.last_child
  }

  /// Next sibling handle
  pub fn next_sibling(&self) -> Option<NodeId> {
    self.next_sibling
  }

  /// Previous sibling handle
  pub fn prev_sibling(&self) -> Option<NodeId> {
    self.prev_sibling
  }

  /// True for synthesized nodes with no document counterpart
  pub fn is_anonymous(&self) -> bool {
    self.flags.contains(NodeFlags::IS_ANONYMOUS)
  }

  /// True when the node owns a paint layer
  pub fn has_layer(&self) -> bool {
    self.flags.contains(NodeFlags::HAS_LAYER)
  }

  /// True when the node's layer has its own composited backing
  pub fn is_composited(&self) -> bool {
    self.flags.contains(NodeFlags::COMPOSITED)
  }

  /// True when this node acts as a paint-invalidation container
  ///
  /// The view is always one; other nodes qualify when composited.
  pub fn is_paint_invalidation_container(&self) -> bool {
    matches!(self.kind, NodeKind::View) || self.is_composited()
  }

  /// Strongest pending full-invalidation reason
  pub fn full_invalidation_reason(&self) -> InvalidationReason {
    self.full_invalidation_reason
  }

  /// Visual rect recorded by the previous invalidation walk, in backing space
  pub fn previous_visual_rect(&self) -> Rect {
    self.previous_visual_rect
  }

  /// Backing container recorded by the previous invalidation walk
  pub fn previous_backing(&self) -> Option<NodeId> {
    self.previous_backing
  }

  /// True when the invalidation walk must look at this node itself
  pub fn should_check_for_paint_invalidation(&self) -> bool {
    self.flags.intersects(
      NodeFlags::MAY_NEED_PAINT_INVALIDATION
        | NodeFlags::MAY_NEED_PAINT_INVALIDATION_SUBTREE
        | NodeFlags::SHOULD_INVALIDATE_SELECTION,
    ) || self.full_invalidation_reason != InvalidationReason::None
  }

  /// Border-box rect in the node's own coordinate space
  pub fn border_box(&self) -> Rect {
    Rect::new(Point::ZERO, self.size)
  }

  /// Local visual rect: border box inflated by the outline, which paints
  /// outside it
  pub fn local_visual_rect(&self) -> Rect {
    if self.style.visibility != crate::style::Visibility::Visible {
      return Rect::ZERO;
    }
    let outline = self.style.outline_width;
    if outline > 0.0 {
      self.border_box().inflate(outline)
    } else {
      self.border_box()
    }
  }

  /// True when this box paints anything of its own (background, border,
  /// outline, text, replaced content) as opposed to only positioning children
  pub fn paints_own_content(&self) -> bool {
    self.kind.is_text()
      || matches!(self.kind, NodeKind::Replaced)
      || self.style.has_background()
      || self.style.has_border()
      || self.style.has_outline()
  }
}
