//! Computed style values consumed by the render tree
//!
//! This is the slice of computed style the tree maintenance and paint
//! invalidation core actually reads: display/position/visibility for
//! structure, geometry-affecting properties for diff classification, and the
//! visual properties (transform, opacity, filter, outline, colors) that feed
//! invalidation decisions. The cascade and full property application live
//! upstream and hand the tree finished `ComputedStyle` snapshots.

pub mod diff;

use crate::geometry::{Point, Transform3D};

/// CSS display property value
///
/// Only the values that matter to tree structure are represented; the tabular
/// values drive the anonymous wrapper rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Display {
  /// Element generates no boxes
  None,
  /// Block-level box
  Block,
  /// Inline-level box
  Inline,
  /// Inline-level box establishing its own block formatting context
  InlineBlock,
  /// Table wrapper box
  Table,
  /// Inline-level table wrapper box
  InlineTable,
  /// Table header group (`<thead>`)
  TableHeaderGroup,
  /// Table row group (`<tbody>`)
  TableRowGroup,
  /// Table footer group (`<tfoot>`)
  TableFooterGroup,
  /// Table row
  TableRow,
  /// Table cell
  TableCell,
  /// Table column
  TableColumn,
  /// Table column group
  TableColumnGroup,
  /// Table caption
  TableCaption,
}

impl Display {
  /// True for any of the table-internal display types
  pub fn is_table_internal(self) -> bool {
    matches!(
      self,
      Display::TableHeaderGroup
        | Display::TableRowGroup
        | Display::TableFooterGroup
        | Display::TableRow
        | Display::TableCell
        | Display::TableColumn
        | Display::TableColumnGroup
        | Display::TableCaption
    )
  }
}

/// CSS position property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
  /// Normal flow
  #[default]
  Static,
  /// Normal flow, offset visually
  Relative,
  /// Out of flow, positioned against the containing block
  Absolute,
  /// Out of flow, positioned against the viewport (or a transformed ancestor)
  Fixed,
  /// In flow until scrolled past its constraint rect
  Sticky,
}

impl Position {
  /// True for absolute and fixed positioning
  pub fn is_out_of_flow(self) -> bool {
    matches!(self, Position::Absolute | Position::Fixed)
  }

  /// True for any non-static positioning
  pub fn is_positioned(self) -> bool {
    !matches!(self, Position::Static)
  }
}

/// CSS visibility property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
  /// Painted normally
  #[default]
  Visible,
  /// Takes up space but is not painted
  Hidden,
  /// Like hidden; rows/columns additionally release their space
  Collapse,
}

/// Writing mode (block flow direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritingMode {
  /// Horizontal lines, top to bottom
  #[default]
  HorizontalTb,
  /// Vertical lines, right to left: a "flipped blocks" mode that requires
  /// coordinate flips when mapping across its boundary
  VerticalRl,
  /// Vertical lines, left to right
  VerticalLr,
}

impl WritingMode {
  /// True when block coordinates run opposite the physical axis
  pub fn is_flipped_blocks(self) -> bool {
    matches!(self, WritingMode::VerticalRl)
  }
}

/// Inline base direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
  /// Left to right
  #[default]
  Ltr,
  /// Right to left
  Rtl,
}

/// CSS overflow behavior for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
  /// Content may paint outside the box
  #[default]
  Visible,
  /// Content is clipped, no scrolling UI
  Hidden,
  /// Content is clipped and scrollable
  Scroll,
  /// Scrollable when content overflows
  Auto,
}

impl Overflow {
  /// True when this overflow value clips child content
  pub fn clips(self) -> bool {
    !matches!(self, Overflow::Visible)
  }

  /// True when the box can be scrolled by the user
  pub fn is_scrollable(self) -> bool {
    matches!(self, Overflow::Scroll | Overflow::Auto)
  }
}

/// An RGBA color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Rgba {
  pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
  pub const BLACK: Self = Self::new(0, 0, 0, 255);
  pub const WHITE: Self = Self::new(255, 255, 255, 255);

  /// Creates a color from channel values
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// True when the color contributes no paint
  pub fn is_transparent(self) -> bool {
    self.a == 0
  }
}

/// Computed CSS styles for a render node
///
/// Offsets and sizes are pre-resolved to pixels by the style system; `None`
/// means `auto`. The struct is shared behind `Arc` between a node and any
/// anonymous siblings derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
  // ===== STRUCTURE =====
  /// Display type; drives node kind and wrapper rules
  pub display: Display,
  /// Positioning scheme; drives container resolution
  pub position: Position,
  /// Visibility; hidden nodes keep geometry but do not paint
  pub visibility: Visibility,
  /// Block flow direction
  pub writing_mode: WritingMode,
  /// Inline base direction
  pub direction: Direction,

  // ===== GEOMETRY =====
  /// Used width, `None` = auto
  pub width: Option<f32>,
  /// Used height, `None` = auto
  pub height: Option<f32>,
  /// `top` offset for positioned boxes
  pub top: Option<f32>,
  /// `right` offset for positioned boxes
  pub right: Option<f32>,
  /// `bottom` offset for positioned boxes
  pub bottom: Option<f32>,
  /// `left` offset for positioned boxes
  pub left: Option<f32>,
  /// Uniform border width (the full engine tracks four edges; one resolved
  /// width is enough for diff classification)
  pub border_width: f32,
  /// Overflow on the horizontal axis
  pub overflow_x: Overflow,
  /// Overflow on the vertical axis
  pub overflow_y: Overflow,

  // ===== VISUAL =====
  /// Background fill color
  pub background_color: Rgba,
  /// Foreground (text/decoration) color
  pub color: Rgba,
  /// Opacity in [0, 1]
  pub opacity: f32,
  /// `z-index`, `None` = auto
  pub z_index: Option<i32>,
  /// Visual transform, `None` = none
  pub transform: Option<Transform3D>,
  /// Transform origin in border-box pixels
  pub transform_origin: Point,
  /// Perspective distance applied to children, `None` = none
  pub perspective: Option<f32>,
  /// Perspective origin in border-box pixels
  pub perspective_origin: Point,
  /// Whether any filter function applies
  pub has_filter: bool,
  /// Outline width; non-zero outlines force full invalidation
  pub outline_width: f32,
  /// Whether any text decoration line is drawn
  pub has_text_decoration: bool,
  /// Compositing hint (`will-change: transform`)
  pub will_change_transform: bool,
}

impl ComputedStyle {
  /// Style derived for an anonymous wrapper of the given display
  ///
  /// Inherited properties come from the parent; everything else resets.
  /// Anonymous nodes never receive author styles directly.
  pub fn anonymous_with_display(parent: &ComputedStyle, display: Display) -> ComputedStyle {
    ComputedStyle {
      display,
      visibility: parent.visibility,
      writing_mode: parent.writing_mode,
      direction: parent.direction,
      color: parent.color,
      ..ComputedStyle::default()
    }
  }

  /// True when a transform or perspective is present
  pub fn has_transform_related_property(&self) -> bool {
    self.transform.is_some() || self.perspective.is_some()
  }

  /// True when this box establishes a containing block for fixed-position
  /// descendants (transform, perspective, or filter present)
  pub fn establishes_fixed_containment(&self) -> bool {
    self.has_transform_related_property() || self.has_filter
  }

  /// True when the style requires an independent paint layer
  pub fn requires_layer(&self) -> bool {
    self.has_transform_related_property()
      || self.has_filter
      || self.will_change_transform
      || self.opacity < 1.0
      || (self.position.is_positioned() && self.z_index.is_some())
  }

  /// True when the layer, if any, gets its own composited backing
  pub fn has_direct_compositing_reasons(&self) -> bool {
    self.will_change_transform
  }

  /// True when either axis clips overflow
  pub fn clips_overflow(&self) -> bool {
    self.overflow_x.clips() || self.overflow_y.clips()
  }

  /// True when the box paints a visible background
  pub fn has_background(&self) -> bool {
    !self.background_color.is_transparent()
  }

  /// True when the box paints a border
  pub fn has_border(&self) -> bool {
    self.border_width > 0.0
  }

  /// True when an outline is drawn
  pub fn has_outline(&self) -> bool {
    self.outline_width > 0.0
  }
}

impl Default for ComputedStyle {
  fn default() -> Self {
    Self {
      display: Display::Block,
      position: Position::Static,
      visibility: Visibility::Visible,
      writing_mode: WritingMode::HorizontalTb,
      direction: Direction::Ltr,
      width: None,
      height: None,
      top: None,
      right: None,
      bottom: None,
      left: None,
      border_width: 0.0,
      overflow_x: Overflow::Visible,
      overflow_y: Overflow::Visible,
      background_color: Rgba::TRANSPARENT,
      color: Rgba::BLACK,
      opacity: 1.0,
      z_index: None,
      transform: None,
      transform_origin: Point::ZERO,
      perspective: None,
      perspective_origin: Point::ZERO,
      has_filter: false,
      outline_width: 0.0,
      has_text_decoration: false,
      will_change_transform: false,
    }
  }
}
