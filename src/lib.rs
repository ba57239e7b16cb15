//! Render-tree maintenance and paint invalidation for a page layout engine
//!
//! The crate keeps a tree of render nodes (one per laid-out box, plus
//! synthesized anonymous wrappers), applies computed-style transitions to it,
//! and turns the resulting dirty state into minimal repaint commands for a
//! compositor.
//!
//! The typical frame looks like:
//!
//! 1. Structural mutations and [`apply_style`] calls while the lifecycle
//!    phase permits them.
//! 2. Layout stores geometry back through [`RenderTree::set_geometry`].
//! 3. [`PaintInvalidator::invalidate`] walks the tree once and emits
//!    [`InvalidationCommand`]s against each node's paint-invalidation
//!    container.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use fastpaint::{
//!   apply_style, ComputedStyle, NodeKind, PaintInvalidator, RecordingSink, RenderTree,
//! };
//! use fastpaint::geometry::{Rect, Size};
//!
//! let mut tree = RenderTree::new(Size::new(800.0, 600.0));
//! let block = tree.create_node(NodeKind::Block, Arc::new(ComputedStyle::default()));
//! tree.insert_child(tree.root(), block, None).unwrap();
//! tree.set_geometry(block, Rect::from_xywh(0.0, 0.0, 100.0, 50.0));
//!
//! let mut sink = RecordingSink::new();
//! PaintInvalidator::new().invalidate(&mut tree, &mut sink);
//! assert!(!sink.invalidations.is_empty());
//! ```

pub mod accessibility;
pub mod error;
pub mod geometry;
pub mod hit_test;
pub mod lifecycle;
pub mod map;
pub mod paint;
pub mod scroll;
pub mod style;
pub mod tree;

pub use accessibility::AxCache;
pub use error::{Error, Result, TreeError};
pub use geometry::{Point, Quad, Rect, Size, Transform3D};
pub use hit_test::{hit_test, hit_test_from, HitTestResult};
pub use lifecycle::Phase;
pub use map::MapFlags;
pub use paint::invalidator::PaintInvalidator;
pub use paint::reason::InvalidationReason;
pub use paint::sink::{CompositorSink, InvalidationCommand, LayerCommand, RecordingSink};
pub use scroll::ScrollAnchorRegistry;
pub use style::diff::StyleDiff;
pub use style::ComputedStyle;
pub use tree::node::{NodeId, NodeKind, SectionKind};
pub use tree::{apply_style, RenderTree, TreeObserver};
