//! Render tree: arena, nodes, structural maintenance, style application

pub mod anonymous;
pub mod node;
pub mod style_update;
#[allow(clippy::module_inception)]
pub mod tree;

pub use node::{FragmentationInfo, NodeFlags, NodeId, NodeKind, RenderNode, SectionKind};
pub use style_update::apply_style;
pub use tree::{RenderTree, TreeObserver};
