//! Compositor sink
//!
//! The invalidation engine is a producer of commands; actual pixel
//! compositing and window invalidation are a pure sink behind this trait.
//! Commands come in two families: raster invalidations (a rect in a backing
//! container's space, tagged with the reason) and layer structure updates
//! (a node gained, lost, or moved between independent backings).

use crate::geometry::Rect;
use crate::paint::reason::InvalidationReason;
use crate::tree::node::NodeId;

/// One raster invalidation: repaint `rect` inside `backing`'s surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidationCommand {
  /// The paint-invalidation container owning the surface
  pub backing: NodeId,
  /// Region to repaint, in the backing's coordinate space
  pub rect: Rect,
  /// Why the region is dirty
  pub reason: InvalidationReason,
}

/// A layer structure update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerCommand {
  /// `node` now paints into its own backing
  Add { node: NodeId },
  /// `node` no longer paints into its own backing
  Remove { node: NodeId },
  /// `node` moved from one backing to another
  Move {
    node: NodeId,
    from: NodeId,
    to: NodeId,
  },
}

/// Consumer of invalidation and layer commands
pub trait CompositorSink {
  /// Receives one raster invalidation
  fn invalidate(&mut self, command: InvalidationCommand);

  /// Receives one layer structure update
  fn update_layer(&mut self, command: LayerCommand);
}

/// A sink that records every command, for tests and debugging
#[derive(Debug, Default)]
pub struct RecordingSink {
  /// Raster invalidations in emission order
  pub invalidations: Vec<InvalidationCommand>,
  /// Layer updates in emission order
  pub layers: Vec<LayerCommand>,
}

impl RecordingSink {
  /// Creates an empty recording sink
  pub fn new() -> Self {
    Self::default()
  }

  /// Discards everything recorded so far
  pub fn clear(&mut self) {
    self.invalidations.clear();
    self.layers.clear();
  }

  /// All invalidation rects emitted against `backing`
  pub fn rects_for(&self, backing: NodeId) -> Vec<Rect> {
    self
      .invalidations
      .iter()
      .filter(|c| c.backing == backing)
      .map(|c| c.rect)
      .collect()
  }

  /// Union of every invalidated rect, across backings
  pub fn total_bounds(&self) -> Rect {
    self
      .invalidations
      .iter()
      .fold(Rect::ZERO, |acc, c| acc.union(c.rect))
  }
}

impl CompositorSink for RecordingSink {
  fn invalidate(&mut self, command: InvalidationCommand) {
    log::trace!(
      "invalidate backing={} rect={} reason={}",
      command.backing,
      command.rect,
      command.reason
    );
    self.invalidations.push(command);
  }

  fn update_layer(&mut self, command: LayerCommand) {
    self.layers.push(command);
  }
}
