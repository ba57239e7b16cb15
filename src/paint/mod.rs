//! Paint invalidation: reasons, the tree walk, and the compositor sink

pub mod invalidator;
pub mod reason;
pub mod sink;

pub use invalidator::PaintInvalidator;
pub use reason::InvalidationReason;
pub use sink::{CompositorSink, InvalidationCommand, LayerCommand, RecordingSink};
