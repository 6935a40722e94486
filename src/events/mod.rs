pub mod extraction;
pub mod reference;
pub mod types;

pub use extraction::{EventExtractor, ExtractionMode};
pub use reference::{ReferenceClusters, ReferenceEvent, ReferenceEvents};
pub use types::*;

pub const TARGET_EVENT: &str = "event";
