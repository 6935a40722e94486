pub mod normalizer;
pub mod period;
pub mod types;

pub use period::{DateWindow, Period};
pub use types::*;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
