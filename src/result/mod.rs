pub mod collection;
pub mod consensus;
pub mod filter;
pub mod types;

pub use collection::{clean_url, EventClustering, ResultCollection};
pub use filter::FilterSettings;
pub use types::*;

pub const TARGET_FILTER: &str = "filter";
