pub mod article;
pub mod clustering;
pub mod collaborators;
pub mod config;
pub mod corpus;
pub mod entity;
pub mod environment;
pub mod evaluation;
pub mod events;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod result;
pub mod similarity;

pub use article::{Article, Language};
pub use config::PipelineConfig;
pub use pipeline::{ExtractionReport, PassReport, Searcher};
pub use result::{ResultCollection, ResultStatus, SearchResult};
