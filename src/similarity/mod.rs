pub mod jaccard;
pub mod stopwords;
pub mod tfidf;

pub use jaccard::{event_distance_matrix, event_similarity};
pub use tfidf::{tokenize, TfIdfModel};

pub const TARGET_SIMILARITY: &str = "similarity";
