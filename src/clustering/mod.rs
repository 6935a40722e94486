// Module declarations
pub mod hierarchical;
pub mod medoids;
pub mod silhouette;
pub mod types;

pub use types::*;

pub use hierarchical::HierarchicalPartitioner;
pub use medoids::MedoidsPartitioner;
pub use silhouette::silhouette;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TARGET_CLUSTER: &str = "clustering";

/// Cluster id given to every survivor when there are too few items to cluster.
pub const UNCLUSTERED_ID: &str = "N/A";

/// Minimum number of articles required before article clustering runs.
pub const MIN_ARTICLES_FOR_CLUSTERING: usize = 3;

/// Minimum number of events required before event clustering runs.
pub const MIN_EVENTS_FOR_CLUSTERING: usize = 2;

/// A strategy turning a distance matrix into a partition.
pub trait Partitioner {
    fn name(&self) -> &'static str;

    /// Partitions the items of `matrix`. Ids in the outcome are contiguous
    /// from 1, one per item.
    fn partition(&self, matrix: &DistanceMatrix) -> PartitionOutcome;
}

/// Configurable choice of partitioning strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringStrategy {
    #[default]
    Hierarchical,
    Medoids,
}

impl ClusteringStrategy {
    pub fn partitioner(self) -> Box<dyn Partitioner> {
        match self {
            ClusteringStrategy::Hierarchical => Box::new(HierarchicalPartitioner),
            ClusteringStrategy::Medoids => Box::new(MedoidsPartitioner),
        }
    }
}

impl fmt::Display for ClusteringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusteringStrategy::Hierarchical => write!(f, "hierarchical"),
            ClusteringStrategy::Medoids => write!(f, "medoids"),
        }
    }
}

impl FromStr for ClusteringStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hierarchical" | "hac" => Ok(ClusteringStrategy::Hierarchical),
            "medoids" | "kmedoids" | "pam" => Ok(ClusteringStrategy::Medoids),
            other => Err(anyhow!("Unknown clustering strategy: {}", other)),
        }
    }
}
