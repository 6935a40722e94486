use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Square symmetric matrix of pairwise distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn zeros(size: usize) -> Self {
        DistanceMatrix {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Fills the matrix by evaluating `distance(i, j)` once per unordered pair
    /// `i < j` and mirroring the result.
    pub fn from_fn<F>(size: usize, mut distance: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut matrix = DistanceMatrix::zeros(size);
        for i in 0..size {
            for j in (i + 1)..size {
                matrix.set(i, j, distance(i, j));
            }
        }
        matrix
    }

    /// Builds a matrix from explicit rows, checking shape and symmetry.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        let mut matrix = DistanceMatrix::zeros(size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(anyhow!(
                    "Distance matrix row {} has {} values, expected {}",
                    i,
                    row.len(),
                    size
                ));
            }
            for (j, value) in row.iter().enumerate() {
                if (value - rows[j][i]).abs() > 1e-9 {
                    return Err(anyhow!("Distance matrix is not symmetric at ({}, {})", i, j));
                }
                if i != j {
                    matrix.values[i * size + j] = *value;
                }
            }
        }
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Sets both `(i, j)` and `(j, i)`. The diagonal is left at zero.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i != j {
            self.values[i * self.size + j] = value;
            self.values[j * self.size + i] = value;
        }
    }
}

/// Result of one partitioning run: a cluster id per item, contiguous from 1,
/// and the silhouette of that partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    pub assignments: Vec<u32>,
    pub silhouette: f64,
}

impl PartitionOutcome {
    /// Every item in a single cluster.
    pub fn single_cluster(size: usize) -> Self {
        PartitionOutcome {
            assignments: vec![1; size],
            silhouette: 0.0,
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.assignments.iter().copied().max().unwrap_or(0) as usize
    }
}

/// Renumbers arbitrary labels to 1..=k in order of first appearance.
pub fn relabel_by_first_appearance<T>(labels: &[T]) -> Vec<u32>
where
    T: Eq + std::hash::Hash + Copy,
{
    let mut mapping: HashMap<T, u32> = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len() as u32 + 1;
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}
