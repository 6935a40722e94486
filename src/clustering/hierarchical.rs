use tracing::debug;

use super::silhouette::silhouette;
use super::types::{relabel_by_first_appearance, DistanceMatrix, PartitionOutcome};
use super::{Partitioner, TARGET_CLUSTER};

/// One agglomeration step: the two merged groups, each identified by its
/// smallest member index, and the complete-link distance between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
}

/// Complete-link dendrogram, stored as the ordered list of merges.
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    size: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Agglomerates the items bottom-up, always merging the two closest
    /// groups, where the distance between groups is the largest distance
    /// between any of their members. Ties go to the lowest indices.
    pub fn build(matrix: &DistanceMatrix) -> Self {
        let size = matrix.len();
        // Group distances, updated in place with the complete-link rule
        let mut distances: Vec<Vec<f64>> = (0..size)
            .map(|i| (0..size).map(|j| matrix.get(i, j)).collect())
            .collect();
        let mut active: Vec<bool> = vec![true; size];
        let mut merges = Vec::with_capacity(size.saturating_sub(1));

        for _ in 1..size {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..size {
                if !active[i] {
                    continue;
                }
                for j in (i + 1)..size {
                    if !active[j] {
                        continue;
                    }
                    let d = distances[i][j];
                    if best.map_or(true, |(_, _, bd)| d < bd) {
                        best = Some((i, j, d));
                    }
                }
            }

            let Some((left, right, distance)) = best else {
                break;
            };
            for k in 0..size {
                if active[k] && k != left && k != right {
                    let d = distances[left][k].max(distances[right][k]);
                    distances[left][k] = d;
                    distances[k][left] = d;
                }
            }
            active[right] = false;
            merges.push(Merge {
                left,
                right,
                distance,
            });
        }

        Dendrogram { size, merges }
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Cuts the tree into `k` groups by replaying the first `size - k` merges.
    /// Labels are contiguous from 1, in order of each group's first member.
    pub fn cut(&self, k: usize) -> Vec<u32> {
        let k = k.clamp(1, self.size.max(1));
        let mut parent: Vec<usize> = (0..self.size).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for merge in self.merges.iter().take(self.size.saturating_sub(k)) {
            let a = find(&mut parent, merge.left);
            let b = find(&mut parent, merge.right);
            if a != b {
                parent[b] = a;
            }
        }

        let roots: Vec<usize> = (0..self.size).map(|i| find(&mut parent, i)).collect();
        relabel_by_first_appearance(&roots)
    }
}

/// Complete-link hierarchical clustering whose cut is chosen by maximizing
/// the silhouette over every k from 2 to N.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalPartitioner;

impl Partitioner for HierarchicalPartitioner {
    fn name(&self) -> &'static str {
        "hierarchical"
    }

    fn partition(&self, matrix: &DistanceMatrix) -> PartitionOutcome {
        let n = matrix.len();
        if n < 2 {
            return PartitionOutcome::single_cluster(n);
        }

        let dendrogram = Dendrogram::build(matrix);
        let mut best: Option<PartitionOutcome> = None;
        for k in 2..=n {
            let assignments = dendrogram.cut(k);
            let score = silhouette(matrix, &assignments);
            debug!(target: TARGET_CLUSTER, "Cut k={}: silhouette={:.4}", k, score);

            // Strict comparison keeps the first (smallest) k on ties
            if best.as_ref().map_or(true, |b| score > b.silhouette) {
                best = Some(PartitionOutcome {
                    assignments,
                    silhouette: score,
                });
            }
        }

        best.unwrap_or_else(|| PartitionOutcome::single_cluster(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_matrix(groups: &[usize]) -> DistanceMatrix {
        DistanceMatrix::from_fn(groups.len(), |i, j| {
            if groups[i] == groups[j] {
                0.05 + 0.01 * ((i + j) % 3) as f64
            } else {
                0.9
            }
        })
    }

    #[test]
    fn test_selects_two_separated_groups() {
        let matrix = groups_matrix(&[0, 0, 0, 1, 1, 1]);
        let outcome = HierarchicalPartitioner.partition(&matrix);
        assert_eq!(outcome.assignments, vec![1, 1, 1, 2, 2, 2]);
        assert_eq!(outcome.cluster_count(), 2);
        assert!(outcome.silhouette > 0.8);
    }

    #[test]
    fn test_interleaved_groups() {
        let matrix = groups_matrix(&[0, 1, 0, 1, 0]);
        let outcome = HierarchicalPartitioner.partition(&matrix);
        assert_eq!(outcome.assignments, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_cut_sizes() {
        let matrix = groups_matrix(&[0, 0, 1, 1]);
        let dendrogram = Dendrogram::build(&matrix);
        assert_eq!(dendrogram.merges().len(), 3);
        assert_eq!(dendrogram.cut(4), vec![1, 2, 3, 4]);
        assert_eq!(dendrogram.cut(1), vec![1, 1, 1, 1]);
        assert_eq!(dendrogram.cut(2), vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_complete_link_uses_farthest_pair() {
        // 0-1 close, 2 close to 1 but far from 0: complete link joins 2 last
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 0.1, 0.8, 0.5],
            vec![0.1, 0.0, 0.2, 0.5],
            vec![0.8, 0.2, 0.0, 0.3],
            vec![0.5, 0.5, 0.3, 0.0],
        ])
        .unwrap();
        let dendrogram = Dendrogram::build(&matrix);
        assert_eq!(dendrogram.merges()[0].distance, 0.1);
        // {0,1} vs 2 is 0.8 under complete link, so 2 joins 3 first
        assert_eq!(dendrogram.merges()[1].left, 2);
        assert_eq!(dendrogram.merges()[1].right, 3);
        assert_eq!(dendrogram.cut(2), vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_tiny_inputs() {
        assert!(HierarchicalPartitioner
            .partition(&DistanceMatrix::zeros(0))
            .assignments
            .is_empty());
        assert_eq!(
            HierarchicalPartitioner
                .partition(&DistanceMatrix::zeros(1))
                .assignments,
            vec![1]
        );
        let two = HierarchicalPartitioner.partition(&DistanceMatrix::from_fn(2, |_, _| 0.4));
        assert_eq!(two.assignments, vec![1, 2]);
    }
}
