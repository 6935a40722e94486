use std::collections::BTreeMap;

use super::types::DistanceMatrix;

/// Mean silhouette of a partition.
///
/// For each item, `a` is its mean distance to the other members of its
/// cluster and `b` the smallest mean distance to the members of another
/// cluster; the item scores `(b - a) / max(a, b)`. Items alone in their
/// cluster score 0, as does every item when there is only one cluster.
///
/// # Arguments
/// * `matrix` - Pairwise distances between the items
/// * `assignments` - Cluster label of each item
///
/// # Returns
/// * The average score, in [-1, 1]
pub fn silhouette(matrix: &DistanceMatrix, assignments: &[u32]) -> f64 {
    let n = assignments.len();
    if n == 0 {
        return 0.0;
    }

    let mut members: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, cluster) in assignments.iter().enumerate() {
        members.entry(*cluster).or_default().push(index);
    }
    if members.len() < 2 {
        return 0.0;
    }

    let mean_distance = |i: usize, group: &[usize]| -> f64 {
        let others: Vec<usize> = group.iter().copied().filter(|&j| j != i).collect();
        if others.is_empty() {
            return 0.0;
        }
        others.iter().map(|&j| matrix.get(i, j)).sum::<f64>() / others.len() as f64
    };

    let total: f64 = (0..n)
        .map(|i| {
            let own = &members[&assignments[i]];
            if own.len() < 2 {
                return 0.0;
            }
            let a = mean_distance(i, own);
            let b = members
                .iter()
                .filter(|(cluster, _)| **cluster != assignments[i])
                .map(|(_, group)| mean_distance(i, group))
                .fold(f64::INFINITY, f64::min);

            if a == b {
                0.0
            } else {
                (b - a) / a.max(b)
            }
        })
        .sum();

    total / n as f64
}
