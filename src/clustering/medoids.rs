use tracing::debug;

use super::silhouette::silhouette;
use super::types::{relabel_by_first_appearance, DistanceMatrix, PartitionOutcome};
use super::{Partitioner, TARGET_CLUSTER};

/// Upper bound on SWAP passes, well beyond what PAM needs to converge on
/// the collection sizes handled here.
const MAX_SWAP_ITERATIONS: usize = 100;

/// Partitioning around medoids. The number of clusters is inferred by
/// running PAM for every k in `2..=max(2, floor(sqrt(n / 2)))` and keeping the
/// partition with the best silhouette.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedoidsPartitioner;

impl MedoidsPartitioner {
    /// Candidate numbers of clusters for `n` items.
    pub fn candidate_ks(n: usize) -> std::ops::RangeInclusive<usize> {
        let upper = ((n as f64 / 2.0).sqrt().floor() as usize).max(2).min(n);
        2..=upper
    }
}

impl Partitioner for MedoidsPartitioner {
    fn name(&self) -> &'static str {
        "medoids"
    }

    fn partition(&self, matrix: &DistanceMatrix) -> PartitionOutcome {
        let n = matrix.len();
        if n < 2 {
            return PartitionOutcome::single_cluster(n);
        }

        let mut best: Option<PartitionOutcome> = None;
        for k in Self::candidate_ks(n) {
            let medoids = pam(matrix, k);
            let assignments = assign(matrix, &medoids);
            let score = silhouette(matrix, &assignments);
            debug!(target: TARGET_CLUSTER, "PAM k={} medoids={:?}: silhouette={:.4}", k, medoids, score);

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

/// Runs the BUILD then SWAP phases of PAM and returns the medoid indices.
pub fn pam(matrix: &DistanceMatrix, k: usize) -> Vec<usize> {
    let n = matrix.len();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }

    // BUILD: start from the most central item, then greedily add the item
    // that lowers the total cost the most
    let mut medoids: Vec<usize> = Vec::with_capacity(k);
    let first = (0..n)
        .min_by(|&a, &b| {
            let ca: f64 = (0..n).map(|j| matrix.get(a, j)).sum();
            let cb: f64 = (0..n).map(|j| matrix.get(b, j)).sum();
            ca.total_cmp(&cb)
        })
        .unwrap_or(0);
    medoids.push(first);

    while medoids.len() < k {
        let candidate = (0..n)
            .filter(|i| !medoids.contains(i))
            .map(|c| {
                let mut with = medoids.clone();
                with.push(c);
                (c, total_cost(matrix, &with))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c);
        match candidate {
            Some(c) => medoids.push(c),
            None => break,
        }
    }

    // SWAP: replace a medoid by a non-medoid while it strictly lowers the cost
    let mut cost = total_cost(matrix, &medoids);
    for _ in 0..MAX_SWAP_ITERATIONS {
        let mut best_swap: Option<(usize, usize, f64)> = None;
        for slot in 0..medoids.len() {
            for candidate in (0..n).filter(|i| !medoids.contains(i)) {
                let mut trial = medoids.clone();
                trial[slot] = candidate;
                let trial_cost = total_cost(matrix, &trial);
                if trial_cost < best_swap.map_or(cost, |(_, _, c)| c) - 1e-12 {
                    best_swap = Some((slot, candidate, trial_cost));
                }
            }
        }
        match best_swap {
            Some((slot, candidate, new_cost)) => {
                medoids[slot] = candidate;
                cost = new_cost;
            }
            None => break,
        }
    }

    medoids
}

/// Sum over all items of the distance to their nearest medoid.
fn total_cost(matrix: &DistanceMatrix, medoids: &[usize]) -> f64 {
    (0..matrix.len())
        .map(|i| {
            medoids
                .iter()
                .map(|&m| matrix.get(i, m))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

/// Assigns every item to its nearest medoid (first medoid on ties), labels
/// numbered from 1 by first appearance.
fn assign(matrix: &DistanceMatrix, medoids: &[usize]) -> Vec<u32> {
    let nearest: Vec<usize> = (0..matrix.len())
        .map(|i| {
            if let Some(slot) = medoids.iter().position(|&m| m == i) {
                return slot;
            }
            let mut best_slot = 0;
            for (slot, &m) in medoids.iter().enumerate() {
                if matrix.get(i, m) < matrix.get(i, medoids[best_slot]) {
                    best_slot = slot;
                }
            }
            best_slot
        })
        .collect();
    relabel_by_first_appearance(&nearest)
}
