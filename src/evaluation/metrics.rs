use std::collections::BTreeSet;

// ============================================================================
// Classification counts
// ============================================================================

/// True positive, false positive and false negative counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl Counts {
    pub fn new(tp: usize, fp: usize, fn_: usize) -> Self {
        Counts { tp, fp, fn_ }
    }

    /// 0 when nothing was predicted.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// 0 when there was nothing to find.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    #[must_use]
    pub fn f_measure(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ============================================================================
// Partition comparison
// ============================================================================

/// Renumbers cluster ids to 1..=k following their sorted order.
///
/// # Returns
/// * The renumbered partition and its number of clusters
pub fn normalize_ids(partition: &[u32]) -> (Vec<u32>, usize) {
    let ids: Vec<u32> = partition
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let renumbered = partition
        .iter()
        .map(|c| ids.binary_search(c).map_or(0, |pos| pos as u32 + 1))
        .collect();
    (renumbered, ids.len())
}

/// Contingency table between two partitions of the same items, with its
/// row and column marginals.
#[derive(Debug, Clone, PartialEq)]
pub struct Contingency {
    pub cells: Vec<Vec<usize>>,
    pub rows: Vec<usize>,
    pub columns: Vec<usize>,
    pub total: usize,
}

impl Contingency {
    pub fn build(first: &[u32], second: &[u32]) -> Self {
        let (first, k1) = normalize_ids(first);
        let (second, k2) = normalize_ids(second);
        let mut cells = vec![vec![0usize; k2]; k1];
        for (a, b) in first.iter().zip(&second) {
            cells[*a as usize - 1][*b as usize - 1] += 1;
        }
        let rows = cells.iter().map(|row| row.iter().sum()).collect();
        let columns = (0..k2).map(|j| cells.iter().map(|row| row[j]).sum()).collect();
        Contingency {
            cells,
            rows,
            columns,
            total: first.len(),
        }
    }
}

fn pairs(n: usize) -> f64 {
    (n as f64) * (n as f64 - 1.0) / 2.0
}

/// Share of item pairs on which both partitions agree (same cluster in
/// both, or different clusters in both). 1 with fewer than two items.
#[must_use]
pub fn rand_index(first: &[u32], second: &[u32]) -> f64 {
    let n = first.len().min(second.len());
    if n < 2 {
        return 1.0;
    }
    let mut agreements = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if (first[i] == first[j]) == (second[i] == second[j]) {
                agreements += 1;
            }
        }
    }
    agreements as f64 / pairs(n)
}

/// Rand index corrected for chance, `(index - expected) / (max - expected)`
/// computed on pair counts of the contingency table. Degenerate cases, where
/// both partitions are trivial in the same way, yield 1.
#[must_use]
pub fn adjusted_rand_index(first: &[u32], second: &[u32]) -> f64 {
    let table = Contingency::build(first, second);
    if table.total < 2 {
        return 1.0;
    }
    let index: f64 = table.cells.iter().flatten().map(|&c| pairs(c)).sum();
    let row_pairs: f64 = table.rows.iter().map(|&c| pairs(c)).sum();
    let column_pairs: f64 = table.columns.iter().map(|&c| pairs(c)).sum();
    let expected = row_pairs * column_pairs / pairs(table.total);
    let max = (row_pairs + column_pairs) / 2.0;

    if (max - expected).abs() < f64::EPSILON {
        1.0
    } else {
        (index - expected) / (max - expected)
    }
}

/// Normalized mutual information, `2 I(X;Y) / (H(X) + H(Y))`. Both
/// partitions being single clusters yields 1.
#[must_use]
pub fn normalized_mutual_information(first: &[u32], second: &[u32]) -> f64 {
    let table = Contingency::build(first, second);
    if table.total == 0 {
        return 1.0;
    }
    let n = table.total as f64;

    let entropy = |marginals: &[usize]| -> f64 {
        marginals
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum()
    };
    let (h1, h2) = (entropy(&table.rows), entropy(&table.columns));

    let mut mutual = 0.0;
    for (i, row) in table.cells.iter().enumerate() {
        for (j, &c) in row.iter().enumerate() {
            if c > 0 {
                let p = c as f64 / n;
                let pi = table.rows[i] as f64 / n;
                let pj = table.columns[j] as f64 / n;
                mutual += p * (p / (pi * pj)).ln();
            }
        }
    }

    if h1 + h2 == 0.0 {
        1.0
    } else {
        2.0 * mutual / (h1 + h2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_counts() {
        let counts = Counts::new(3, 1, 2);
        assert_abs_diff_eq!(counts.precision(), 0.75);
        assert_abs_diff_eq!(counts.recall(), 0.6);
        assert_abs_diff_eq!(counts.f_measure(), 2.0 * 0.75 * 0.6 / 1.35, epsilon = 1e-12);
        assert_eq!(Counts::default().f_measure(), 0.0);
    }

    #[test]
    fn test_normalize_ids() {
        assert_eq!(normalize_ids(&[9, 4, 9, 7]), (vec![3, 1, 3, 2], 3));
    }

    #[test]
    fn test_rand_index_identity_and_bounds() {
        let partitions: [&[u32]; 4] = [&[1, 1, 2, 2, 3], &[1, 2, 3, 4, 5], &[1, 1, 1, 1, 1], &[2, 2, 1, 1, 3]];
        for p in partitions {
            assert_eq!(rand_index(p, p), 1.0);
            for q in partitions {
                let ri = rand_index(p, q);
                assert!((0.0..=1.0).contains(&ri));
            }
        }
        // Relabelling does not matter
        assert_eq!(rand_index(partitions[0], partitions[3]), 1.0);
    }

    #[test]
    fn test_rand_index_value() {
        let first = [1, 1, 2, 2];
        let second = [1, 1, 1, 2];
        // Agreeing pairs: (0,1), (0,3), (1,3)
        assert_abs_diff_eq!(rand_index(&first, &second), 3.0 / 6.0);
    }

    #[test]
    fn test_adjusted_rand_index() {
        let p = [1, 1, 2, 2, 3, 3];
        assert_abs_diff_eq!(adjusted_rand_index(&p, &p), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(adjusted_rand_index(&p, &[5, 5, 1, 1, 7, 7]), 1.0, epsilon = 1e-12);
        assert_eq!(adjusted_rand_index(&[1, 1, 1], &[1, 1, 1]), 1.0);
        // Known value: sklearn.metrics.adjusted_rand_score([0,0,1,1],[0,0,1,2]) = 0.5714...
        assert_abs_diff_eq!(adjusted_rand_index(&[1, 1, 2, 2], &[1, 1, 2, 3]), 4.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nmi() {
        let p = [1, 1, 2, 2];
        assert_abs_diff_eq!(normalized_mutual_information(&p, &p), 1.0, epsilon = 1e-12);
        // Independent partitions share no information
        assert_abs_diff_eq!(normalized_mutual_information(&[1, 1, 2, 2], &[1, 2, 1, 2]), 0.0, epsilon = 1e-12);
        assert_eq!(normalized_mutual_information(&[1, 1], &[3, 3]), 1.0);
    }
}
