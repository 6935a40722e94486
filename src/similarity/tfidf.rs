use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::stopwords::is_stop_word;
use super::TARGET_SIMILARITY;
use crate::article::Language;
use crate::clustering::DistanceMatrix;
use crate::entity::normalizer::normalize_text;

/// Splits raw text into case-folded tokens, dropping punctuation, digit
/// sequences and stop-words.
pub fn tokenize(text: &str, language: Option<Language>) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .filter(|token| !is_stop_word(token, language))
        .map(str::to_string)
        .collect()
}

/// TF-IDF representation of a batch of documents.
#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    vectors: Vec<HashMap<String, f64>>,
    norms: Vec<f64>,
}

impl TfIdfModel {
    /// Builds the model for `texts`, using `idf = log10(N / (df + 1))` and
    /// `tfidf = tf * idf`.
    ///
    /// # Arguments
    /// * `texts` - Raw text of each document
    /// * `language` - Language whose stop-words are removed
    pub fn build(texts: &[&str], language: Option<Language>) -> Self {
        let n = texts.len() as f64;

        let term_frequencies: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|text| {
                let mut tf = HashMap::new();
                for token in tokenize(text, language) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in &term_frequencies {
            for token in tf.keys() {
                *document_frequency.entry(token.as_str()).or_insert(0) += 1;
            }
        }
        debug!(target: TARGET_SIMILARITY, "{} documents, {} distinct terms", texts.len(), document_frequency.len());

        let idf: HashMap<&str, f64> = document_frequency
            .iter()
            .map(|(token, df)| (*token, (n / (*df as f64 + 1.0)).log10()))
            .collect();

        let vectors: Vec<HashMap<String, f64>> = term_frequencies
            .iter()
            .map(|tf| {
                tf.iter()
                    .map(|(token, count)| {
                        let weight = *count as f64 * idf.get(token.as_str()).copied().unwrap_or(0.0);
                        (token.clone(), weight)
                    })
                    .collect()
            })
            .collect();

        let norms = vectors
            .iter()
            .map(|v| v.values().map(|w| w * w).sum::<f64>().sqrt())
            .collect();

        TfIdfModel { vectors, norms }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn weight(&self, document: usize, term: &str) -> f64 {
        self.vectors[document].get(term).copied().unwrap_or(0.0)
    }

    /// Cosine distance between documents `i` and `j`.
    ///
    /// With `use_sqrt_dot`, each shared term contributes
    /// `sqrt(w_i * w_j)` to the numerator instead of `w_i * w_j`. This
    /// reproduces historical outputs and is not a true cosine: the numerator
    /// may exceed the norm product, so the distance is floored at 0. A shared
    /// term has the same sign in both vectors, so the distance never exceeds 1.
    pub fn distance(&self, i: usize, j: usize, use_sqrt_dot: bool) -> f64 {
        if i == j {
            return 0.0;
        }
        let (norm_i, norm_j) = (self.norms[i], self.norms[j]);
        if norm_i == 0.0 || norm_j == 0.0 {
            return 1.0;
        }

        let (small, large) = if self.vectors[i].len() <= self.vectors[j].len() {
            (&self.vectors[i], &self.vectors[j])
        } else {
            (&self.vectors[j], &self.vectors[i])
        };
        let dot: f64 = small
            .iter()
            .filter_map(|(token, a)| large.get(token).map(|b| (a, b)))
            .map(|(a, b)| if use_sqrt_dot { (a * b).sqrt() } else { a * b })
            .sum();

        (1.0 - dot / (norm_i * norm_j)).max(0.0)
    }

    pub fn distance_matrix(&self, use_sqrt_dot: bool) -> DistanceMatrix {
        DistanceMatrix::from_fn(self.len(), |i, j| self.distance(i, j, use_sqrt_dot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DOCS: [&str; 5] = [
        "Hollande wins the presidential election against Sarkozy in France",
        "Hollande wins presidential election, Sarkozy defeated in France",
        "In France, Hollande wins the presidential election over Sarkozy",
        "Recipe: bake the bread dough slowly in a hot oven",
        "Football club signs a young striker for next season",
    ];

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("The 2012 Election, in FRANCE!", Some(Language::En)),
            vec!["election", "france"]
        );
    }

    #[test]
    fn test_idf_formula() {
        let model = TfIdfModel::build(&["apple apple pear", "pear kiwi", "plum"], None);
        // apple: tf=2, df=1 -> 2 * log10(3 / 2)
        assert_abs_diff_eq!(model.weight(0, "apple"), 2.0 * (1.5f64).log10(), epsilon = 1e-12);
        // pear: df=2 -> log10(3 / 3) = 0
        assert_abs_diff_eq!(model.weight(0, "pear"), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_near_duplicates_are_close() {
        let model = TfIdfModel::build(&DOCS, Some(Language::En));
        for use_sqrt_dot in [true, false] {
            let m = model.distance_matrix(use_sqrt_dot);
            let duplicate = m.get(0, 1).max(m.get(0, 2)).max(m.get(1, 2));
            let unrelated = m.get(0, 3).min(m.get(3, 4)).min(m.get(2, 4));
            assert!(duplicate < unrelated, "sqrt_dot={}", use_sqrt_dot);
            assert_abs_diff_eq!(m.get(3, 4), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sqrt_dot_differs_from_standard_cosine() {
        let model = TfIdfModel::build(&["red red blue", "red blue blue", "green", "yellow"], None);
        let standard = model.distance(0, 1, false);
        let sqrt = model.distance(0, 1, true);
        // idf = log10(4 / 3) for both shared terms; weights (2w, w) and (w, 2w)
        // standard cosine: (2 + 2) / 5 = 0.8
        assert_abs_diff_eq!(standard, 0.2, epsilon = 1e-9);
        // sqrt dot: 2 * sqrt(2) w / (5 w^2) > 1 here, so distance floors at 0
        assert_eq!(sqrt, 0.0);
    }

    #[test]
    fn test_distances_stay_in_unit_range() {
        let model = TfIdfModel::build(&DOCS, Some(Language::En));
        for use_sqrt_dot in [true, false] {
            for i in 0..DOCS.len() {
                for j in 0..DOCS.len() {
                    let d = model.distance(i, j, use_sqrt_dot);
                    assert!((0.0..=1.0).contains(&d), "d({}, {}) = {}", i, j, d);
                    assert_abs_diff_eq!(d, model.distance(j, i, use_sqrt_dot), epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_empty_document_is_far() {
        let model = TfIdfModel::build(&["the and of", "election france", "election paris"], Some(Language::En));
        assert_eq!(model.distance(0, 1, true), 1.0);
    }
}
