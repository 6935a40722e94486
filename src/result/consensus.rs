use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use super::collection::ResultCollection;
use super::TARGET_FILTER;
use crate::entity::EntityType;

impl ResultCollection {
    /// Removes mentions not corroborated within their article cluster.
    ///
    /// For every cluster of surviving results and every mention type, the
    /// frequency of a value is the share of the cluster's members that
    /// mention it. Mentions whose value has a frequency strictly below
    /// `threshold` are removed from their result.
    ///
    /// # Returns
    /// * Number of removed mentions
    pub fn filter_by_cluster(&mut self, threshold: f64) -> usize {
        let mut clusters: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for result in self.iter().filter(|r| r.is_alive()) {
            if let Some(cluster) = &result.cluster {
                clusters
                    .entry(cluster.clone())
                    .or_default()
                    .push(result.key.clone());
            }
        }

        let mut removed = 0;
        for (cluster, members) in &clusters {
            let size = members.len() as f64;
            for entity_type in EntityType::ALL {
                // Number of members mentioning each value
                let mut support: HashMap<String, usize> = HashMap::new();
                for key in members {
                    if let Some(result) = self.get(key) {
                        for value in result.mentions.values(entity_type) {
                            *support.entry(value).or_insert(0) += 1;
                        }
                    }
                }

                let rare: BTreeSet<String> = support
                    .into_iter()
                    .filter(|(_, count)| (*count as f64 / size) < threshold)
                    .map(|(value, _)| value)
                    .collect();
                if rare.is_empty() {
                    continue;
                }
                debug!(
                    target: TARGET_FILTER,
                    "Cluster {}: removing {} {} values {:?}",
                    cluster,
                    rare.len(),
                    entity_type,
                    rare
                );

                for key in members {
                    if let Some(result) = self.get_mut(key) {
                        removed += result
                            .mentions
                            .retain(entity_type, |m| !rare.contains(&m.value_key()));
                    }
                }
            }
        }

        info!(
            target: TARGET_FILTER,
            "Cluster consensus (threshold {}): removed {} mentions over {} clusters",
            threshold,
            removed,
            clusters.len()
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Mention, MentionSet};
    use crate::result::SearchResult;

    fn member(key: &str, cluster: &str, persons: &[&str]) -> SearchResult {
        let mut mentions = MentionSet::new();
        for (i, p) in persons.iter().enumerate() {
            mentions.add(Mention::named(EntityType::Person, i * 10, i * 10 + 5, p, p));
        }
        let mut result = SearchResult::web(key).with_mentions(mentions);
        result.cluster = Some(cluster.to_string());
        result
    }

    #[test]
    fn test_removes_uncorroborated_mention() {
        let mut collection = ResultCollection::new();
        collection.insert(member("a", "1", &["hollande", "merkel"]));
        collection.insert(member("b", "1", &["hollande"]));
        collection.insert(member("c", "1", &["hollande"]));
        collection.insert(member("d", "1", &["hollande"]));

        let removed = collection.filter_by_cluster(0.5);
        assert_eq!(removed, 1);
        let a = collection.get("a").unwrap();
        assert_eq!(a.mentions.values(EntityType::Person).len(), 1);
        assert!(a.mentions.values(EntityType::Person).contains("hollande"));
    }

    #[test]
    fn test_surface_variants_corroborate_each_other() {
        let mut collection = ResultCollection::new();
        collection.insert(member("a", "1", &["François Hollande"]));
        collection.insert(member("b", "1", &["francois hollande"]));
        collection.insert(member("c", "1", &["FRANCOIS HOLLANDE"]));
        collection.insert(member("d", "1", &["merkel"]));

        assert_eq!(collection.filter_by_cluster(0.5), 1);
        assert_eq!(collection.get("a").unwrap().mentions.len(), 1);
        assert!(collection.get("d").unwrap().mentions.is_empty());
    }

    #[test]
    fn test_repeated_mentions_count_once_per_member() {
        let mut collection = ResultCollection::new();
        collection.insert(member("a", "1", &["merkel", "merkel", "merkel"]));
        collection.insert(member("b", "1", &["hollande"]));
        collection.insert(member("c", "1", &["hollande"]));
        collection.filter_by_cluster(0.5);
        assert!(collection.get("a").unwrap().mentions.is_empty());
    }

    #[test]
    fn test_clusters_are_independent() {
        let mut collection = ResultCollection::new();
        collection.insert(member("a", "1", &["merkel"]));
        collection.insert(member("b", "2", &["hollande"]));
        collection.insert(member("c", "2", &["hollande"]));
        assert_eq!(collection.filter_by_cluster(1.0), 0);
    }

    #[test]
    fn test_rejected_members_are_ignored() {
        let mut collection = ResultCollection::new();
        collection.insert(member("a", "1", &["merkel"]));
        let mut rejected = member("b", "1", &["hollande"]);
        rejected.reject(crate::result::ResultStatus::MissingDate);
        collection.insert(rejected);
        assert_eq!(collection.filter_by_cluster(1.0), 0);
        assert_eq!(collection.get("b").unwrap().mentions.len(), 1);
    }
}
