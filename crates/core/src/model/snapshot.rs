use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use vscmirror_api::models::{CatalogSummary, CategoryCount, ExtensionRecord};

const TOP_CATEGORIES: usize = 10;

/// Immutable catalog contents at one point in time, keyed by identity.
///
/// Serialized as a plain `identity -> record` object, which is also the cache format.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    extensions: BTreeMap<String, Arc<ExtensionRecord>>,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(extensions: BTreeMap<String, Arc<ExtensionRecord>>) -> Self {
        Self { extensions }
    }

    /// Later records replace earlier ones with the same identity.
    pub fn from_records(records: impl IntoIterator<Item = ExtensionRecord>) -> Self {
        let extensions = records
            .into_iter()
            .map(|record| (record.identity.clone(), Arc::new(record)))
            .collect();
        Self { extensions }
    }

    pub fn get(&self, identity: &str) -> Option<&Arc<ExtensionRecord>> {
        self.extensions.get(identity)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<ExtensionRecord>)> {
        self.extensions.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<ExtensionRecord>> {
        self.extensions.values()
    }

    pub fn recommended(&self) -> Vec<Arc<ExtensionRecord>> {
        self.records()
            .filter(|record| record.recommended)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> CatalogSummary {
        let mut publishers = HashSet::new();
        let mut categories: HashMap<&str, usize> = HashMap::new();
        let mut total_versions = 0;
        let mut recommended_count = 0;

        for record in self.records() {
            total_versions += record.versions.len();
            if record.recommended {
                recommended_count += 1;
            }
            if !record.publisher_name().is_empty() {
                publishers.insert(record.publisher_name());
            }
            for category in &record.categories {
                *categories.entry(category.as_str()).or_default() += 1;
            }
        }

        let mut top_categories: Vec<CategoryCount> = categories
            .into_iter()
            .map(|(name, count)| CategoryCount {
                name: name.to_string(),
                count,
            })
            .collect();
        top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_categories.truncate(TOP_CATEGORIES);

        CatalogSummary {
            loaded_count: self.len(),
            total_versions,
            unique_publishers: publishers.len(),
            recommended_count,
            top_categories,
        }
    }
}
