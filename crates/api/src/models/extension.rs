use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Timestamp layout used by the marketplace for `lastUpdated` / `publishedDate`.
pub const MARKETPLACE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One extension as served to gallery clients.
///
/// Only the fields the catalog engine reasons about are typed; everything else the
/// sync process wrote is kept in `extra` and written back unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    /// Unique key, `publisher.name`.
    pub identity: String,
    #[serde(default)]
    pub extension_id: String,
    #[serde(default)]
    pub extension_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default)]
    pub publisher: Publisher,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Vec<Statistic>>,
    #[serde(default)]
    pub stats: ExtensionStats,
    /// Newest first, never empty once published.
    pub versions: Vec<VersionRecord>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recommended: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionRecord {
    pub fn latest_version(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    pub fn publisher_name(&self) -> &str {
        &self.publisher.publisher_name
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    #[serde(default)]
    pub publisher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw marketplace statistic entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub statistic_name: String,
    #[serde(default)]
    pub value: f64,
}

/// Normalized statistics used for sorting.
///
/// The three sort keys default to zero; any other statistic the marketplace reported
/// lands in `other` under its original name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ExtensionStats {
    #[serde(default)]
    pub install: f64,
    #[serde(default)]
    pub averagerating: f64,
    #[serde(default, rename = "weightedRating")]
    pub weighted_rating: f64,
    #[serde(flatten)]
    pub other: BTreeMap<String, f64>,
}

impl ExtensionStats {
    /// Defaults overlaid by every named statistic.
    pub fn from_statistics(statistics: &[Statistic]) -> Self {
        let mut stats = Self::default();
        for statistic in statistics {
            stats.set(&statistic.statistic_name, statistic.value);
        }
        stats
    }

    pub fn set(&mut self, name: &str, value: f64) {
        match name {
            "install" => self.install = value,
            "averagerating" => self.averagerating = value,
            "weightedRating" => self.weighted_rating = value,
            other => {
                self.other.insert(other.to_string(), value);
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,
    #[serde(default)]
    pub files: Vec<AssetFile>,
    #[serde(default)]
    pub asset_uri: String,
    #[serde(default)]
    pub fallback_asset_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    pub asset_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "identity": "ms-python.python",
            "extensionId": "f1f59ae4-9318-4f3c-a9b5-81b2eaa5f8a5",
            "extensionName": "python",
            "displayName": "Python",
            "publisher": {"publisherName": "ms-python", "isDomainVerified": true},
            "flags": "validated, public",
            "versions": [{
                "version": "2024.0.1",
                "files": [{"assetType": "Microsoft.VisualStudio.Services.VSIXPackage"}],
                "properties": [{"key": "Microsoft.VisualStudio.Code.Engine", "value": "^1.80.0"}]
            }]
        });

        let record: ExtensionRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.extra.get("flags"), Some(&json!("validated, public")));
        assert_eq!(
            record.publisher.extra.get("isDomainVerified"),
            Some(&json!(true))
        );
        assert!(record.versions[0].extra.contains_key("properties"));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["flags"], json!("validated, public"));
        assert_eq!(back["versions"][0]["properties"][0]["value"], json!("^1.80.0"));
        assert!(back.get("recommended").is_none());
    }

    #[test]
    fn stats_overlay_keeps_defaults_and_extra_names() {
        let stats = ExtensionStats::from_statistics(&[
            Statistic {
                statistic_name: "install".to_string(),
                value: 42.0,
            },
            Statistic {
                statistic_name: "trendingdaily".to_string(),
                value: 0.5,
            },
        ]);
        assert_eq!(stats.install, 42.0);
        assert_eq!(stats.averagerating, 0.0);
        assert_eq!(stats.weighted_rating, 0.0);
        assert_eq!(stats.other.get("trendingdaily"), Some(&0.5));

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["weightedRating"], serde_json::json!(0.0));
        assert_eq!(value["trendingdaily"], serde_json::json!(0.5));
    }
}
