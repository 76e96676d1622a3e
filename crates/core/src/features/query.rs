//! Marketplace `extensionquery` evaluation against a catalog snapshot.

use crate::error::{CatalogError, Result};
use crate::model::CatalogSnapshot;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vscmirror_api::models::{
    Criterion, ExtensionRecord, FilterType, MARKETPLACE_TIMESTAMP_FORMAT, QueryRequest,
    QueryResponse, SortBy, SortOrder,
};

/// Criteria count at or below which an empty result falls back to the recommended set.
const FALLBACK_MAX_CRITERIA: usize = 2;

pub struct QueryEngine;

impl QueryEngine {
    /// Validates, filters and sorts; the whole result set goes into one page.
    pub fn execute(snapshot: &CatalogSnapshot, request: &QueryRequest) -> Result<QueryResponse> {
        let filter = request
            .filters
            .first()
            .ok_or_else(|| CatalogError::InvalidQuery("request has no filters".to_string()))?;
        let criteria = filter
            .criteria
            .as_deref()
            .ok_or_else(|| CatalogError::InvalidQuery("filter has no criteria".to_string()))?;
        if request.flags.is_none() {
            return Err(CatalogError::InvalidQuery("request has no flags".to_string()));
        }

        let (sort_by, sort_order) = match filter.sort_by.map(SortBy::from_code) {
            None | Some(SortBy::NoneOrRelevance) => (SortBy::InstallCount, SortOrder::Descending),
            Some(sort_by) => (
                sort_by,
                filter.sort_order.map(SortOrder::from_code).unwrap_or_default(),
            ),
        };

        let mut results = Self::apply_criteria(snapshot, criteria);
        Self::sort(&mut results, sort_by, sort_order);
        Ok(QueryResponse::from_extensions(results))
    }

    /// Matches are appended per criterion in request order, so repeated text
    /// criteria can list a record more than once. When several supported kinds are
    /// present, only records matched by every kind are kept.
    pub fn apply_criteria(
        snapshot: &CatalogSnapshot,
        criteria: &[Criterion],
    ) -> Vec<Arc<ExtensionRecord>> {
        let mut result = Vec::new();
        let mut matched_by_kind: Vec<(FilterType, HashSet<String>)> = Vec::new();

        for criterion in criteria {
            let (Some(code), Some(value)) = (criterion.filter_type, criterion.value.as_deref())
            else {
                continue;
            };
            let kind = FilterType::from_code(code);
            let needle = value.to_lowercase();

            let matches: Vec<Arc<ExtensionRecord>> = match kind {
                FilterType::ExtensionId => snapshot
                    .records()
                    .filter(|r| r.extension_id.eq_ignore_ascii_case(&needle))
                    .cloned()
                    .collect(),
                FilterType::ExtensionName => snapshot
                    .iter()
                    .filter(|(identity, _)| identity.to_lowercase() == needle)
                    .map(|(_, r)| Arc::clone(r))
                    .collect(),
                FilterType::SearchText => snapshot
                    .records()
                    .filter(|r| matches_text(r, &needle))
                    .cloned()
                    .collect(),
                FilterType::Tag | FilterType::Category | FilterType::Featured => {
                    info!("Filter type {:?} not implemented, ignoring {:?}", kind, value);
                    continue;
                }
                FilterType::Target | FilterType::ExcludeWithFlags => {
                    debug!("Filter type {:?} accepted as a no-op, ignoring {:?}", kind, value);
                    continue;
                }
                FilterType::Unknown(code) => {
                    warn!("Undefined filter type {} with value {:?}", code, value);
                    continue;
                }
            };

            let identities = matches.iter().map(|r| r.identity.clone());
            match matched_by_kind.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, seen)) => seen.extend(identities),
                None => matched_by_kind.push((kind, identities.collect())),
            }
            result.extend(matches);
        }

        if matched_by_kind.len() > 1 {
            result.retain(|r| {
                matched_by_kind
                    .iter()
                    .all(|(_, seen)| seen.contains(&r.identity))
            });
        }

        if result.is_empty() && criteria.len() <= FALLBACK_MAX_CRITERIA {
            info!("No matches for {} criteria, returning recommended", criteria.len());
            return snapshot.recommended();
        }
        result
    }

    /// Stable sort. Only `Ascending` sorts ascending; publisher and title orders
    /// run the other way round, and unrecognized keys sort by title.
    pub fn sort(results: &mut [Arc<ExtensionRecord>], sort_by: SortBy, sort_order: SortOrder) {
        let descending = sort_order != SortOrder::Ascending;
        let apply = |ord: Ordering, descending: bool| if descending { ord.reverse() } else { ord };

        match sort_by {
            SortBy::PublisherName => results.sort_by(|a, b| {
                apply(a.publisher_name().cmp(b.publisher_name()), !descending)
            }),
            SortBy::InstallCount => results.sort_by(|a, b| {
                apply(a.stats.install.total_cmp(&b.stats.install), descending)
            }),
            SortBy::AverageRating => results.sort_by(|a, b| {
                apply(
                    a.stats.averagerating.total_cmp(&b.stats.averagerating),
                    descending,
                )
            }),
            SortBy::WeightedRating => results.sort_by(|a, b| {
                apply(
                    a.stats.weighted_rating.total_cmp(&b.stats.weighted_rating),
                    descending,
                )
            }),
            SortBy::LastUpdatedDate => results.sort_by(|a, b| {
                apply(
                    parse_date(&a.last_updated).cmp(&parse_date(&b.last_updated)),
                    descending,
                )
            }),
            SortBy::PublishedDate => results.sort_by(|a, b| {
                apply(
                    parse_date(&a.published_date).cmp(&parse_date(&b.published_date)),
                    descending,
                )
            }),
            SortBy::NoneOrRelevance | SortBy::Title | SortBy::Other(_) => results
                .sort_by(|a, b| apply(a.display_name.cmp(&b.display_name), !descending)),
        }
    }
}

fn matches_text(record: &ExtensionRecord, needle: &str) -> bool {
    record.identity.to_lowercase().contains(needle)
        || record.display_name.to_lowercase().contains(needle)
        || record
            .short_description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Missing or unparseable dates sort as oldest.
fn parse_date(raw: &Option<String>) -> Option<NaiveDateTime> {
    raw.as_deref()
        .and_then(|s| NaiveDateTime::parse_from_str(s, MARKETPLACE_TIMESTAMP_FORMAT).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vscmirror_api::models::QueryFilter;

    fn record(identity: &str, install: f64) -> ExtensionRecord {
        serde_json::from_value(json!({
            "identity": identity,
            "displayName": identity.to_uppercase(),
            "publisher": {"publisherName": identity.split('.').next().unwrap()},
            "stats": {"install": install},
            "versions": [{"version": "1.0.0"}]
        }))
        .unwrap()
    }

    fn identities(results: &[Arc<ExtensionRecord>]) -> Vec<&str> {
        results.iter().map(|r| r.identity.as_str()).collect()
    }

    #[test]
    fn default_sort_is_install_count_descending() {
        let snapshot = CatalogSnapshot::from_records([
            record("p.a", 10.0),
            record("p.b", 50.0),
            record("p.c", 30.0),
        ]);
        let request = QueryRequest::search_text("p.");
        let response = QueryEngine::execute(&snapshot, &request).unwrap();
        assert_eq!(identities(response.extensions()), vec!["p.b", "p.c", "p.a"]);
        assert_eq!(response.total_count(), 3);
    }

    #[test]
    fn publisher_sort_inverts_requested_direction() {
        let mut results: Vec<_> = ["b.x", "a.x", "c.x"]
            .into_iter()
            .map(|id| Arc::new(record(id, 0.0)))
            .collect();
        QueryEngine::sort(&mut results, SortBy::PublisherName, SortOrder::Descending);
        assert_eq!(identities(&results), vec!["a.x", "b.x", "c.x"]);
        QueryEngine::sort(&mut results, SortBy::PublisherName, SortOrder::Ascending);
        assert_eq!(identities(&results), vec!["c.x", "b.x", "a.x"]);
    }

    #[test]
    fn rating_sorts_use_their_own_statistic() {
        let mut low = record("p.low", 900.0);
        low.stats.averagerating = 2.0;
        low.stats.weighted_rating = 4.9;
        let mut high = record("p.high", 10.0);
        high.stats.averagerating = 4.5;
        high.stats.weighted_rating = 3.1;
        let mut results = vec![Arc::new(low), Arc::new(high)];

        QueryEngine::sort(&mut results, SortBy::AverageRating, SortOrder::Default);
        assert_eq!(identities(&results), vec!["p.high", "p.low"]);
        QueryEngine::sort(&mut results, SortBy::WeightedRating, SortOrder::Descending);
        assert_eq!(identities(&results), vec!["p.low", "p.high"]);
        QueryEngine::sort(&mut results, SortBy::AverageRating, SortOrder::Ascending);
        assert_eq!(identities(&results), vec!["p.low", "p.high"]);
    }

    #[test]
    fn published_date_sort_puts_newest_first() {
        let mut first = record("p.first", 0.0);
        first.published_date = Some("2019-03-02T08:15:00.5Z".to_string());
        let mut second = record("p.second", 0.0);
        second.published_date = Some("2022-11-20T17:45:12Z".to_string());
        let mut garbled = record("p.garbled", 0.0);
        garbled.published_date = Some("last tuesday".to_string());

        let mut results = vec![Arc::new(garbled), Arc::new(first), Arc::new(second)];
        QueryEngine::sort(&mut results, SortBy::PublishedDate, SortOrder::Descending);
        assert_eq!(identities(&results), vec!["p.second", "p.first", "p.garbled"]);
        QueryEngine::sort(&mut results, SortBy::PublishedDate, SortOrder::Ascending);
        assert_eq!(identities(&results), vec!["p.garbled", "p.first", "p.second"]);
    }

    #[test]
    fn unrecognized_sort_code_falls_back_to_title() {
        let mut results: Vec<_> = ["p.charlie", "p.alpha", "p.bravo"]
            .into_iter()
            .map(|id| Arc::new(record(id, 0.0)))
            .collect();
        let sort_by = SortBy::from_code(99);
        assert_eq!(sort_by, SortBy::Other(99));

        QueryEngine::sort(&mut results, sort_by, SortOrder::Default);
        assert_eq!(identities(&results), vec!["p.alpha", "p.bravo", "p.charlie"]);
        QueryEngine::sort(&mut results, sort_by, SortOrder::Ascending);
        assert_eq!(identities(&results), vec!["p.charlie", "p.bravo", "p.alpha"]);
    }

    #[test]
    fn extension_name_matches_identity_ignoring_case() {
        let snapshot = CatalogSnapshot::from_records([
            record("ms-python.python", 1.0),
            record("ms-python.pylint", 1.0),
        ]);
        let results = QueryEngine::apply_criteria(
            &snapshot,
            &[Criterion::new(FilterType::ExtensionName, "MS-Python.Python")],
        );
        assert_eq!(identities(&results), vec!["ms-python.python"]);
    }

    #[test]
    fn target_and_exclude_flags_are_no_ops() {
        let snapshot = CatalogSnapshot::from_records([record("p.a", 1.0), record("p.b", 1.0)]);
        let results = QueryEngine::apply_criteria(
            &snapshot,
            &[
                Criterion::new(FilterType::ExtensionName, "p.a"),
                Criterion::new(FilterType::Target, "Microsoft.VisualStudio.Code"),
                Criterion::new(FilterType::ExcludeWithFlags, "4096"),
            ],
        );
        assert_eq!(identities(&results), vec!["p.a"]);
    }

    #[test]
    fn ties_keep_their_order() {
        let mut results: Vec<_> = ["p.one", "p.two", "p.three"]
            .into_iter()
            .map(|id| Arc::new(record(id, 5.0)))
            .collect();
        QueryEngine::sort(&mut results, SortBy::InstallCount, SortOrder::Descending);
        assert_eq!(identities(&results), vec!["p.one", "p.two", "p.three"]);
    }

    #[test]
    fn missing_dates_sort_oldest() {
        let mut dated = record("p.new", 0.0);
        dated.last_updated = Some("2024-05-01T10:00:00.123Z".to_string());
        let mut older = record("p.old", 0.0);
        older.last_updated = Some("2023-01-01T00:00:00Z".to_string());
        let undated = record("p.none", 0.0);

        let mut results = vec![Arc::new(undated), Arc::new(older), Arc::new(dated)];
        QueryEngine::sort(&mut results, SortBy::LastUpdatedDate, SortOrder::Default);
        assert_eq!(identities(&results), vec!["p.new", "p.old", "p.none"]);
    }

    #[test]
    fn rejects_requests_without_required_parts() {
        let snapshot = CatalogSnapshot::empty();
        let no_filters = QueryRequest {
            flags: Some(0),
            ..QueryRequest::default()
        };
        assert!(matches!(
            QueryEngine::execute(&snapshot, &no_filters),
            Err(CatalogError::InvalidQuery(_))
        ));

        let no_criteria = QueryRequest {
            filters: vec![QueryFilter::default()],
            flags: Some(0),
            asset_types: None,
        };
        assert!(QueryEngine::execute(&snapshot, &no_criteria).is_err());

        let mut no_flags = QueryRequest::search_text("x");
        no_flags.flags = None;
        assert!(QueryEngine::execute(&snapshot, &no_flags).is_err());
    }

    #[test]
    fn different_kinds_intersect() {
        let mut target = record("ms-python.python", 1.0);
        target.extension_id = "F1F59AE4-9318-4F3C-A9B5-81B2EAA5F8A5".to_string();
        let snapshot = CatalogSnapshot::from_records([target, record("ms-python.pylint", 1.0)]);

        let results = QueryEngine::apply_criteria(
            &snapshot,
            &[
                Criterion::new(FilterType::SearchText, "python"),
                Criterion::new(FilterType::ExtensionId, "f1f59ae4-9318-4f3c-a9b5-81b2eaa5f8a5"),
            ],
        );
        assert_eq!(identities(&results), vec!["ms-python.python", "ms-python.python"]);
    }
}
