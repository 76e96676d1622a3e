use super::extension::ExtensionRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of a marketplace `extensionquery` request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_types: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<Criterion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// One filter clause. Either half may be missing on the wire; such clauses are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Criterion {
    pub fn new(filter_type: FilterType, value: impl Into<String>) -> Self {
        Self {
            filter_type: Some(filter_type.code()),
            value: Some(value.into()),
        }
    }
}

impl QueryRequest {
    /// Single-filter request, the shape every editor client sends.
    pub fn new(criteria: Vec<Criterion>, sort_by: Option<SortBy>, sort_order: Option<SortOrder>) -> Self {
        Self {
            filters: vec![QueryFilter {
                criteria: Some(criteria),
                sort_by: sort_by.map(SortBy::code),
                sort_order: sort_order.map(SortOrder::code),
                page_number: Some(1),
                page_size: None,
            }],
            flags: Some(0),
            asset_types: None,
        }
    }

    pub fn search_text(text: impl Into<String>) -> Self {
        Self::new(vec![Criterion::new(FilterType::SearchText, text)], None, None)
    }
}

/// Marketplace filter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    Tag,
    ExtensionId,
    Category,
    ExtensionName,
    Target,
    Featured,
    SearchText,
    ExcludeWithFlags,
    Unknown(u32),
}

impl FilterType {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => FilterType::Tag,
            4 => FilterType::ExtensionId,
            5 => FilterType::Category,
            7 => FilterType::ExtensionName,
            8 => FilterType::Target,
            9 => FilterType::Featured,
            10 => FilterType::SearchText,
            12 => FilterType::ExcludeWithFlags,
            other => FilterType::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            FilterType::Tag => 1,
            FilterType::ExtensionId => 4,
            FilterType::Category => 5,
            FilterType::ExtensionName => 7,
            FilterType::Target => 8,
            FilterType::Featured => 9,
            FilterType::SearchText => 10,
            FilterType::ExcludeWithFlags => 12,
            FilterType::Unknown(code) => code,
        }
    }
}

/// Marketplace sort keys. `Other` covers codes with no dedicated ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortBy {
    NoneOrRelevance,
    LastUpdatedDate,
    Title,
    PublisherName,
    InstallCount,
    PublishedDate,
    AverageRating,
    WeightedRating,
    Other(u32),
}

impl SortBy {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => SortBy::NoneOrRelevance,
            1 => SortBy::LastUpdatedDate,
            2 => SortBy::Title,
            3 => SortBy::PublisherName,
            4 => SortBy::InstallCount,
            5 => SortBy::PublishedDate,
            6 => SortBy::AverageRating,
            12 => SortBy::WeightedRating,
            other => SortBy::Other(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            SortBy::NoneOrRelevance => 0,
            SortBy::LastUpdatedDate => 1,
            SortBy::Title => 2,
            SortBy::PublisherName => 3,
            SortBy::InstallCount => 4,
            SortBy::PublishedDate => 5,
            SortBy::AverageRating => 6,
            SortBy::WeightedRating => 12,
            SortBy::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Default,
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => SortOrder::Ascending,
            2 => SortOrder::Descending,
            _ => SortOrder::Default,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            SortOrder::Default => 0,
            SortOrder::Ascending => 1,
            SortOrder::Descending => 2,
        }
    }
}

/// Envelope returned for every query. Paging is never real: one page, null token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub results: Vec<QueryResultSet>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultSet {
    pub extensions: Vec<Arc<ExtensionRecord>>,
    pub paging_token: Option<String>,
    pub result_metadata: Vec<ResultMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub metadata_type: String,
    pub metadata_items: Vec<MetadataItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetadataItem {
    pub name: String,
    pub count: usize,
}

impl QueryResponse {
    pub fn from_extensions(extensions: Vec<Arc<ExtensionRecord>>) -> Self {
        let count = extensions.len();
        Self {
            results: vec![QueryResultSet {
                extensions,
                paging_token: None,
                result_metadata: vec![ResultMetadata {
                    metadata_type: "ResultCount".to_string(),
                    metadata_items: vec![MetadataItem {
                        name: "TotalCount".to_string(),
                        count,
                    }],
                }],
            }],
        }
    }

    /// Extensions of the first (and only) result set.
    pub fn extensions(&self) -> &[Arc<ExtensionRecord>] {
        self.results
            .first()
            .map(|r| r.extensions.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_count(&self) -> usize {
        self.results
            .first()
            .and_then(|r| r.result_metadata.first())
            .and_then(|m| m.metadata_items.first())
            .map(|i| i.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_response_envelope_shape() {
        let value = serde_json::to_value(QueryResponse::from_extensions(vec![])).unwrap();
        assert_eq!(
            value,
            json!({
                "results": [{
                    "extensions": [],
                    "pagingToken": null,
                    "resultMetadata": [{
                        "metadataType": "ResultCount",
                        "metadataItems": [{"name": "TotalCount", "count": 0}]
                    }]
                }]
            })
        );
    }

    #[test]
    fn parses_client_request() {
        let request: QueryRequest = serde_json::from_value(json!({
            "filters": [{
                "criteria": [
                    {"filterType": 8, "value": "Microsoft.VisualStudio.Code"},
                    {"filterType": 10, "value": "python"}
                ],
                "pageNumber": 1,
                "pageSize": 50,
                "sortBy": 0,
                "sortOrder": 0
            }],
            "assetTypes": [],
            "flags": 950
        }))
        .unwrap();

        let filter = &request.filters[0];
        let criteria = filter.criteria.as_ref().unwrap();
        assert_eq!(criteria.len(), 2);
        assert_eq!(
            FilterType::from_code(criteria[1].filter_type.unwrap()),
            FilterType::SearchText
        );
        assert_eq!(SortBy::from_code(filter.sort_by.unwrap()), SortBy::NoneOrRelevance);
        assert_eq!(request.flags, Some(950));
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(FilterType::from_code(14), FilterType::Unknown(14));
        assert_eq!(FilterType::Unknown(14).code(), 14);
        assert_eq!(SortBy::from_code(9), SortBy::Other(9));
        assert_eq!(SortOrder::from_code(7), SortOrder::Default);
    }
}
