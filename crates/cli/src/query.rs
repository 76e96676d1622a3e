use crate::{SortKey, sort_request};
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};
use vscmirror_api::models::{Criterion, ExtensionRecord, FilterType, QueryRequest};
use vscmirror_api::{CatalogLifecycle, GalleryService};
use vscmirror_core::MirrorConfig;

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Identity")]
    identity: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Versions")]
    versions: usize,
    #[tabled(rename = "Installs")]
    installs: String,
    #[tabled(rename = "Rating")]
    rating: String,
}

impl From<&ExtensionRecord> for ExtensionRow {
    fn from(record: &ExtensionRecord) -> Self {
        Self {
            identity: record.identity.clone(),
            name: record.display_name.clone(),
            latest: record
                .latest_version()
                .map(|v| match &v.target_platform {
                    Some(platform) => format!("{} ({})", v.version, platform),
                    None => v.version.clone(),
                })
                .unwrap_or_default(),
            versions: record.versions.len(),
            installs: format!("{:.0}", record.stats.install),
            rating: format!("{:.1}", record.stats.averagerating),
        }
    }
}

pub fn read_request(path: &Path) -> Result<QueryRequest, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// With no criteria at all the request lists the whole catalog by install count.
pub fn build_request(
    text: Option<String>,
    names: Vec<String>,
    ids: Vec<String>,
    sort_by: Option<SortKey>,
    ascending: bool,
) -> QueryRequest {
    let mut criteria: Vec<Criterion> = text
        .into_iter()
        .map(|t| Criterion::new(FilterType::SearchText, t))
        .collect();
    criteria.extend(names.into_iter().map(|n| Criterion::new(FilterType::ExtensionName, n)));
    criteria.extend(ids.into_iter().map(|id| Criterion::new(FilterType::ExtensionId, id)));
    if criteria.is_empty() {
        criteria.push(Criterion::new(FilterType::SearchText, ""));
    }

    let (sort_by, sort_order) = sort_request(sort_by, ascending);
    QueryRequest::new(criteria, sort_by, sort_order)
}

pub async fn run(
    config: MirrorConfig,
    request: QueryRequest,
    json: bool,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = vscmirror_runtime::build_default_engine(config);
    engine.refresh().await?;

    let response = engine.query(&request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let total = response.total_count();
    let rows: Vec<ExtensionRow> = response
        .extensions()
        .iter()
        .take(limit)
        .map(|record| ExtensionRow::from(record.as_ref()))
        .collect();

    if rows.is_empty() {
        println!("No matching extensions.");
    } else {
        println!("{}", Table::new(&rows).with(Style::psql()));
        if total > limit {
            println!("... {} more (use --limit or --json)", total - limit);
        }
    }
    Ok(())
}
