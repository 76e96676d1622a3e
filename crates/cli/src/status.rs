use tabled::{Table, Tabled, settings::Style};
use vscmirror_api::models::CatalogStatus;
use vscmirror_api::{CatalogLifecycle, GalleryService};
use vscmirror_core::MirrorConfig;

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(field: &'static str, value: impl ToString) -> FieldRow {
    FieldRow {
        field,
        value: value.to_string(),
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

fn rows(status: &CatalogStatus) -> Vec<FieldRow> {
    let mut rows = vec![
        row("Status", format!("{:?}", status.status)),
        row("Extensions", status.extensions.loaded_count),
        row("Versions", status.extensions.total_versions),
        row("Publishers", status.extensions.unique_publishers),
        row("Recommended", status.extensions.recommended_count),
        row("Extensions root", &status.configuration.extensions_root),
        row("URL root", &status.configuration.url_root),
        row("Refresh interval", &status.configuration.update_interval),
        row("Cache", &status.configuration.cache_location),
    ];

    match (status.cache.exists, status.cache.size_bytes) {
        (true, Some(size)) => rows.push(row("Cache size", format_size(size))),
        (true, None) => {}
        (false, _) => rows.push(row("Cache size", "absent")),
    }
    if let Some(age) = status.cache.age_seconds {
        rows.push(row("Cache age", vscmirror_api::models::human_duration(age)));
    }
    if let Some(ago) = &status.refresh.last_refresh_ago {
        rows.push(row("Last refresh", format!("{} ago", ago)));
    }
    if !status.extensions.top_categories.is_empty() {
        let top = status
            .extensions
            .top_categories
            .iter()
            .map(|c| format!("{} ({})", c.name, c.count))
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(row("Top categories", top));
    }
    rows
}

pub async fn run(config: MirrorConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = vscmirror_runtime::build_default_engine(config);
    engine.load().await?;

    let status = engine.status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", Table::new(&rows(&status)).with(Style::psql()));
    Ok(())
}
