mod common;

use common::{backdate_tree, mirror, write_extension};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use vscmirror_api::models::{Criterion, FilterType, QueryRequest, SortBy, SortOrder};
use vscmirror_api::{CatalogLifecycle, GalleryService, RefreshOutcome, RefreshTrigger};
use vscmirror_core::EngineHandle;
use vscmirror_core::runtime::CatalogEngine;

fn identities(response: &vscmirror_api::models::QueryResponse) -> Vec<String> {
    response
        .extensions()
        .iter()
        .map(|r| r.identity.clone())
        .collect()
}

#[tokio::test]
async fn rebuild_then_reload_from_cache() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "a.one", &["1.0.0"], 1.0, false);
    write_extension(&config.extensions_root, "b.two", &["1.0.0"], 1.0, false);
    backdate_tree(&config.extensions_root);

    let first = EngineHandle::new(config.clone());
    assert_eq!(
        first.refresh().await.unwrap(),
        RefreshOutcome::Rebuilt { extensions: 2 }
    );
    assert!(config.cache_file.exists());

    let second = EngineHandle::new(config);
    assert_eq!(
        second.refresh().await.unwrap(),
        RefreshOutcome::LoadedFromCache { extensions: 2 }
    );
    assert_eq!(*second.snapshot().await, *first.snapshot().await);
}

#[tokio::test]
async fn install_count_is_the_default_sort() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "pub.a", &["1.0.0"], 10.0, false);
    write_extension(&config.extensions_root, "pub.b", &["1.0.0"], 50.0, false);
    write_extension(&config.extensions_root, "pub.c", &["1.0.0"], 30.0, false);

    let handle = EngineHandle::new(config);
    handle.rebuild().await.unwrap();

    let request = QueryRequest::new(
        vec![Criterion::new(FilterType::SearchText, "pub.")],
        Some(SortBy::InstallCount),
        None,
    );
    let response = handle.query(&request).await.unwrap();
    assert_eq!(identities(&response), vec!["pub.b", "pub.c", "pub.a"]);

    let again = handle.query(&request).await.unwrap();
    assert_eq!(again, response);
}

#[tokio::test]
async fn unknown_name_falls_back_to_recommended() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "pub.rec1", &["1.0.0"], 1.0, true);
    write_extension(&config.extensions_root, "pub.plain", &["1.0.0"], 2.0, false);
    write_extension(&config.extensions_root, "pub.rec2", &["1.0.0"], 3.0, true);

    let handle = EngineHandle::new(config);
    handle.rebuild().await.unwrap();

    let request = QueryRequest::new(
        vec![Criterion::new(FilterType::ExtensionName, "doesnotexist")],
        None,
        None,
    );
    let response = handle.query(&request).await.unwrap();
    assert_eq!(identities(&response), vec!["pub.rec2", "pub.rec1"]);
    assert_eq!(response.total_count(), 2);

    // Three criteria: no fallback.
    let request = QueryRequest::new(
        vec![
            Criterion::new(FilterType::ExtensionName, "doesnotexist"),
            Criterion::new(FilterType::Target, "Microsoft.VisualStudio.Code"),
            Criterion::new(FilterType::ExcludeWithFlags, "4096"),
        ],
        None,
        None,
    );
    assert_eq!(handle.query(&request).await.unwrap().total_count(), 0);
}

#[tokio::test]
async fn repeated_search_text_appends_matches() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "pub.alpha", &["1.0.0"], 1.0, false);
    write_extension(&config.extensions_root, "pub.beta", &["1.0.0"], 2.0, false);

    let handle = EngineHandle::new(config);
    handle.rebuild().await.unwrap();

    let request = QueryRequest::new(
        vec![
            Criterion::new(FilterType::SearchText, "alpha"),
            Criterion::new(FilterType::SearchText, "pub"),
        ],
        Some(SortBy::Title),
        Some(SortOrder::Descending),
    );
    let response = handle.query(&request).await.unwrap();
    // Title order is inverted, so "descending" lists A before B.
    assert_eq!(identities(&response), vec!["pub.alpha", "pub.alpha", "pub.beta"]);
}

#[tokio::test]
async fn extension_lookup_ignores_case() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "ms-python.python", &["1.0.0"], 1.0, false);

    let handle = EngineHandle::new(config);
    handle.rebuild().await.unwrap();
    assert!(handle.extension("MS-Python.Python").await.unwrap().is_some());
    assert!(handle.extension("ms-python.pylance").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_rebuild_keeps_previous_snapshot() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "a.one", &["1.0.0"], 1.0, false);

    let handle = EngineHandle::new(config.clone());
    handle.rebuild().await.unwrap();
    std::fs::remove_dir_all(&config.extensions_root).unwrap();

    assert!(handle.rebuild().await.is_err());
    assert_eq!(handle.snapshot().await.len(), 1);
    let status = handle.status().await.unwrap();
    assert!(status.loading_complete);
    assert!(!status.indexing_active);
}

#[tokio::test]
async fn overlapping_refresh_is_skipped() {
    let (_dir, config) = mirror();
    let engine = Arc::new(CatalogEngine::new(config));

    let guard = engine.index().try_begin_refresh().unwrap();
    assert_eq!(engine.refresh().await.unwrap(), RefreshOutcome::Skipped);
    drop(guard);
    assert!(matches!(
        engine.refresh().await.unwrap(),
        RefreshOutcome::Rebuilt { .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queries_during_rebuild_see_one_generation() {
    let (_dir, config) = mirror();
    let root = config.extensions_root.clone();
    for i in 0..20 {
        write_extension(&root, &format!("old.ext{i}"), &["1.0.0"], i as f64, false);
    }

    let handle = EngineHandle::new(config);
    handle.rebuild().await.unwrap();

    std::fs::remove_dir_all(&root).unwrap();
    std::fs::create_dir_all(&root).unwrap();
    for i in 0..60 {
        write_extension(&root, &format!("new.ext{i}"), &["1.0.0", "0.9.0"], i as f64, false);
    }

    let mut readers = JoinSet::new();
    for _ in 0..8 {
        let h = handle.clone();
        readers.spawn(async move {
            let request = QueryRequest::search_text("ext");
            let mut seen = Vec::new();
            for _ in 0..50 {
                let response = h.query(&request).await.unwrap();
                let prefixes: HashSet<&str> = response
                    .extensions()
                    .iter()
                    .map(|r| r.identity.split('.').next().unwrap())
                    .collect();
                assert_eq!(prefixes.len(), 1, "mixed generations: {prefixes:?}");
                let expected = if prefixes.contains("old") { 20 } else { 60 };
                assert_eq!(response.total_count(), expected);
                seen.push(expected);
                tokio::task::yield_now().await;
            }
            seen
        });
    }

    handle.rebuild().await.unwrap();
    while let Some(result) = readers.join_next().await {
        result.unwrap();
    }
    assert_eq!(handle.snapshot().await.len(), 60);
}

#[tokio::test]
async fn scheduler_runs_at_start_and_on_trigger() {
    let (_dir, config) = mirror();
    let root = config.extensions_root.clone();
    write_extension(&root, "a.one", &["1.0.0"], 1.0, false);

    let handle = EngineHandle::new(config.with_refresh_interval(Duration::from_secs(3600)));
    let trigger = handle.start_scheduler().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle.wait_loaded())
        .await
        .expect("initial refresh should publish");
    assert_eq!(handle.snapshot().await.len(), 1);

    // The refresh is recorded once the cache write has finished.
    let status = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let status = handle.status().await.unwrap();
            if status.refresh.last_refresh_timestamp.is_some() {
                break status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
    assert!(status.refresh.next_refresh_in_seconds > 3000);

    write_extension(&root, "b.two", &["1.0.0"], 1.0, false);
    let marker = root.join("b.two").join("updated.json");
    std::fs::write(&marker, "{}").unwrap();
    let future = std::time::SystemTime::now() + Duration::from_secs(3600);
    filetime::set_file_mtime(&marker, filetime::FileTime::from_system_time(future)).unwrap();
    trigger.trigger();

    let published = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if handle.snapshot().await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(published.is_ok(), "trigger should cause a rebuild");
    trigger.stop();
}

#[tokio::test]
async fn scheduler_lets_a_dropped_engine_go() {
    let (_dir, config) = mirror();
    write_extension(&config.extensions_root, "a.one", &["1.0.0"], 1.0, false);

    let engine = Arc::new(CatalogEngine::new(config));
    let scheduler = engine.start_scheduler().unwrap();
    tokio::time::timeout(Duration::from_secs(5), engine.index().wait_loaded())
        .await
        .expect("initial refresh should publish");

    let weak = Arc::downgrade(&engine);
    drop(scheduler);
    drop(engine);

    let released = tokio::time::timeout(Duration::from_secs(5), async {
        while weak.upgrade().is_some() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(released.is_ok(), "engine should be freed once nothing refers to it");
}
