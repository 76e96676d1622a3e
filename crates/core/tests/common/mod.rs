#![allow(dead_code)]

use filetime::{FileTime, set_file_mtime};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use vscmirror_core::MirrorConfig;
use vscmirror_core::config::WatchMode;

/// Artifacts root with an empty `extensions/` directory.
pub fn mirror() -> (tempfile::TempDir, MirrorConfig) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("extensions")).unwrap();
    let config = MirrorConfig::new(dir.path())
        .with_workers(4)
        .with_url_root("https://mirror.test")
        .with_watch(WatchMode::Disabled);
    (dir, config)
}

pub fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

/// Writes `latest.json` with the first version and one `extension.json` per
/// remaining version.
pub fn write_extension(
    root: &Path,
    identity: &str,
    versions: &[&str],
    install: f64,
    recommended: bool,
) -> PathBuf {
    let dir = root.join(identity);
    let (publisher, name) = identity.split_once('.').unwrap();
    let describe = |version: &str| {
        json!({
            "identity": identity,
            "extensionId": format!("id-{identity}"),
            "extensionName": name,
            "displayName": name.to_uppercase(),
            "shortDescription": format!("The {name} extension"),
            "publisher": {"publisherName": publisher},
            "statistics": [{"statisticName": "install", "value": install}],
            "recommended": recommended,
            "versions": [{
                "version": version,
                "files": [{"assetType": "Microsoft.VisualStudio.Services.VSIXPackage"}]
            }]
        })
    };

    write_json(&dir.join("latest.json"), &describe(versions[0]));
    for version in &versions[1..] {
        write_json(&dir.join(version).join("extension.json"), &describe(version));
    }
    dir
}

/// Backdates every extension directory and marker so a cache written now is fresh.
pub fn backdate_tree(root: &Path) {
    let past = FileTime::from_unix_time(1_000_000, 0);
    for entry in fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        let marker = path.join("updated.json");
        if marker.exists() {
            set_file_mtime(&marker, past).unwrap();
        }
        set_file_mtime(&path, past).unwrap();
    }
}
