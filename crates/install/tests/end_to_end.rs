//! End-to-end installation runs over real executors
//!
//! The registry and artifact host are mocked HTTP servers; everything
//! else (download, extraction, deploy, activation, run-state
//! persistence) runs against real temp directories through the
//! standard production wiring.

use httpmock::prelude::*;
use tempfile::tempdir;
use tokio::io::AsyncWriteExt;

use plugkit_install::{standard_orchestrator, InstallConfig};
use plugkit_registry::{UpdateCache, UpdateData, UpdateEntry};
use plugkit_state::{JsonProgressStore, ProgressStore};
use plugkit_types::{PackageId, RunStatus, StepName};

/// Build a gzipped tar artifact with the given entries
async fn artifact(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    let tar_bytes = builder.into_inner().unwrap();

    let mut encoder = async_compression::tokio::write::GzipEncoder::new(Vec::new());
    encoder.write_all(&tar_bytes).await.unwrap();
    encoder.shutdown().await.unwrap();
    encoder.into_inner()
}

fn config(server: &MockServer, root: &std::path::Path) -> InstallConfig {
    InstallConfig::new(
        server.base_url(),
        root.join("work"),
        root.join("extensions"),
    )
}

#[tokio::test]
async fn test_self_hosted_package_installs_end_to_end() {
    let server = MockServer::start();
    let temp = tempdir().unwrap();

    let bytes = artifact(&[
        ("acme-seo/extension.toml", "id = \"acme-seo\"\n"),
        ("acme-seo/main.lua", "-- entry point\n"),
    ])
    .await;

    server.mock(|when, then| {
        when.method(GET).path("/packages/acme-seo");
        then.status(200).json_body(serde_json::json!({
            "id": "acme-seo",
            "kind": "plugin",
            "self_hosted": true,
            "download_url": server.url("/artifacts/acme-seo.tar.gz")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/artifacts/acme-seo.tar.gz");
        then.status(200).body(&bytes);
    });

    let config = config(&server, temp.path());
    let orch = standard_orchestrator(&config, None).unwrap();

    let run = orch.install(&[PackageId::from("acme-seo")]).await.unwrap();

    assert_eq!(run.status, RunStatus::Finished);
    let item = run.item(&PackageId::from("acme-seo")).unwrap();
    assert!(item.last_error.is_none());
    assert_eq!(item.last_step, Some(StepName::Activate));

    // The package landed in the target root
    let installed = config.target_root.join("acme-seo");
    assert_eq!(item.installed_path.as_deref(), Some(installed.as_path()));
    assert!(installed.join("main.lua").exists());

    // And was activated
    let active = tokio::fs::read_to_string(config.target_root.join("active.json"))
        .await
        .unwrap();
    assert!(active.contains("acme-seo"));

    // The durable run state matches what the call returned
    let persisted = JsonProgressStore::new(&config.state_dir).load().await.unwrap();
    assert_eq!(persisted, run);
}

#[tokio::test]
async fn test_entitled_package_installs_from_update_cache() {
    let server = MockServer::start();
    let temp = tempdir().unwrap();

    // The archive's folder name differs from the package id; only the
    // manifest links them, which exercises activation discovery.
    let bytes = artifact(&[
        ("forms-pro/extension.toml", "id = \"acme-forms\"\n"),
        ("forms-pro/main.lua", "-- entry point\n"),
    ])
    .await;

    server.mock(|when, then| {
        when.method(GET).path("/packages/acme-forms");
        then.status(200).json_body(serde_json::json!({
            "id": "acme-forms",
            "kind": "plugin",
            "self_hosted": false
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/updates/acme-forms.tar.gz");
        then.status(200).body(&bytes);
    });

    let config = config(&server, temp.path());

    // Grant the entitlement
    tokio::fs::create_dir_all(&config.work_dir).await.unwrap();
    tokio::fs::write(
        &config.entitlements_file,
        "[[grant]]\npackage = \"acme-forms\"\n",
    )
    .await
    .unwrap();

    // Seed the update cache, checksum included
    let mut updates = UpdateData::new();
    updates.packages.insert(
        PackageId::from("acme-forms"),
        UpdateEntry {
            artifact_url: server.url("/updates/acme-forms.tar.gz"),
            version: semver::Version::new(3, 2, 0),
            checksum: Some(blake3::hash(&bytes).to_hex().to_string()),
        },
    );
    UpdateCache::new(&config.cache_dir).save(&updates).await.unwrap();

    let orch = standard_orchestrator(&config, None).unwrap();
    let run = orch.install(&[PackageId::from("acme-forms")]).await.unwrap();

    assert_eq!(run.status, RunStatus::Finished);
    let item = run.item(&PackageId::from("acme-forms")).unwrap();
    assert!(item.last_error.is_none());
    assert_eq!(
        item.installed_path.as_deref(),
        Some(config.target_root.join("forms-pro").as_path())
    );

    let active = tokio::fs::read_to_string(config.target_root.join("active.json"))
        .await
        .unwrap();
    assert!(active.contains("forms-pro"));
}

#[tokio::test]
async fn test_missing_entitlement_fails_without_downloading() {
    let server = MockServer::start();
    let temp = tempdir().unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/packages/acme-forms");
        then.status(200).json_body(serde_json::json!({
            "id": "acme-forms",
            "kind": "plugin",
            "self_hosted": false,
            "download_url": server.url("/never-fetched.tar.gz")
        }));
    });

    // No grant file is ever written
    let config = config(&server, temp.path());
    let orch = standard_orchestrator(&config, None).unwrap();

    let run = orch.install(&[PackageId::from("acme-forms")]).await.unwrap();

    assert_eq!(run.status, RunStatus::HasError);
    let item = run.item(&PackageId::from("acme-forms")).unwrap();
    assert_eq!(item.last_step, Some(StepName::ResolveMetadata));
    assert!(item.last_error.as_deref().unwrap().contains("missing entitlement"));
    assert!(item.download_path.is_none());
    assert!(item.unpacked_path.is_none());
    assert!(item.installed_path.is_none());

    // Nothing was fetched into the work dir
    assert!(!config.downloads_dir().exists());
}

#[tokio::test]
async fn test_corrupt_archive_halts_item_at_extract() {
    let server = MockServer::start();
    let temp = tempdir().unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/packages/acme-seo");
        then.status(200).json_body(serde_json::json!({
            "id": "acme-seo",
            "kind": "plugin",
            "self_hosted": true,
            "download_url": server.url("/artifacts/acme-seo.tar.gz")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/artifacts/acme-seo.tar.gz");
        then.status(200).body(b"this is not a gzip stream");
    });

    let config = config(&server, temp.path());
    let orch = standard_orchestrator(&config, None).unwrap();

    let run = orch.install(&[PackageId::from("acme-seo")]).await.unwrap();

    assert_eq!(run.status, RunStatus::HasError);
    let item = run.item(&PackageId::from("acme-seo")).unwrap();
    assert_eq!(item.last_step, Some(StepName::Extract));
    assert!(item.last_error.is_some());

    // The download happened, extraction output did not
    assert!(item.download_path.as_deref().unwrap().exists());
    assert!(item.unpacked_path.is_none());
    assert!(item.installed_path.is_none());

    // The target root was never touched
    assert!(!config.target_root.join("acme-seo").exists());
}

#[tokio::test]
async fn test_batch_survives_one_bad_item() {
    let server = MockServer::start();
    let temp = tempdir().unwrap();

    let good = artifact(&[("acme-seo/extension.toml", "id = \"acme-seo\"\n")]).await;

    server.mock(|when, then| {
        when.method(GET).path("/packages/acme-seo");
        then.status(200).json_body(serde_json::json!({
            "id": "acme-seo",
            "kind": "plugin",
            "self_hosted": true,
            "download_url": server.url("/artifacts/acme-seo.tar.gz")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/artifacts/acme-seo.tar.gz");
        then.status(200).body(&good);
    });
    // The registry has never heard of the second package
    server.mock(|when, then| {
        when.method(GET).path("/packages/ghost");
        then.status(404);
    });

    let config = config(&server, temp.path());
    let orch = standard_orchestrator(&config, None).unwrap();

    let run = orch
        .install(&[PackageId::from("ghost"), PackageId::from("acme-seo")])
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::HasError);

    let ghost = run.item(&PackageId::from("ghost")).unwrap();
    assert!(ghost.last_error.as_deref().unwrap().contains("not found"));

    let seo = run.item(&PackageId::from("acme-seo")).unwrap();
    assert!(seo.last_error.is_none());
    assert!(config.target_root.join("acme-seo").exists());
}
