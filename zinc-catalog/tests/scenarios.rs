//! End-to-end scenarios against the public `zinc-catalog` API, exercised
//! over a real filesystem backend and the in-process coordinator.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use zinc_catalog::{BundleUpdateTask, Catalog};
use zinc_coordinator::InProcessCoordinator;
use zinc_core::pathmap;
use zinc_storage::FsStorageBackend;

async fn open_catalog(storage_dir: &TempDir) -> Catalog {
    Catalog::open_or_create(
        "com.example.test",
        Box::new(FsStorageBackend::new(storage_dir.path())),
        Arc::new(InProcessCoordinator::new()),
        None,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn s1_empty_repo_creation() {
    let storage_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&storage_dir).await;

    assert!(catalog.bundle_names().await.unwrap().is_empty());
    assert_eq!(catalog.format().await.unwrap(), 1);
    assert!(catalog.verify(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn s2_first_publish() {
    let storage_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    fs::write(src_dir.path().join("a"), b"hello").unwrap();
    fs::create_dir(src_dir.path().join("sub")).unwrap();
    fs::write(src_dir.path().join("sub/b"), b"world").unwrap();

    let catalog = open_catalog(&storage_dir).await;
    let outcome = BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();
    assert_eq!(outcome.version, 1);

    assert_eq!(catalog.versions_for_bundle("meep").await.unwrap(), vec![1]);

    let manifest = catalog.manifest_for_bundle("meep", 1).await.unwrap().unwrap();
    assert_eq!(manifest.files.len(), 2);
    assert_eq!(manifest.files["a"].sha, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    assert_eq!(manifest.files["sub/b"].sha, "7c211433f02071597741e6ff5a8ea34789abbf43");

    let storage = FsStorageBackend::new(storage_dir.path());
    assert!(
        storage
            .get(&pathmap::object_path("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", zinc_core::Format::Raw))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        storage
            .get(&pathmap::object_path("7c211433f02071597741e6ff5a8ea34789abbf43", zinc_core::Format::Raw))
            .await
            .unwrap()
            .is_some()
    );

    assert!(catalog.verify(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn s3_dedup_on_unmodified_republish() {
    let storage_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    fs::write(src_dir.path().join("a"), b"hello").unwrap();
    fs::create_dir(src_dir.path().join("sub")).unwrap();
    fs::write(src_dir.path().join("sub/b"), b"world").unwrap();

    let catalog = open_catalog(&storage_dir).await;
    BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();
    let repeat = BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();

    assert_eq!(repeat.version, 1);
    assert!(repeat.deduped);
    assert_eq!(catalog.versions_for_bundle("meep").await.unwrap(), vec![1]);

    let storage = FsStorageBackend::new(storage_dir.path());
    let object_count = storage.list("objects").await.unwrap().len();
    assert_eq!(object_count, 2);
}

#[tokio::test]
async fn s4_new_version_on_added_file() {
    let storage_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    fs::write(src_dir.path().join("a"), b"hello").unwrap();
    fs::create_dir(src_dir.path().join("sub")).unwrap();
    fs::write(src_dir.path().join("sub/b"), b"world").unwrap();

    let catalog = open_catalog(&storage_dir).await;
    BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();

    fs::write(src_dir.path().join("c"), b"!").unwrap();
    let second = BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();

    assert_eq!(second.version, 2);
    assert_eq!(catalog.versions_for_bundle("meep").await.unwrap(), vec![1, 2]);

    let manifest = catalog.manifest_for_bundle("meep", 2).await.unwrap().unwrap();
    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.files["a"].sha, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    assert_eq!(manifest.files["c"].sha, "0ab8318acaf6e678dd02e2b5c343ed41111b393d");
}

#[tokio::test]
async fn s5_distribution_lifecycle() {
    let storage_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    fs::write(src_dir.path().join("a"), b"hello").unwrap();

    let catalog = open_catalog(&storage_dir).await;
    BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();
    fs::write(src_dir.path().join("a"), b"hi").unwrap();
    BundleUpdateTask::new("meep", src_dir.path()).run(&catalog).await.unwrap();

    catalog.update_distribution("live", "meep", 1).await.unwrap();
    catalog.update_distribution("live", "meep", 2).await.unwrap();

    assert_eq!(catalog.distribution("meep", "live").await.unwrap(), Some(2));
    assert_eq!(catalog.distribution("meep", "prev:live").await.unwrap(), Some(1));
}

#[tokio::test]
async fn s6_unsupported_index_format_rejected() {
    let storage_dir = TempDir::new().unwrap();
    let storage = FsStorageBackend::new(storage_dir.path());
    let bad_index = br#"{"format":2,"id":"com.example.test","bundles":{},"distributions":{}}"#;
    storage.put(pathmap::INDEX_PATH, bytes::Bytes::from_static(bad_index)).await.unwrap();

    let err = Catalog::open_or_create(
        "com.example.test",
        Box::new(FsStorageBackend::new(storage_dir.path())),
        Arc::new(InProcessCoordinator::new()),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, zinc_catalog::Error::Core(zinc_core::Error::UnsupportedIndex { .. })));
}
