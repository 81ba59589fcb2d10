//! 起動時照合のテスト
//!
//! ローカル優先の決定方針と各フォールバック経路を検証する。

mod common;

use common::MockRemote;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use zaiko_sync::engine::SyncEngine;
use zaiko_sync::store::LocalSnapshotStore;
use zaiko_sync::types::{InventoryItem, StateSnapshot};

const DEBOUNCE: Duration = Duration::from_millis(800);

fn local_with_inventory(dir: &std::path::Path, items: Vec<InventoryItem>) -> LocalSnapshotStore {
    let store = LocalSnapshotStore::new(dir);
    store.save_snapshot(&StateSnapshot {
        inventory: items,
        ..Default::default()
    });
    store
}

fn item(id: &str, name: &str, ideal: f64, current: f64) -> InventoryItem {
    InventoryItem {
        id: id.into(),
        name: name.into(),
        ideal,
        current,
    }
}

/// ローカル在庫があればリモートより優先され、種まき送信が1回だけ走る
#[tokio::test]
async fn local_wins_over_remote_and_seeds_backend() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = local_with_inventory(dir.path(), vec![item("item-a", "タコ（1袋）", 2.0, 1.0)]);
    let remote = Arc::new(MockRemote::with_state(json!({
        "inventory": [{"id": "item-r", "name": "リモート品目", "ideal": 9, "current": 9}],
        "report": {},
        "photo": null,
    })));

    let engine = SyncEngine::bootstrap(local, remote.clone(), DEBOUNCE).await;

    let inventory = &engine.snapshot().inventory;
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].id, "item-a");
    assert_eq!(inventory[0].name, "タコ（1袋）");

    let pushes = remote.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].inventory, *inventory);
}

/// ローカルが空ならリモート状態をサニタイズして採用し、送信はしない
#[tokio::test]
async fn empty_local_adopts_remote() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = LocalSnapshotStore::new(dir.path());
    let remote = Arc::new(MockRemote::with_state(json!({
        "inventory": [{"name": "粉", "ideal": "4", "current": -2}],
        "report": {"sales": 56000},
        "photo": null,
    })));

    let engine = SyncEngine::bootstrap(local.clone(), remote.clone(), DEBOUNCE).await;

    let inventory = &engine.snapshot().inventory;
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].name, "粉");
    assert_eq!(inventory[0].ideal, 4.0);
    assert_eq!(inventory[0].current, 0.0);
    assert_eq!(engine.snapshot().report.sales, "56000");
    assert!(remote.pushes().is_empty());

    // 採用した状態はローカルへ保存されている
    let persisted = local.read_snapshot();
    assert_eq!(persisted.inventory, *inventory);
}

/// 双方とも空ならデフォルト在庫セットで起動する
#[tokio::test]
async fn empty_everywhere_falls_back_to_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = LocalSnapshotStore::new(dir.path());
    let remote = Arc::new(MockRemote::with_state(json!({
        "inventory": [],
        "report": {},
        "photo": null,
    })));

    let engine = SyncEngine::bootstrap(local, remote.clone(), DEBOUNCE).await;

    let inventory = &engine.snapshot().inventory;
    assert!(!inventory.is_empty());
    assert_eq!(inventory[0].name, "サラダ油（8個入り）");
    assert!(remote.pushes().is_empty());
}

/// 種まき送信の失敗は致命傷にならない: ローカル状態のまま起動して保存も済む
#[tokio::test]
async fn seed_push_failure_is_logged_and_nonfatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = local_with_inventory(dir.path(), vec![item("item-a", "タコ（1袋）", 2.0, 1.0)]);
    let remote = Arc::new(MockRemote::with_state_rejecting_pushes(json!({
        "inventory": [{"id": "item-r", "name": "リモート品目", "ideal": 9, "current": 9}],
        "report": {},
        "photo": null,
    })));

    let engine = SyncEngine::bootstrap(local.clone(), remote.clone(), DEBOUNCE).await;

    // ローカル優先の結果はそのまま
    let inventory = &engine.snapshot().inventory;
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].id, "item-a");
    assert!(remote.pushes().is_empty());

    // ローカル保存は送信失敗の前に済んでいる
    let persisted = local.read_snapshot();
    assert_eq!(persisted.inventory, *inventory);
}

/// シナリオA: リモート到達不能・ローカルあり → sanitize(local) で起動、リモートには触れない
#[tokio::test]
async fn remote_failure_recovers_from_local() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = local_with_inventory(dir.path(), vec![item("item-a", "A", 2.0, 1.0)]);
    let remote = Arc::new(MockRemote::unreachable_server());

    let engine = SyncEngine::bootstrap(local, remote.clone(), DEBOUNCE).await;

    let inventory = &engine.snapshot().inventory;
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].name, "A");
    assert_eq!(inventory[0].ideal, 2.0);
    assert_eq!(inventory[0].current, 1.0);
    assert_eq!(inventory[0].shortage(), 1);
    assert!(remote.pushes().is_empty());
}

/// リモート到達不能・ローカルも空 → デフォルト在庫セット
#[tokio::test]
async fn remote_failure_with_empty_local_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = LocalSnapshotStore::new(dir.path());
    let remote = Arc::new(MockRemote::unreachable_server());

    let engine = SyncEngine::bootstrap(local.clone(), remote.clone(), DEBOUNCE).await;

    assert!(!engine.snapshot().inventory.is_empty());
    assert!(remote.pushes().is_empty());
    // フォールバック採用後もローカルへ保存される
    assert!(!local.read_snapshot().inventory.is_empty());
}

/// 起動は失敗を外へ出さない: リモートの形が壊れていても有効な状態で完了する
#[tokio::test]
async fn malformed_remote_payload_never_fails_bootstrap() {
    let dir = tempdir().expect("Failed to create temp dir");
    let local = LocalSnapshotStore::new(dir.path());
    let remote = Arc::new(MockRemote::with_state(json!("こわれた応答")));

    let engine = SyncEngine::bootstrap(local, remote, DEBOUNCE).await;
    assert!(!engine.snapshot().inventory.is_empty());
}
