//! 状態変更パイプライン
//!
//! すべての状態変更が通る唯一の出口。コミットごとに:
//! 1. ローカルへ全体スナップショットを同期的に書く（リロードで編集が消えない）
//! 2. デバウンス付きのリモート送信を予約する
//!
//! デバウンスは「保留タイマー1枠」を世代カウンタでモデル化する。
//! 新しいコミットは世代を進めるだけでタイマーを追い越し、古いタイマーは
//! 起床後に世代が進んでいれば何もせず終了する。送信中のリクエストは
//! 決してキャンセルしない。各送信は常に全体スナップショットを運ぶため、
//! 順序は結果整合で足りる。

use crate::error::Result;
use crate::remote::RemoteStore;
use crate::store::LocalSnapshotStore;
use crate::types::StateSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// デバウンスの静穏間隔
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(800);

pub struct MutationPipeline {
    local: LocalSnapshotStore,
    remote: Arc<dyn RemoteStore>,
    debounce: Duration,
    /// 保留タイマー1枠ぶんの世代。進めることがキャンセルに相当する
    generation: Arc<AtomicU64>,
}

impl MutationPipeline {
    pub fn new(local: LocalSnapshotStore, remote: Arc<dyn RemoteStore>, debounce: Duration) -> Self {
        Self {
            local,
            remote,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 状態変更をコミットする
    ///
    /// ローカル書き込みはこの呼び出しが返る前に完了する。リモート送信は
    /// デバウンス後に1回だけ、コミット時点の全体スナップショットで行う。
    pub fn commit(&self, snapshot: &StateSnapshot) {
        self.local.save_snapshot(snapshot);
        self.schedule_push(snapshot.clone());
    }

    /// デバウンスを経ずに即時送信する（起動時の種まき・終了前のフラッシュ用）
    pub async fn push_now(&self, snapshot: &StateSnapshot) -> Result<()> {
        self.remote.push_state(snapshot).await
    }

    fn schedule_push(&self, snapshot: StateSnapshot) {
        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let remote = Arc::clone(&self.remote);
        let quiet = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if generation.load(Ordering::SeqCst) != scheduled {
                // より新しいコミットに追い越された
                return;
            }
            debug!("デバウンス満了、リモートへ同期");
            if let Err(e) = remote.push_state(&snapshot).await {
                // ロールバックも自動再試行もしない。次のコミットが再試行の機会になる
                warn!("リモート同期に失敗: {}", e);
            }
        });
    }
}
