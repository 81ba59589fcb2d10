//! 同期エンジン本体
//!
//! 生きているスナップショットを所有し、すべての変更操作を公開する。
//! 変更はどれも `MutationPipeline` を通る: ローカル書き込みは同期、
//! リモート送信はデバウンス。可変参照 `&mut self` が「同時に変更者は
//! 1人」という規律をそのまま型で担保するので、スナップショットに
//! ロックは要らない。
//!
//! 起動時の照合（ローカル優先の決定方針）もここに置く。

use crate::error::Result;
use crate::merger;
use crate::pipeline::MutationPipeline;
use crate::remote::{RecognitionObservation, RemoteStore};
use crate::report;
use crate::sanitizer;
use crate::store::LocalSnapshotStore;
use crate::types::{
    generate_item_id, InventoryItem, MaterialSchedule, PhotoAttachment, ReportDraft, StateSnapshot,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 新規追加時の品目名
const NEW_ITEM_NAME: &str = "新しい材料";

/// テキストで更新できる日報フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Loss,
    SetCount,
    OperationHours,
    Sales,
    Insights,
}

/// 在庫品目への部分更新
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub ideal: Option<f64>,
    pub current: Option<f64>,
}

pub struct SyncEngine {
    snapshot: StateSnapshot,
    pipeline: MutationPipeline,
}

impl SyncEngine {
    /// 起動時照合を実行してエンジンを構築する
    ///
    /// 決定方針（順に評価）:
    /// 1. ローカル在庫が非空ならローカルが無条件に勝つ。ローカルへ保存し、
    ///    リモートへ1回だけ種まき送信を試みる（失敗はログのみ）
    /// 2. リモート取得が成功していればリモート状態をサニタイズして採用
    ///    （空在庫はデフォルトセットに置き換わる）し、ローカルへ保存
    /// 3. リモート取得自体が失敗したらローカルのみで復旧し、リモートには
    ///    一切触れない
    ///
    /// どの経路でもローカル書き込みはちょうど1回、リモート書き込みは
    /// 高々1回。失敗を呼び出し側に出すことはなく、必ず有効な
    /// スナップショットで完了する。
    pub async fn bootstrap(
        local: LocalSnapshotStore,
        remote: Arc<dyn RemoteStore>,
        debounce: Duration,
    ) -> Self {
        let snapshot = match remote.fetch_state().await {
            Ok(payload) => {
                let stored = local.read_snapshot();
                if !stored.inventory.is_empty() {
                    // ローカル優先: 直近の編集意図とみなす
                    local.save_snapshot(&stored);
                    if let Err(e) = remote.push_state(&stored).await {
                        warn!("ローカル状態の種まき送信に失敗: {}", e);
                    }
                    stored
                } else {
                    let snapshot = snapshot_from_payload(&payload);
                    local.save_snapshot(&snapshot);
                    snapshot
                }
            }
            Err(e) => {
                warn!("リモート取得に失敗、ローカル状態へフォールバック: {}", e);
                let stored = local.read_snapshot();
                let inventory = if stored.inventory.is_empty() {
                    sanitizer::default_inventory()
                } else {
                    stored.inventory
                };
                let snapshot = StateSnapshot {
                    inventory,
                    report: stored.report,
                    photo: stored.photo,
                };
                local.save_snapshot(&snapshot);
                snapshot
            }
        };

        info!("起動時照合が完了 ({}品目)", snapshot.inventory.len());
        Self {
            snapshot,
            pipeline: MutationPipeline::new(local, remote, debounce),
        }
    }

    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    /// 品目を名前（完全一致）で探す
    pub fn find_item(&self, name: &str) -> Option<&InventoryItem> {
        self.snapshot.inventory.iter().find(|item| item.name == name)
    }

    /// 品目を部分更新する。IDが見つからなければfalse
    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> bool {
        let Some(item) = self.snapshot.inventory.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(ideal) = patch.ideal {
            item.ideal = sanitizer::normalize_count(Some(&Value::from(ideal)));
        }
        if let Some(current) = patch.current {
            item.current = sanitizer::normalize_count(Some(&Value::from(current)));
        }
        self.commit();
        true
    }

    /// 品目を末尾に追加し、IDを返す
    pub fn add_item(&mut self, name: Option<&str>) -> String {
        let id = generate_item_id();
        self.snapshot.inventory.push(InventoryItem {
            id: id.clone(),
            name: name.unwrap_or(NEW_ITEM_NAME).to_string(),
            ideal: 0.0,
            current: 0.0,
        });
        self.commit();
        id
    }

    /// 品目を削除する。最後の1件を消すとデフォルトセットに戻る
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.snapshot.inventory.len();
        self.snapshot.inventory.retain(|item| item.id != id);
        if self.snapshot.inventory.len() == before {
            return false;
        }
        if self.snapshot.inventory.is_empty() {
            self.snapshot.inventory = sanitizer::default_inventory();
        }
        self.commit();
        true
    }

    /// 並び替え要求を適用する
    ///
    /// 現在のID集合の完全な並べ替え（重複・欠落・未知IDなし）のときだけ
    /// そのまま新しい順序として受け入れる。それ以外は状態を変えず拒否
    pub fn reorder(&mut self, ordered_ids: &[String]) -> bool {
        let inventory = &self.snapshot.inventory;
        if ordered_ids.len() != inventory.len() {
            warn!("並び替え要求を拒否: 要素数が一致しません");
            return false;
        }
        let current: HashSet<&str> = inventory.iter().map(|i| i.id.as_str()).collect();
        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        if requested.len() != ordered_ids.len() || requested != current {
            warn!("並び替え要求を拒否: IDの並べ替えになっていません");
            return false;
        }

        let mut by_id: std::collections::HashMap<String, InventoryItem> = self
            .snapshot
            .inventory
            .drain(..)
            .map(|item| (item.id.clone(), item))
            .collect();
        self.snapshot.inventory = ordered_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        self.commit();
        true
    }

    /// 日報のテキストフィールドを更新する
    pub fn set_report_field(&mut self, field: ReportField, value: String) {
        let report = &mut self.snapshot.report;
        match field {
            ReportField::Loss => report.loss = value,
            ReportField::SetCount => report.set_count = value,
            ReportField::OperationHours => report.operation_hours = value,
            ReportField::Sales => report.sales = value,
            ReportField::Insights => report.insights = value,
        }
        self.commit();
    }

    /// 材料受け取り予定を設定・解除する
    pub fn set_material_schedule(&mut self, schedule: Option<MaterialSchedule>) {
        self.snapshot.report.material_received_at = schedule;
        self.commit();
    }

    /// 写真を添付する（既存の写真は丸ごと置き換え）
    pub fn attach_photo(&mut self, bytes: &[u8], file_name: &str, mime: &str) {
        self.snapshot.photo = Some(PhotoAttachment::from_bytes(bytes, file_name, mime));
        self.commit();
    }

    pub fn remove_photo(&mut self) {
        self.snapshot.photo = None;
        self.commit();
    }

    /// 認識結果を在庫へマージしてコミットする
    ///
    /// 認識リクエストの発行時点ではなく、この呼び出し時点の生きている
    /// スナップショットを読む。フィールド単位の競合検出はなく、認識完了
    /// までの手編集は同名品目について上書きされうる
    pub fn apply_recognition(&mut self, observations: &[RecognitionObservation]) {
        let merged = merger::merge_observations(&self.snapshot.inventory, observations);
        self.snapshot.inventory = sanitizer::sanitize_items(merged);
        self.commit();
    }

    /// 日報メッセージを組み立てる（コピー共有用）
    pub fn compose_report(&self) -> String {
        report::compose_message(&self.snapshot.report, &self.snapshot.inventory)
    }

    /// デバウンスを待たずに現在のスナップショットを即時送信する
    pub async fn flush(&self) -> Result<()> {
        self.pipeline.push_now(&self.snapshot).await
    }

    fn commit(&self) {
        self.pipeline.commit(&self.snapshot);
    }
}

/// リモート応答からスナップショットを組み立てる
///
/// 在庫はサニタイズ（空ならデフォルトセット）、日報はデフォルトの上に
/// 上書き、写真は読めなければNone。
fn snapshot_from_payload(payload: &Value) -> StateSnapshot {
    let inventory = sanitizer::sanitize_inventory(payload.get("inventory").unwrap_or(&Value::Null));
    let report = payload
        .get("report")
        .and_then(|raw| serde_json::from_value::<ReportDraft>(raw.clone()).ok())
        .unwrap_or_default();
    let photo = payload
        .get("photo")
        .and_then(|raw| serde_json::from_value::<Option<PhotoAttachment>>(raw.clone()).ok())
        .flatten();
    StateSnapshot {
        inventory,
        report,
        photo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_payload_sanitizes() {
        let payload = json!({
            "inventory": [{"name": "タコ（1袋）", "ideal": "2", "current": -1}],
            "report": {"sales": 98000},
            "photo": null,
        });
        let snapshot = snapshot_from_payload(&payload);
        assert_eq!(snapshot.inventory.len(), 1);
        assert_eq!(snapshot.inventory[0].ideal, 2.0);
        assert_eq!(snapshot.inventory[0].current, 0.0);
        assert_eq!(snapshot.report.sales, "98000");
        assert!(snapshot.photo.is_none());
    }

    #[test]
    fn test_snapshot_from_empty_payload_falls_back_to_defaults() {
        let snapshot = snapshot_from_payload(&json!({}));
        assert!(!snapshot.inventory.is_empty());
        assert_eq!(snapshot.report, ReportDraft::default());
    }
}
