//! 認識結果マージモジュール
//!
//! 認識APIの観測値列を現在の在庫に畳み込む。名前の完全一致
//! （大文字小文字区別、曖昧照合なし）で既存品目を探し、見つかれば
//! 理想・現在庫だけを上書きしてIDと名前を保つ。見つからなければ
//! 新規IDで末尾に追加する。観測に現れない品目には触れない。

use crate::remote::RecognitionObservation;
use crate::types::{generate_item_id, InventoryItem};

/// 観測値列を在庫に畳み込んだ新しい列を返す
///
/// 相対順序は保存される。フィールド単位の競合検出はなく、
/// 後からコミットした側が丸ごと勝つ。
pub fn merge_observations(
    inventory: &[InventoryItem],
    observations: &[RecognitionObservation],
) -> Vec<InventoryItem> {
    let mut merged = inventory.to_vec();
    for obs in observations {
        match merged.iter_mut().find(|item| item.name == obs.name) {
            Some(item) => {
                item.ideal = obs.ideal;
                item.current = obs.current;
            }
            None => merged.push(InventoryItem {
                id: generate_item_id(),
                name: obs.name.clone(),
                ideal: obs.ideal,
                current: obs.current,
            }),
        }
    }
    merged
}
