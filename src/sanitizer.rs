//! 在庫レコードのサニタイズモジュール
//!
//! ローカル保存・リモート応答・認識結果など、信頼できない入力を
//! 正しい `InventoryItem` 列に正規化する。失敗は存在しない:
//! 不正な値は必ずデフォルト値への置き換えで解決する。
//!
//! 2系統の入口がある:
//! - `sanitize_inventory`: 空・非配列入力はデフォルト在庫セットに置き換える
//! - `sanitize_inventory_sparse`: 空のまま返す（「ローカル未記録」と
//!   「記録済みだが空」を起動時判定で区別するために使う）

use crate::types::{generate_item_id, InventoryItem};
use serde_json::Value;

/// デフォルト在庫の基本品目（名前, 理想在庫）。現在庫は理想と同数で初期化する
const DEFAULT_BASE_ITEMS: &[(&str, f64)] = &[
    ("サラダ油（8個入り）", 8.0),
    ("出汁セット", 3.0),
    ("タコ（1袋）", 2.0),
];

/// デフォルト在庫の追加品目（理想・現在庫とも0）
const DEFAULT_EXTRA_NAMES: &[&str] = &[
    "そーす",
    "まよ",
    "天かす",
    "ガスボンベ（◯本）",
    "かつお",
    "ふくろ",
    "粉",
    "はし",
    "タコせん",
    "油",
    "しょうゆ",
    "青のり",
    "卵",
    "長いも",
    "たこ",
    "白だし",
    "紅生姜",
    "出汁液",
];

/// デフォルト在庫セットを構築する。IDは呼び出しごとに新規生成
pub fn default_inventory() -> Vec<InventoryItem> {
    let base = DEFAULT_BASE_ITEMS.iter().map(|(name, ideal)| InventoryItem {
        id: generate_item_id(),
        name: (*name).to_string(),
        ideal: *ideal,
        current: *ideal,
    });
    let extra = DEFAULT_EXTRA_NAMES.iter().map(|name| InventoryItem {
        id: generate_item_id(),
        name: (*name).to_string(),
        ideal: 0.0,
        current: 0.0,
    });
    base.chain(extra).collect()
}

/// 信頼できない入力を在庫列に正規化する
///
/// 非配列・空配列はデフォルト在庫セットに置き換える。冪等:
/// 正規化済みの列を再度通しても等しい列が返る（IDは保存される）。
pub fn sanitize_inventory(raw: &Value) -> Vec<InventoryItem> {
    let items = sanitize_inventory_sparse(raw);
    if items.is_empty() {
        default_inventory()
    } else {
        items
    }
}

/// `sanitize_inventory` の空を返す変種
///
/// ローカルストレージの有無を起動時に見分けるためだけに使う。
pub fn sanitize_inventory_sparse(raw: &Value) -> Vec<InventoryItem> {
    match raw.as_array() {
        Some(items) => items.iter().map(sanitize_item).collect(),
        None => Vec::new(),
    }
}

/// 型付き在庫列の再検証（マージ結果のコミット前に通す）
///
/// 個数のクランプと空のデフォルト置き換えだけ行う。
pub fn sanitize_items(items: Vec<InventoryItem>) -> Vec<InventoryItem> {
    if items.is_empty() {
        return default_inventory();
    }
    items
        .into_iter()
        .map(|mut item| {
            item.ideal = clamp_count(item.ideal);
            item.current = clamp_count(item.current);
            item
        })
        .collect()
}

fn sanitize_item(raw: &Value) -> InventoryItem {
    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generate_item_id(),
    };
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    InventoryItem {
        id,
        name,
        ideal: normalize_count(raw.get("ideal")),
        current: normalize_count(raw.get("current")),
    }
}

/// 個数の強制変換: 数値・数値文字列を受け、非有限は0、0未満は0に丸める
pub fn normalize_count(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_count(parsed)
}

fn clamp_count(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
