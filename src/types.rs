//! 状態スナップショットの型定義
//!
//! ローカル保存・リモート同期で共有されるワイヤ形式:
//! - InventoryItem: 在庫1品目
//! - ReportDraft: 日報の下書き（数値項目はテキストのまま保持）
//! - PhotoAttachment: 棚写真（data URL形式）
//! - StateSnapshot: 上記3レコードをまとめた全体状態

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 在庫1品目
///
/// `id` は編集をまたいで安定な一意キー。並び順そのものに意味がある
/// （表示順・日報メッセージの出力順）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub ideal: f64,
    pub current: f64,
}

impl Default for InventoryItem {
    fn default() -> Self {
        Self {
            id: generate_item_id(),
            name: String::new(),
            ideal: 0.0,
            current: 0.0,
        }
    }
}

impl InventoryItem {
    /// 不足数 = ceil(max(0, 理想 - 現在庫))
    pub fn shortage(&self) -> u32 {
        (self.ideal - self.current).max(0.0).ceil() as u32
    }
}

/// 品目IDを生成（バックエンドと同じ `item-` 接頭辞つきUUID）
pub fn generate_item_id() -> String {
    format!("item-{}", uuid::Uuid::new_v4())
}

/// 日報の下書き
///
/// 数値項目は入力テキストをそのまま保持する（数値でないテキストも捨てない）。
/// 材料受け取り日時のみ型付きのOptionで持ち、ワイヤ上は
/// `"YYYY-MM-DDTHH:MM"` または `""` にエンコードする。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    #[serde(deserialize_with = "loose_text")]
    pub loss: String,
    #[serde(deserialize_with = "loose_text")]
    pub set_count: String,
    #[serde(deserialize_with = "loose_text")]
    pub operation_hours: String,
    #[serde(deserialize_with = "loose_text")]
    pub sales: String,
    #[serde(deserialize_with = "loose_text")]
    pub insights: String,
    #[serde(with = "material_schedule_serde")]
    pub material_received_at: Option<MaterialSchedule>,
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self {
            loss: "0".into(),
            set_count: "0".into(),
            operation_hours: "0".into(),
            sales: "0".into(),
            insights: String::new(),
            material_received_at: None,
        }
    }
}

/// 文字列・数値のどちらで来てもテキストとして受ける
fn loose_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// 材料受け取り予定（日付と時刻の組、未設定なら全体がNone）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSchedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl MaterialSchedule {
    /// `"YYYY-MM-DDTHH:MM[:SS]"` 形式をパース。形式外はNone
    pub fn parse(raw: &str) -> Option<Self> {
        let (date_part, time_part) = raw.split_once('T')?;
        let time_part = time_part.get(..5)?;
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(time_part, "%H:%M").ok()?;
        Some(Self { date, time })
    }

    /// ワイヤ形式 `"YYYY-MM-DDTHH:MM"` に変換
    pub fn to_combined(&self) -> String {
        format!("{}T{}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}

mod material_schedule_serde {
    use super::MaterialSchedule;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(
        value: &Option<MaterialSchedule>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(schedule) => serializer.serialize_str(&schedule.to_combined()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Option<MaterialSchedule>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => MaterialSchedule::parse(&s),
            _ => None,
        })
    }
}

/// 棚写真（端末で選択した画像をdata URL化したもの）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoAttachment {
    pub data_url: String,
    pub name: String,
    /// 更新時刻（エポックミリ秒）
    pub updated_at: i64,
}

impl Default for PhotoAttachment {
    fn default() -> Self {
        Self {
            data_url: String::new(),
            name: String::new(),
            updated_at: 0,
        }
    }
}

impl PhotoAttachment {
    /// 画像バイト列からdata URL形式の添付を組み立てる
    pub fn from_bytes(bytes: &[u8], file_name: &str, mime: &str) -> Self {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data_url: format!("data:{};base64,{}", mime, encoded),
            name: file_name.to_string(),
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

/// 全体状態（在庫 + 日報 + 写真）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    pub inventory: Vec<InventoryItem>,
    pub report: ReportDraft,
    pub photo: Option<PhotoAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortage_basic() {
        let item = InventoryItem {
            ideal: 2.0,
            current: 1.0,
            ..Default::default()
        };
        assert_eq!(item.shortage(), 1);
    }

    #[test]
    fn test_shortage_rounds_up() {
        let item = InventoryItem {
            ideal: 3.0,
            current: 1.5,
            ..Default::default()
        };
        assert_eq!(item.shortage(), 2);
    }

    #[test]
    fn test_shortage_zero_iff_current_covers_ideal() {
        let covered = InventoryItem {
            ideal: 2.0,
            current: 2.0,
            ..Default::default()
        };
        assert_eq!(covered.shortage(), 0);

        let surplus = InventoryItem {
            ideal: 2.0,
            current: 5.0,
            ..Default::default()
        };
        assert_eq!(surplus.shortage(), 0);
    }

    #[test]
    fn test_report_draft_wire_keys() {
        let report = ReportDraft {
            set_count: "12".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&report).expect("シリアライズ失敗");
        assert!(json.contains("\"setCount\":\"12\""));
        assert!(json.contains("\"operationHours\":\"0\""));
        assert!(json.contains("\"materialReceivedAt\":\"\""));
    }

    #[test]
    fn test_report_draft_partial_deserialize() {
        let json = r#"{"loss": "3", "sales": 15000}"#;
        let report: ReportDraft = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(report.loss, "3");
        assert_eq!(report.sales, "15000"); // 数値でもテキストとして受ける
        assert_eq!(report.set_count, "0"); // デフォルト値
        assert!(report.material_received_at.is_none());
    }

    #[test]
    fn test_material_schedule_roundtrip() {
        let schedule = MaterialSchedule::parse("2025-03-01T09:30").expect("パース失敗");
        assert_eq!(schedule.to_combined(), "2025-03-01T09:30");

        // 秒付きは先頭5文字だけ見る
        let with_seconds = MaterialSchedule::parse("2025-03-01T09:30:00").expect("パース失敗");
        assert_eq!(with_seconds, schedule);
    }

    #[test]
    fn test_material_schedule_rejects_malformed() {
        assert!(MaterialSchedule::parse("").is_none());
        assert!(MaterialSchedule::parse("2025-03-01").is_none());
        assert!(MaterialSchedule::parse("2025/03/01T09:30").is_none());
        assert!(MaterialSchedule::parse("2025-03-01Tああ").is_none());
    }

    #[test]
    fn test_photo_attachment_from_bytes() {
        let photo = PhotoAttachment::from_bytes(b"hello", "tana.jpg", "image/jpeg");
        assert_eq!(photo.data_url, "data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(photo.name, "tana.jpg");
        assert!(photo.updated_at > 0);
    }

    #[test]
    fn test_snapshot_tolerates_unknown_fields() {
        // リモートは updated_at を付けて返すが、無視して読める
        let json = r#"{"inventory": [], "report": {}, "photo": null, "updated_at": "2025-01-01T00:00:00"}"#;
        let snapshot: StateSnapshot = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert!(snapshot.inventory.is_empty());
        assert!(snapshot.photo.is_none());
    }
}
