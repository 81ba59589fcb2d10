//! ローカルスナップショット保存モジュール
//!
//! 在庫・日報・写真の3レコードを独立したJSONファイルとして
//! データディレクトリに永続化する。読み込み失敗は「データなし」、
//! 書き込み失敗はログのみのベストエフォート扱いで、呼び出し側には
//! 決してエラーを伝播しない。

use crate::sanitizer;
use crate::types::{PhotoAttachment, ReportDraft, StateSnapshot};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::warn;

const INVENTORY_FILE: &str = "inventory.json";
const REPORT_FILE: &str = "report.json";
const PHOTO_FILE: &str = "photo.json";

/// ローカルスナップショットストア
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    dir: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 3レコードを読み込んでスナップショットを組み立てる
    ///
    /// 在庫は空を空のまま返す変種でサニタイズする（未記録との区別は
    /// 起動時判定に委ねる）。日報はデフォルト値の上に上書きマージ。
    pub fn read_snapshot(&self) -> StateSnapshot {
        let inventory = match self.read_record(INVENTORY_FILE) {
            Some(raw) => sanitizer::sanitize_inventory_sparse(&raw),
            None => Vec::new(),
        };
        let report = self
            .read_record(REPORT_FILE)
            .and_then(|raw| serde_json::from_value::<ReportDraft>(raw).ok())
            .unwrap_or_default();
        let photo = self
            .read_record(PHOTO_FILE)
            .and_then(|raw| serde_json::from_value::<Option<PhotoAttachment>>(raw).ok())
            .flatten();
        StateSnapshot {
            inventory,
            report,
            photo,
        }
    }

    /// スナップショット全体を3レコードに書き分ける（ベストエフォート）
    pub fn save_snapshot(&self, snapshot: &StateSnapshot) {
        self.write_record(INVENTORY_FILE, &snapshot.inventory);
        self.write_record(REPORT_FILE, &snapshot.report);
        match &snapshot.photo {
            Some(photo) => self.write_record(PHOTO_FILE, photo),
            None => self.remove_record(PHOTO_FILE),
        }
    }

    fn read_record(&self, file_name: &str) -> Option<Value> {
        let path = self.dir.join(file_name);
        if !path.exists() {
            return None;
        }
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("ローカルレコードを開けません {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ローカルレコードの解析に失敗 {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_record<T: Serialize>(&self, file_name: &str, value: &T) {
        if let Err(e) = self.try_write_record(file_name, value) {
            warn!("ローカルレコードの書き込みに失敗 {}: {}", file_name, e);
        }
    }

    fn try_write_record<T: Serialize>(&self, file_name: &str, value: &T) -> crate::error::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let file = File::create(self.dir.join(file_name))?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)?;
        Ok(())
    }

    fn remove_record(&self, file_name: &str) {
        let path = self.dir.join(file_name);
        if !path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("ローカルレコードの削除に失敗 {}: {}", path.display(), e);
        }
    }
}
