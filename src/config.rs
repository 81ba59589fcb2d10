use crate::error::{Result, SyncError};
use crate::pipeline::PERSIST_DEBOUNCE;
use crate::remote::DEFAULT_INSTRUCTIONS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// バックエンドのベースURL
    pub base_url: String,
    /// ローカルスナップショットの保存先（未設定ならユーザーデータディレクトリ）
    pub data_dir: Option<PathBuf>,
    /// リモート送信のデバウンス間隔（ミリ秒）
    pub debounce_ms: u64,
    /// 認識APIへ渡す指示文
    pub instructions: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            data_dir: None,
            debounce_ms: PERSIST_DEBOUNCE.as_millis() as u64,
            instructions: DEFAULT_INSTRUCTIONS.into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SyncError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("zaiko-sync").join("config.json"))
    }

    /// ローカルスナップショットの保存先を解決する
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| SyncError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("zaiko-sync"))
    }

    pub fn set_base_url(&mut self, base_url: String) -> Result<()> {
        self.base_url = base_url;
        self.save()
    }
}
