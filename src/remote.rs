//! リモート状態クライアント
//!
//! バックエンドの2リソースを扱う:
//! - `/state`: GETで全体状態を取得、PUTで全体状態をアップサート
//! - `/vision/analyze`: 画像＋指示文のmultipart送信で在庫認識
//!
//! テストのため `RemoteStore` トレイトを境界に置き、本番実装
//! `RemoteStateClient` はreqwestで実装する。

use crate::error::{Result, SyncError};
use crate::types::StateSnapshot;
use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use tracing::debug;

/// 認識リクエストのデフォルト指示文
pub const DEFAULT_INSTRUCTIONS: &str =
    "Detect which takoyaki ingredients are running low. Output JSON list with name, ideal, current.";

/// 認識結果の1観測値
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionObservation {
    pub name: String,
    pub ideal: f64,
    pub current: f64,
}

/// 認識リクエスト全体の結果（観測値列 + モデルの補足メモ）
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutcome {
    pub inventory: Vec<RecognitionObservation>,
    pub notes: Option<String>,
}

impl RecognitionOutcome {
    /// 認識APIの応答を検証つきで読み取る
    ///
    /// オブジェクトでない応答、`inventory` が配列でない応答は
    /// リクエスト単位のエラーとして拒否する。
    pub fn from_value(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| SyncError::Parse("認識応答がオブジェクトではありません".into()))?;
        let inventory = object
            .get("inventory")
            .and_then(Value::as_array)
            .ok_or_else(|| SyncError::Parse("認識応答の inventory が配列ではありません".into()))?
            .iter()
            .map(observation_from_value)
            .collect();
        let notes = object
            .get("notes")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self { inventory, notes })
    }
}

fn observation_from_value(raw: &Value) -> RecognitionObservation {
    RecognitionObservation {
        name: raw
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("不明")
            .to_string(),
        // 個数はJSON数値のみ採用し、それ以外は0扱い
        ideal: raw.get("ideal").and_then(Value::as_f64).unwrap_or(0.0),
        current: raw.get("current").and_then(Value::as_f64).unwrap_or(0.0),
    }
}

/// リモートストアの境界トレイト
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 全体状態を取得する。形の検証はせず、サニタイズは起動処理に委ねる
    async fn fetch_state(&self) -> Result<Value>;

    /// 全体状態をアップサートする
    async fn push_state(&self, snapshot: &StateSnapshot) -> Result<()>;

    /// 画像を認識APIに送信する
    async fn analyze_image(
        &self,
        image: Vec<u8>,
        file_name: &str,
        instructions: &str,
    ) -> Result<RecognitionOutcome>;
}

/// reqwestによる本番実装
pub struct RemoteStateClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteStateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn state_url(&self) -> String {
        format!("{}/state", self.base_url)
    }

    fn vision_url(&self) -> String {
        format!("{}/vision/analyze", self.base_url)
    }
}

/// 非成功ステータスを応答本文つきのエラーに変換する
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for RemoteStateClient {
    async fn fetch_state(&self) -> Result<Value> {
        debug!("状態を取得: {}", self.state_url());
        let response = self
            .http
            .get(self.state_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = error_for_status(response).await?;
        Ok(response.json().await?)
    }

    async fn push_state(&self, snapshot: &StateSnapshot) -> Result<()> {
        debug!("状態を送信: {}", self.state_url());
        let response = self.http.put(self.state_url()).json(snapshot).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn analyze_image(
        &self,
        image: Vec<u8>,
        file_name: &str,
        instructions: &str,
    ) -> Result<RecognitionOutcome> {
        debug!("画像を認識APIへ送信: {} ({} bytes)", file_name, image.len());
        let part = multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("instructions", instructions.to_string());
        let response = self.http.post(self.vision_url()).multipart(form).send().await?;
        let response = error_for_status(response).await?;
        let payload: Value = response.json().await?;
        RecognitionOutcome::from_value(&payload)
    }
}
