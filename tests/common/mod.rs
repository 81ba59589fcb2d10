//! 統合テスト用のリモートストアのモック
//!
//! 取得応答をスクリプトし、送信されたスナップショットを記録する。

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use zaiko_sync::error::{Result, SyncError};
use zaiko_sync::remote::{RecognitionOutcome, RemoteStore};
use zaiko_sync::types::StateSnapshot;

pub struct MockRemote {
    /// `None` なら取得は失敗する
    fetch_payload: Option<Value>,
    /// trueなら送信も失敗する
    push_fails: bool,
    pushes: Mutex<Vec<StateSnapshot>>,
}

impl MockRemote {
    pub fn with_state(payload: Value) -> Self {
        Self {
            fetch_payload: Some(payload),
            push_fails: false,
            pushes: Mutex::new(Vec::new()),
        }
    }

    /// 取得は成功するが送信はすべて失敗するサーバー
    pub fn with_state_rejecting_pushes(payload: Value) -> Self {
        Self {
            fetch_payload: Some(payload),
            push_fails: true,
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable_server() -> Self {
        Self {
            fetch_payload: None,
            push_fails: true,
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn pushes(&self) -> Vec<StateSnapshot> {
        self.pushes.lock().expect("pushes lock").clone()
    }

    fn transport_error() -> SyncError {
        SyncError::Status {
            status: 503,
            body: "service unavailable".into(),
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn fetch_state(&self) -> Result<Value> {
        match &self.fetch_payload {
            Some(payload) => Ok(payload.clone()),
            None => Err(Self::transport_error()),
        }
    }

    async fn push_state(&self, snapshot: &StateSnapshot) -> Result<()> {
        if self.push_fails {
            return Err(Self::transport_error());
        }
        self.pushes.lock().expect("pushes lock").push(snapshot.clone());
        Ok(())
    }

    async fn analyze_image(
        &self,
        _image: Vec<u8>,
        _file_name: &str,
        _instructions: &str,
    ) -> Result<RecognitionOutcome> {
        Err(Self::transport_error())
    }
}
