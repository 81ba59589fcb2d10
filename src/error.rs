use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("通信エラー: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("サーバ応答エラー ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("レスポンス形式が不正: {0}")]
    Parse(String),

    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ローカル保存エラー: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
