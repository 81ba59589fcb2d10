//! zaiko-sync: たこ焼き屋の在庫・日報データを、ローカル保存・リモート
//! バックエンド・画像認識の非同期結果のあいだで整合させる同期エンジン。

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod merger;
pub mod pipeline;
pub mod remote;
pub mod report;
pub mod sanitizer;
pub mod store;
pub mod types;
