use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zaiko-sync")]
#[command(about = "たこ焼き屋 在庫・日報 同期エンジン", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 現在の状態と日報メッセージを表示
    Show,

    /// 品目の個数を更新（名前で指定）
    Set {
        /// 品目名（完全一致）
        #[arg(required = true)]
        name: String,

        /// 理想在庫
        #[arg(long)]
        ideal: Option<f64>,

        /// 現在庫
        #[arg(long)]
        current: Option<f64>,
    },

    /// 品目を追加
    Add {
        /// 品目名
        name: Option<String>,
    },

    /// 品目を削除（名前で指定）
    Remove {
        #[arg(required = true)]
        name: String,
    },

    /// 品目を並び替え（全品目名を新しい順序で列挙）
    Reorder {
        /// 新しい順序の品目名（現在の全品目を過不足なく含むこと）
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },

    /// 日報フィールドを更新
    Report {
        /// ロス数
        #[arg(long)]
        loss: Option<String>,

        /// セット数
        #[arg(long)]
        set_count: Option<String>,

        /// 稼働時間
        #[arg(long)]
        operation_hours: Option<String>,

        /// 売上
        #[arg(long)]
        sales: Option<String>,

        /// 気づき
        #[arg(long)]
        insights: Option<String>,

        /// 材料受け取り予定（YYYY-MM-DDTHH:MM、空文字で解除）
        #[arg(long)]
        material: Option<String>,
    },

    /// 棚写真を解析して在庫へマージ
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,
    },

    /// 設定の表示・変更
    Config {
        /// バックエンドのベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,
    },
}
