use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use zaiko_sync::{cli, config, engine, error, remote, store, types};

use cli::{Cli, Commands};
use config::Config;
use engine::{ItemPatch, ReportField, SyncEngine};
use error::Result;
use remote::{RemoteStateClient, RemoteStore};
use store::LocalSnapshotStore;
use types::MaterialSchedule;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;

    // Configだけはエンジンを起動せずに処理する
    match cli.command {
        Commands::Config { set_base_url } => run_config(config, set_base_url),
        command => run_engine_command(config, command).await,
    }
}

fn run_config(mut config: Config, set_base_url: Option<String>) -> Result<()> {
    if let Some(base_url) = set_base_url {
        config.set_base_url(base_url.clone())?;
        println!("✔ ベースURLを設定: {}", base_url);
    } else {
        println!("設定ファイル: {}", Config::config_path()?.display());
        println!("ベースURL: {}", config.base_url);
        println!("データ保存先: {}", config.resolve_data_dir()?.display());
        println!("デバウンス: {}ms", config.debounce_ms);
    }
    Ok(())
}

async fn run_engine_command(config: Config, command: Commands) -> Result<()> {
    let local = LocalSnapshotStore::new(config.resolve_data_dir()?);
    let client: Arc<dyn RemoteStore> = Arc::new(RemoteStateClient::new(&config.base_url));
    let debounce = Duration::from_millis(config.debounce_ms);
    let mut engine = SyncEngine::bootstrap(local, Arc::clone(&client), debounce).await;

    match command {
        Commands::Show => {
            print_inventory(&engine);
            println!("\n{}", engine.compose_report());
        }

        Commands::Set { name, ideal, current } => {
            let Some(id) = engine.find_item(&name).map(|item| item.id.clone()) else {
                return Err(error::SyncError::Config(format!("品目が見つかりません: {}", name)));
            };
            engine.update_item(&id, ItemPatch { name: None, ideal, current });
            println!("✔ 更新: {}", name);
            flush(&engine).await;
        }

        Commands::Add { name } => {
            engine.add_item(name.as_deref());
            println!("✔ 品目を追加");
            flush(&engine).await;
        }

        Commands::Remove { name } => {
            let Some(id) = engine.find_item(&name).map(|item| item.id.clone()) else {
                return Err(error::SyncError::Config(format!("品目が見つかりません: {}", name)));
            };
            engine.remove_item(&id);
            println!("✔ 削除: {}", name);
            flush(&engine).await;
        }

        Commands::Reorder { names } => {
            let mut ordered_ids = Vec::with_capacity(names.len());
            for name in &names {
                let Some(item) = engine.find_item(name) else {
                    return Err(error::SyncError::Config(format!("品目が見つかりません: {}", name)));
                };
                ordered_ids.push(item.id.clone());
            }
            if !engine.reorder(&ordered_ids) {
                return Err(error::SyncError::Config(
                    "並び替えできません: 全品目名を過不足なく指定してください".to_string(),
                ));
            }
            println!("✔ 並び替え完了");
            print_inventory(&engine);
            flush(&engine).await;
        }

        Commands::Report { loss, set_count, operation_hours, sales, insights, material } => {
            let fields = [
                (ReportField::Loss, loss),
                (ReportField::SetCount, set_count),
                (ReportField::OperationHours, operation_hours),
                (ReportField::Sales, sales),
                (ReportField::Insights, insights),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    engine.set_report_field(field, value);
                }
            }
            if let Some(raw) = material {
                engine.set_material_schedule(MaterialSchedule::parse(&raw));
            }
            println!("✔ 日報を更新\n\n{}", engine.compose_report());
            flush(&engine).await;
        }

        Commands::Analyze { image } => {
            println!("📸 棚写真を解析中...");
            let bytes = std::fs::read(&image)?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "photo.jpg".to_string());

            engine.attach_photo(&bytes, &file_name, guess_mime(&image));

            // 認識はエンジンを掴まずに待ち、結果はコミット時点の状態へマージする
            let outcome = client
                .analyze_image(bytes, &file_name, &config.instructions)
                .await?;
            engine.apply_recognition(&outcome.inventory);

            println!("✔ 解析完了 ({}観測)", outcome.inventory.len());
            if let Some(notes) = outcome.notes {
                println!("メモ: {}", notes);
            }
            print_inventory(&engine);
            flush(&engine).await;
        }

        // mainで振り分け済み
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default_level = if verbose { "zaiko_sync=debug" } else { "zaiko_sync=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_inventory(engine: &SyncEngine) {
    println!("在庫 ({}品目):", engine.snapshot().inventory.len());
    for item in &engine.snapshot().inventory {
        let shortage = item.shortage();
        let mark = if shortage > 0 {
            format!("不足{}", shortage)
        } else {
            "OK".to_string()
        };
        println!("  {:<20} 理想{:>5} 現在{:>5}  {}", item.name, item.ideal, item.current, mark);
    }
}

/// プロセス終了前にデバウンスを待たず送信する（失敗はログのみ）
async fn flush(engine: &SyncEngine) {
    if let Err(e) = engine.flush().await {
        tracing::warn!("リモート同期に失敗: {}", e);
    }
}

fn guess_mime(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
