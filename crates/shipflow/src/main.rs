mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shipflow")]
#[command(version, about = "AppHost の構成をそのまま PaaS へ。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// AppHost ソースを解析してモデルを表示
    Parse {
        /// AppHost ソースファイル
        file: PathBuf,
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// デプロイ用のシェルスクリプトを生成
    Generate {
        /// AppHost ソースファイル
        file: PathBuf,
        /// 出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// プロジェクト ID（省略時はスクリプト実行時の環境変数）
        #[arg(long, env = "SHIPFLOW_PROJECT_ID")]
        project_id: Option<String>,
        /// 環境 ID
        #[arg(long, env = "SHIPFLOW_ENVIRONMENT_ID")]
        environment_id: Option<String>,
        /// サーバー ID
        #[arg(long, env = "SHIPFLOW_SERVER_ID")]
        server_id: Option<String>,
        /// スクリプトにコメントを含めない
        #[arg(long)]
        no_comments: bool,
        /// 作成と同時にデプロイする
        #[arg(long)]
        instant: bool,
    },
    /// リモート PaaS にリソースを作成
    Deploy {
        /// AppHost ソースファイル
        file: PathBuf,
        /// リモートを呼ばずに結果だけ表示
        #[arg(long)]
        dry_run: bool,
        /// 既存リソースをスキップ
        #[arg(long)]
        skip_existing: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr へ（stdout はスクリプト/JSON 出力に使う）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ok = match cli.command {
        Commands::Parse { file, json } => commands::parse::handle(&file, json)?,
        Commands::Generate {
            file,
            output,
            project_id,
            environment_id,
            server_id,
            no_comments,
            instant,
        } => {
            let options = shipflow_cloud::GenerateOptions {
                project_id,
                environment_id,
                server_id,
                include_comments: !no_comments,
                instant_deploy: instant,
            };
            commands::generate::handle(&file, output.as_deref(), options)?
        }
        Commands::Deploy {
            file,
            dry_run,
            skip_existing,
        } => commands::deploy::handle(&file, dry_run, skip_existing).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
