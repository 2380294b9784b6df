//! プロンプト最適化 CLI
//!
//! ```bash
//! # 選択中のプロバイダーで最適化し、結果をクリップボードへ
//! prompt-optimizer optimize "fix my bug"
//!
//! # 標準入力から読み、ネットワークを使わずに流れだけ確認
//! echo "write tests" | prompt-optimizer optimize --dry-run
//!
//! # 設定
//! prompt-optimizer settings set-provider openai
//! prompt-optimizer settings set-key openai sk-...
//! prompt-optimizer settings show
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{optimize, providers, settings};

#[derive(Parser)]
#[command(name = "prompt-optimizer")]
#[command(about = "Rewrite rough prompts into detailed, effective ones")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 設定 DB のパス
    #[arg(long, env = "PO_DB_PATH", global = true)]
    pub db: Option<PathBuf>,

    /// デバッグログとメトリクスを表示する
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// プロンプトを 1 回最適化する
    #[command(visible_alias = "o")]
    Optimize(optimize::OptimizeArgs),

    /// プロバイダーと API キーの設定
    Settings(settings::SettingsArgs),

    /// 利用できるプロバイダーの一覧
    #[command(visible_alias = "p")]
    Providers(providers::ProvidersArgs),
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("po_core=debug,prompt_optimizer=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Optimize(args) => optimize::run(&cli, args).await,
        Commands::Settings(args) => settings::run(&cli, args),
        Commands::Providers(args) => providers::run(&cli, args),
    }
}
