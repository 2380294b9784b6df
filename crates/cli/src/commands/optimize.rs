use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use po_core::domain::types::TriggerSource;
use po_core::infra::messaging;
use po_core::infra::metrics::Metrics;
use po_core::infra::output::{ClipboardOutput, MemoryClipboard, Notifier, OutputTarget};
use po_core::infra::page::Platform;
use po_core::infra::rewriter::{NoopRewriter, ProviderConfig, ProviderRouter, Rewriter};
use po_core::usecase::background::BackgroundService;
use po_core::usecase::rewrite_cycle::{CycleOutcome, RewriteCycle};

use super::open_store;
use crate::Cli;

#[derive(clap::Args)]
pub struct OptimizeArgs {
    /// 最適化するテキスト（省略時は標準入力）
    pub text: Option<String>,

    /// プロバイダーを呼ばずに入力をそのまま返す
    #[arg(long)]
    pub dry_run: bool,

    /// クリップボードに書き込まない
    #[arg(long)]
    pub no_clipboard: bool,

    /// HTTP タイムアウト（秒）。省略時はタイムアウトなし
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// トーストの代わりに stderr へ出す
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

pub async fn run(cli: &Cli, args: &OptimizeArgs) -> Result<()> {
    let text = match &args.text {
        Some(text) => text.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf
        }
    };

    let rewriter: Arc<dyn Rewriter> = if args.dry_run {
        Arc::new(NoopRewriter)
    } else {
        let store = Arc::new(open_store(cli)?);
        let config = ProviderConfig {
            timeout: args.timeout.map(Duration::from_secs),
            ..Default::default()
        };
        Arc::new(ProviderRouter::new(store, config)?)
    };

    let output: Arc<dyn OutputTarget> = if args.no_clipboard {
        Arc::new(MemoryClipboard::new())
    } else {
        Arc::new(ClipboardOutput::new())
    };

    let metrics = Arc::new(Metrics::new());
    let (client, listener) = messaging::channel();
    let background = Arc::new(BackgroundService::new(rewriter, metrics.clone()));
    let server = background.spawn(listener);

    let cycle = RewriteCycle::new(
        client,
        output,
        Arc::new(StderrNotifier),
        metrics.clone(),
        Platform::current(),
    );
    let outcome = cycle.run(TriggerSource::Cli, Some(text)).await;

    // クライアントを閉じるとリスナーが終了する
    drop(cycle);
    server.await?;

    if cli.verbose {
        eprintln!("{}", serde_json::to_string_pretty(&metrics.summary())?);
    }

    match outcome {
        CycleOutcome::Delivered(text) => {
            println!("{text}");
            Ok(())
        }
        CycleOutcome::NoInput => bail!("nothing to optimize: the prompt is empty"),
        CycleOutcome::Rejected(message) => bail!(message),
        CycleOutcome::Failed(e) => Err(e.into()),
        CycleOutcome::Superseded => bail!("result was superseded by a newer request"),
    }
}
