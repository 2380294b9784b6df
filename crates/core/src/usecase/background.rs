use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::domain::types::{OptimizeResponse, RuntimeMessage};
use crate::infra::messaging::RuntimeListener;
use crate::infra::metrics::Metrics;
use crate::infra::rewriter::Rewriter;

/// background コンテキスト
///
/// リクエストごとにタスクを起こして処理し、必ず 1 回だけ応答する。
/// リライタのエラーは文字列に正規化して `{error}` として返す。
pub struct BackgroundService {
    rewriter: Arc<dyn Rewriter>,
    metrics: Arc<Metrics>,
}

impl BackgroundService {
    pub fn new(rewriter: Arc<dyn Rewriter>, metrics: Arc<Metrics>) -> Self {
        Self { rewriter, metrics }
    }

    pub async fn handle(&self, message: RuntimeMessage) -> OptimizeResponse {
        match message {
            RuntimeMessage::OptimizePrompt { prompt } => {
                let started = Instant::now();
                let result = self.rewriter.rewrite(&prompt).await;
                self.metrics
                    .record_latency("rewrite", started.elapsed().as_millis() as u64);

                match result {
                    Ok(text) => {
                        self.metrics.inc_rewrites_succeeded();
                        OptimizeResponse::success(text)
                    }
                    Err(e) => {
                        log::error!("Optimization error ({}): {e}", self.rewriter.name());
                        self.metrics.inc_rewrites_failed();
                        self.metrics.inc_error(e.code());
                        OptimizeResponse::failure(e.to_string())
                    }
                }
            }
        }
    }

    /// リスナーが閉じるまでリクエストを処理する
    pub async fn serve(self: Arc<Self>, mut listener: RuntimeListener) {
        while let Some(envelope) = listener.recv().await {
            let service = self.clone();
            tokio::spawn(async move {
                let response = service.handle(envelope.message.clone()).await;
                if !envelope.reply(response) {
                    log::warn!("応答先がすでに閉じています");
                }
            });
        }
        log::debug!("background リスナー終了");
    }

    pub fn spawn(self: Arc<Self>, listener: RuntimeListener) -> JoinHandle<()> {
        tokio::spawn(self.serve(listener))
    }
}
