use std::sync::Arc;
use std::time::Instant;

use crate::domain::error::AppError;
use crate::domain::types::{RewriteRequest, RuntimeMessage, TriggerSource};
use crate::infra::messaging::RuntimeClient;
use crate::infra::metrics::Metrics;
use crate::infra::output::{Notifier, OutputTarget};
use crate::infra::page::Platform;

use super::cycle_tracker::CycleTracker;

/// 配信完了時のトースト文言
pub fn success_message(platform: Platform) -> String {
    format!("✨ Prompt optimized — Press {} to replace", platform.paste_hint())
}

/// 最適化元の入力欄
///
/// 配信直前にフォーカスして全選択し、貼り付けで下書きを置き換えられるようにする。
pub trait SourceEditor: Send + Sync {
    fn select_for_replace(&self);
}

/// 1 サイクルの結果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// クリップボードに書き込み、通知した
    Delivered(String),
    /// background がエラーを返した
    Rejected(String),
    /// メッセージ配信または出力に失敗した
    Failed(AppError),
    /// 後続のトリガーがあったため破棄した
    Superseded,
    /// 入力テキストが見つからなかった
    NoInput,
}

/// ページ側のリライトサイクル
///
/// 抽出済みテキストを background に送り、成功時のみ出力先へ書き込んで通知する。
/// 失敗はログに残すだけでユーザーには通知しない。
pub struct RewriteCycle {
    client: RuntimeClient,
    output: Arc<dyn OutputTarget>,
    notifier: Arc<dyn Notifier>,
    tracker: CycleTracker,
    metrics: Arc<Metrics>,
    success_message: String,
}

impl RewriteCycle {
    pub fn new(
        client: RuntimeClient,
        output: Arc<dyn OutputTarget>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
        platform: Platform,
    ) -> Self {
        Self {
            client,
            output,
            notifier,
            tracker: CycleTracker::new(),
            metrics,
            success_message: success_message(platform),
        }
    }

    pub fn tracker(&self) -> &CycleTracker {
        &self.tracker
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub async fn run(&self, source: TriggerSource, raw_text: Option<String>) -> CycleOutcome {
        self.run_with_editor(source, raw_text, None).await
    }

    /// 抽出元の入力欄があれば、クリップボードへ書き込む前に全選択する
    pub async fn run_with_editor(
        &self,
        source: TriggerSource,
        raw_text: Option<String>,
        editor: Option<Box<dyn SourceEditor>>,
    ) -> CycleOutcome {
        self.tracker.cleanup_finished();
        self.metrics.inc_cycles_triggered();

        let Some(request) = raw_text.and_then(RewriteRequest::new) else {
            let cycle_id = self.tracker.record_no_input(source);
            self.metrics.inc_cycles_without_input();
            log::debug!("cycle {cycle_id}: 最適化するテキストがありません");
            return CycleOutcome::NoInput;
        };

        let cycle_id = self.tracker.begin(source);
        log::info!(
            "cycle {cycle_id} 開始 ({source:?}): {} 文字",
            request.raw_text.chars().count()
        );
        self.execute(cycle_id, request, editor).await
    }

    async fn execute(
        &self,
        cycle_id: u64,
        request: RewriteRequest,
        editor: Option<Box<dyn SourceEditor>>,
    ) -> CycleOutcome {
        let started = Instant::now();
        let message = RuntimeMessage::OptimizePrompt {
            prompt: request.raw_text,
        };

        let response = match self.client.send(message).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("cycle {cycle_id}: background への送信失敗: {e}");
                self.metrics.inc_error(e.code());
                self.tracker.mark_failed(cycle_id, e.to_string());
                return CycleOutcome::Failed(AppError::delivery(e.to_string()));
            }
        };

        let text = match response.into_result() {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                let message = "No optimized prompt received from background".to_string();
                log::error!("cycle {cycle_id}: {message}");
                self.tracker.mark_failed(cycle_id, message.clone());
                return CycleOutcome::Rejected(message);
            }
            Err(message) => {
                log::error!("cycle {cycle_id}: background エラー: {message}");
                self.tracker.mark_failed(cycle_id, message.clone());
                return CycleOutcome::Rejected(message);
            }
        };

        if !self.tracker.is_latest(cycle_id) {
            log::info!("cycle {cycle_id}: 後続のトリガーがあるため結果を破棄");
            self.tracker.mark_superseded(cycle_id);
            self.metrics.inc_cycles_superseded();
            return CycleOutcome::Superseded;
        }

        if let Some(editor) = &editor {
            editor.select_for_replace();
        }
        if let Err(e) = self.output.deliver(&text) {
            log::error!("cycle {cycle_id}: {} への出力失敗: {e}", self.output.name());
            self.metrics.inc_error(e.code);
            self.tracker.mark_failed(cycle_id, e.message.clone());
            return CycleOutcome::Failed(e);
        }

        self.notifier.notify(&self.success_message);
        self.metrics
            .record_latency("deliver", started.elapsed().as_millis() as u64);
        self.metrics.inc_cycles_delivered();
        self.tracker.mark_delivered(cycle_id);
        log::info!("cycle {cycle_id}: 配信完了");
        CycleOutcome::Delivered(text)
    }
}
