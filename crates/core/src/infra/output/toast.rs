use std::time::Duration;

use super::Notifier;
use crate::infra::page::{PageDom, SharedDom};

/// ページ内トーストの要素 ID
pub const TOAST_ID: &str = "prompt-optimizer-toast";

const TOAST_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("bottom", "24px"),
    ("left", "50%"),
    ("transform", "translateX(-50%)"),
    ("background", "#111"),
    ("color", "#fff"),
    ("padding", "14px 22px"),
    ("border-radius", "12px"),
    ("font-size", "15px"),
    ("font-weight", "500"),
    ("box-shadow", "0 10px 30px rgba(0,0,0,0.25)"),
    ("z-index", "9999"),
    ("transition", "opacity 0.2s ease"),
    ("pointer-events", "none"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastConfig {
    /// 表示時間
    pub visible_for: Duration,
    /// フェードアウト後に要素を削除するまでの時間
    pub fade_out: Duration,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            visible_for: Duration::from_secs(5),
            fade_out: Duration::from_millis(200),
        }
    }
}

/// ページに描画するトースト
///
/// 新しいトーストは既存のものを置き換える。自動で閉じるタイマーは
/// 呼び出し元の tokio ランタイム上で動く。
pub struct DomToast<D: PageDom> {
    dom: SharedDom<D>,
    config: ToastConfig,
}

impl<D: PageDom> DomToast<D> {
    pub fn new(dom: SharedDom<D>, config: ToastConfig) -> Self {
        Self { dom, config }
    }
}

impl<D: PageDom> Notifier for DomToast<D> {
    fn notify(&self, message: &str) {
        let toast = {
            let mut dom = self.dom.lock();
            if let Some(existing) = dom.get_element_by_id(TOAST_ID) {
                dom.remove(existing);
            }

            let toast = dom.create_element("div");
            dom.set_attribute(toast, "id", TOAST_ID);
            dom.set_text(toast, message);
            for (property, value) in TOAST_STYLE {
                dom.set_style(toast, property, value);
            }
            dom.set_style(toast, "opacity", "0");
            let body = dom.body();
            dom.append_child(body, toast);
            dom.set_style(toast, "opacity", "1");
            toast
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::warn!("tokio ランタイム外のためトーストは自動で閉じません");
            return;
        };

        let dom = self.dom.clone();
        let ToastConfig {
            visible_for,
            fade_out,
        } = self.config;
        handle.spawn(async move {
            tokio::time::sleep(visible_for).await;
            dom.lock().set_style(toast, "opacity", "0");
            tokio::time::sleep(fade_out).await;
            let mut dom = dom.lock();
            if dom.parent(toast).is_some() {
                dom.remove(toast);
            }
        });
    }
}

/// ページを持たないホスト向け: ログに出すだけ
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{message}");
    }
}
