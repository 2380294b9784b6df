use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::domain::types::TriggerSource;
use crate::infra::page::{
    KeyEvent, MutationReceiver, NodeId, PageDom, Platform, Selector, SelectorError, SharedDom,
    Shortcut, ShortcutError,
};

use super::rewrite_cycle::{CycleOutcome, RewriteCycle, SourceEditor};

/// 挿入するボタンの要素 ID
pub const CONTROL_ID: &str = "prompt-optimize-btn";
/// 挿入するボタンの目印属性
pub const CONTROL_MARKER: &str = "data-prompt-optimizer";

const CONTROL_STYLE: &[(&str, &str)] = &[
    ("padding", "8px 16px"),
    ("margin", "8px"),
    ("background-color", "#10a37f"),
    ("color", "white"),
    ("border", "none"),
    ("border-radius", "6px"),
    ("cursor", "pointer"),
    ("font-size", "14px"),
    ("font-weight", "500"),
];

/// ページ統合の設定
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// 入力欄の候補（先にマッチしたものを採用）
    pub input_selectors: Vec<String>,
    /// テキスト抽出時に走査する編集可能要素
    pub editable_selector: String,
    /// ボタンを置くコンテナの候補（見つからなければ入力欄の親）
    pub container_selectors: Vec<String>,
    /// DOM 変更通知をまとめる時間
    pub debounce: Duration,
    pub shortcut: String,
    pub platform: Platform,
    pub control_label: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            input_selectors: vec![
                r#"div[contenteditable="true"][data-id="root"]"#.to_string(),
                r#"div[contenteditable="true"][role="textbox"]"#.to_string(),
                r#"div[contenteditable="true"][aria-label*="Message"]"#.to_string(),
                r#"div[contenteditable="true"][tabindex="0"]"#.to_string(),
            ],
            editable_selector: r#"[contenteditable="true"]"#.to_string(),
            container_selectors: vec!["form".to_string(), r#"div[class*="input"]"#.to_string()],
            debounce: Duration::from_millis(50),
            shortcut: "CmdOrCtrl+Shift+O".to_string(),
            platform: Platform::current(),
            control_label: "Optimize".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageConfigError {
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("invalid shortcut: {0}")]
    Shortcut(#[from] ShortcutError),
}

#[derive(Debug, Default)]
struct ControllerState {
    current_input: Option<NodeId>,
    injected_control: Option<NodeId>,
    detection_passes: u64,
}

/// 1 ページ分のコントローラ
///
/// 入力欄の検出、ボタンの挿入、クリック・ショートカットからのサイクル起動を受け持つ。
/// ロックは常に state → dom の順で取る。
pub struct PageController<D: PageDom> {
    dom: SharedDom<D>,
    cycle: Arc<RewriteCycle>,
    input_selectors: Vec<Selector>,
    editable: Selector,
    containers: Vec<Selector>,
    shortcut: Shortcut,
    platform: Platform,
    debounce: Duration,
    control_label: String,
    state: Mutex<ControllerState>,
}

impl<D: PageDom> PageController<D> {
    pub fn new(
        dom: SharedDom<D>,
        cycle: Arc<RewriteCycle>,
        config: PageConfig,
    ) -> Result<Self, PageConfigError> {
        let input_selectors = config
            .input_selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let containers = config
            .container_selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dom,
            cycle,
            input_selectors,
            editable: Selector::parse(&config.editable_selector)?,
            containers,
            shortcut: config.shortcut.parse()?,
            platform: config.platform,
            debounce: config.debounce,
            control_label: config.control_label,
            state: Mutex::new(ControllerState::default()),
        })
    }

    pub fn current_input(&self) -> Option<NodeId> {
        self.state.lock().current_input
    }

    pub fn injected_control(&self) -> Option<NodeId> {
        self.state.lock().injected_control
    }

    /// これまでに走った検出パスの数
    pub fn detection_passes(&self) -> u64 {
        self.state.lock().detection_passes
    }

    /// 入力欄を探し、見つかればボタンを挿入する
    pub fn check_prompt_input(&self) -> Option<NodeId> {
        let found = {
            let mut state = self.state.lock();
            state.detection_passes += 1;

            let dom = self.dom.lock();
            let found = self
                .input_selectors
                .iter()
                .find_map(|sel| dom.query_selector(sel))?;
            if state.current_input != Some(found) {
                log::debug!("入力欄を検出: {found:?}");
                state.current_input = Some(found);
            }
            found
        };

        self.inject_control(found);
        Some(found)
    }

    /// 入力欄の近くにボタンを挿入する。挿入済みのボタンがまだ文書内にあれば何もしない。
    pub fn inject_control(&self, input: NodeId) -> Option<NodeId> {
        let mut state = self.state.lock();
        let mut dom = self.dom.lock();

        if let Some(existing) = state.injected_control {
            if dom.is_connected(existing) {
                return Some(existing);
            }
        }

        let container = self
            .containers
            .iter()
            .find_map(|sel| dom.closest(input, sel))
            .or_else(|| dom.parent(input))?;
        let Some(container_parent) = dom.parent(container) else {
            log::debug!("コンテナに親がないため挿入しない: {container:?}");
            return None;
        };

        let control = dom.create_element("button");
        dom.set_attribute(control, "id", CONTROL_ID);
        dom.set_attribute(control, CONTROL_MARKER, "true");
        dom.set_text(control, &self.control_label);
        for (property, value) in CONTROL_STYLE {
            dom.set_style(control, property, value);
        }
        let reference = dom.next_sibling(container);
        dom.insert_before(container_parent, control, reference);

        state.injected_control = Some(control);
        log::info!("Optimize ボタンを挿入: {control:?}");
        Some(control)
    }

    /// 文書順で最初に中身のある編集可能要素と、そのテキスト（前後の空白は除く）
    pub fn extract_prompt(&self) -> Option<(NodeId, String)> {
        let dom = self.dom.lock();
        dom.query_selector_all(&self.editable)
            .into_iter()
            .map(|node| (node, dom.inner_text(node).trim().to_string()))
            .find(|(_, text)| !text.is_empty())
    }

    /// クリックを処理する。挿入したボタン（またはその子孫）以外は無視する。
    pub fn on_click(&self, target: NodeId) -> Option<JoinHandle<CycleOutcome>> {
        let control = self.state.lock().injected_control?;
        if !self.dom.lock().contains(control, target) {
            return None;
        }
        log::debug!("Optimize ボタンがクリックされた");
        Some(self.trigger(TriggerSource::Button))
    }

    /// keydown を処理する。ショートカットなら既定動作を止めてサイクルを起動する。
    pub fn on_key_down(&self, event: &mut KeyEvent) -> Option<JoinHandle<CycleOutcome>> {
        if !self.shortcut.matches(event, self.platform) {
            return None;
        }
        event.prevent_default();
        log::debug!("ショートカット {} で起動", self.shortcut);
        Some(self.trigger(TriggerSource::Shortcut))
    }

    /// テキストはトリガー時点で読み取る
    fn trigger(&self, source: TriggerSource) -> JoinHandle<CycleOutcome> {
        let (text, editor) = match self.extract_prompt() {
            Some((node, text)) => {
                let editor: Box<dyn SourceEditor> = Box::new(DomEditor {
                    dom: self.dom.clone(),
                    node,
                });
                (Some(text), Some(editor))
            }
            None => (None, None),
        };
        let cycle = self.cycle.clone();
        tokio::spawn(async move { cycle.run_with_editor(source, text, editor).await })
    }
}

/// テキストを抽出した編集可能要素
struct DomEditor<D: PageDom> {
    dom: SharedDom<D>,
    node: NodeId,
}

impl<D: PageDom> SourceEditor for DomEditor<D> {
    fn select_for_replace(&self) {
        let mut dom = self.dom.lock();
        if !dom.is_connected(self.node) {
            log::debug!("入力欄が描き直されたため選択しない: {:?}", self.node);
            return;
        }
        dom.focus(self.node);
        dom.select_all(self.node);
    }
}

impl<D: PageDom> PageController<D> {
    /// 初回の検出を行い、DOM 変更の監視を開始する
    ///
    /// 連続した変更通知は `debounce` の間まとめられ、検出パスは 1 回だけ走る。
    /// ドキュメント側が購読を閉じるとタスクは終了する。
    pub fn start_observer(self: &Arc<Self>) -> JoinHandle<()> {
        let rx = self.dom.lock().observe();
        self.check_prompt_input();

        let controller = self.clone();
        tokio::spawn(async move { controller.observe_loop(rx).await })
    }

    async fn observe_loop(&self, mut rx: MutationReceiver) {
        while rx.recv().await.is_some() {
            let window = tokio::time::sleep(self.debounce);
            tokio::pin!(window);

            let mut closed = false;
            loop {
                tokio::select! {
                    _ = &mut window => break,
                    record = rx.recv() => {
                        if record.is_none() {
                            closed = true;
                            break;
                        }
                    }
                }
            }

            self.check_prompt_input();
            if closed {
                break;
            }
        }
        log::debug!("DOM 監視を終了");
    }
}
