use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 修飾キーの解釈に使うプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    /// `navigator.platform` の文字列から判定する
    pub fn from_navigator(platform: &str) -> Self {
        if platform.to_uppercase().contains("MAC") {
            Self::Mac
        } else {
            Self::Other
        }
    }

    #[cfg(target_os = "macos")]
    pub fn current() -> Self {
        Self::Mac
    }

    #[cfg(not(target_os = "macos"))]
    pub fn current() -> Self {
        Self::Other
    }

    /// トーストに表示する貼り付けキー
    pub fn paste_hint(&self) -> &'static str {
        match self {
            Self::Mac => "⌘V",
            Self::Other => "Ctrl+V",
        }
    }
}

/// keydown イベント
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// ホストページ側の既定動作を抑止する
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    #[error("shortcut has no key: `{0}`")]
    MissingKey(String),
    #[error("unknown modifier `{1}` in `{0}`")]
    UnknownModifier(String, String),
}

/// `CmdOrCtrl+Shift+O` 形式のショートカット
///
/// 指定された修飾キーが押されていればマッチする。余分な修飾キーは見ない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    cmd_or_ctrl: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
    alt: bool,
    key: String,
}

impl Shortcut {
    pub fn matches(&self, event: &KeyEvent, platform: Platform) -> bool {
        if self.cmd_or_ctrl {
            let pressed = match platform {
                Platform::Mac => event.meta,
                Platform::Other => event.ctrl,
            };
            if !pressed {
                return false;
            }
        }
        (!self.ctrl || event.ctrl)
            && (!self.meta || event.meta)
            && (!self.shift || event.shift)
            && (!self.alt || event.alt)
            && event.key.eq_ignore_ascii_case(&self.key)
    }
}

impl Default for Shortcut {
    fn default() -> Self {
        Self {
            cmd_or_ctrl: true,
            ctrl: false,
            meta: false,
            shift: true,
            alt: false,
            key: "o".to_string(),
        }
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut shortcut = Self {
            cmd_or_ctrl: false,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
            key: String::new(),
        };

        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(ShortcutError::MissingKey(s.to_string()));
        };
        if key.is_empty() {
            return Err(ShortcutError::MissingKey(s.to_string()));
        }

        for m in modifiers {
            match m.to_ascii_lowercase().as_str() {
                "cmdorctrl" | "commandorcontrol" => shortcut.cmd_or_ctrl = true,
                "ctrl" | "control" => shortcut.ctrl = true,
                "cmd" | "command" | "meta" | "super" => shortcut.meta = true,
                "shift" => shortcut.shift = true,
                "alt" | "option" => shortcut.alt = true,
                _ => return Err(ShortcutError::UnknownModifier(s.to_string(), m.to_string())),
            }
        }
        shortcut.key = key.to_ascii_lowercase();
        Ok(shortcut)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.cmd_or_ctrl {
            parts.push("CmdOrCtrl".to_string());
        }
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.meta {
            parts.push("Cmd".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        parts.push(self.key.to_uppercase());
        f.write_str(&parts.join("+"))
    }
}
