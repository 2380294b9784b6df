//! ホストページの要素を探すための CSS セレクタのサブセット。
//!
//! 対応するのは `tag`、`[attr]`、`[attr="v"]`、`[attr*="v"]`、`[attr^="v"]` の組み合わせのみ。

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unterminated attribute condition in `{0}`")]
    Unterminated(String),
    #[error("invalid attribute condition `{0}`")]
    InvalidCondition(String),
    #[error("unexpected character `{1}` in `{0}`")]
    UnexpectedChar(String, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    StartsWith(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrCondition {
    pub name: String,
    pub op: AttrOp,
}

impl AttrCondition {
    fn matches(&self, value: Option<&str>) -> bool {
        match (&self.op, value) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals(v), Some(actual)) => actual == v,
            (AttrOp::Contains(v), Some(actual)) => actual.contains(v.as_str()),
            (AttrOp::StartsWith(v), Some(actual)) => actual.starts_with(v.as_str()),
        }
    }
}

/// 単一の複合セレクタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    conditions: Vec<AttrCondition>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        source.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// タグ名と属性取得関数で要素を判定する
    pub fn matches<'a>(&self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.matches(attr(c.name.as_str())))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }

        let tag_end = source.find('[').unwrap_or(source.len());
        let tag = &source[..tag_end];
        if let Some(bad) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '*'))
        {
            return Err(SelectorError::UnexpectedChar(source.to_string(), bad));
        }

        let mut conditions = Vec::new();
        let mut rest = &source[tag_end..];
        while !rest.is_empty() {
            let Some(body) = rest.strip_prefix('[') else {
                let c = rest.chars().next().unwrap_or(' ');
                return Err(SelectorError::UnexpectedChar(source.to_string(), c));
            };
            let close = find_closing_bracket(body)
                .ok_or_else(|| SelectorError::Unterminated(source.to_string()))?;
            conditions.push(parse_condition(&body[..close])?);
            rest = &body[close + 1..];
        }

        Ok(Self {
            source: source.to_string(),
            tag: match tag {
                "" | "*" => None,
                t => Some(t.to_ascii_lowercase()),
            },
            conditions,
        })
    }
}

/// 引用符内の `]` は無視して閉じ括弧を探す
fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn parse_condition(raw: &str) -> Result<AttrCondition, SelectorError> {
    let invalid = || SelectorError::InvalidCondition(raw.to_string());

    let Some(eq) = raw.find('=') else {
        let name = raw.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        return Ok(AttrCondition {
            name: name.to_string(),
            op: AttrOp::Exists,
        });
    };

    let (lhs, value) = (&raw[..eq], unquote(raw[eq + 1..].trim()).ok_or_else(invalid)?);
    let (name, op) = if let Some(name) = lhs.strip_suffix('*') {
        (name, AttrOp::Contains(value))
    } else if let Some(name) = lhs.strip_suffix('^') {
        (name, AttrOp::StartsWith(value))
    } else {
        (lhs, AttrOp::Equals(value))
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok(AttrCondition {
        name: name.to_string(),
        op,
    })
}

fn unquote(v: &str) -> Option<String> {
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q) {
            return inner.strip_suffix(q).map(str::to_string);
        }
    }
    if v.is_empty() || v.contains(char::is_whitespace) {
        return None;
    }
    Some(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn matches(sel: &str, tag: &str, attrs: &[(&str, &str)]) -> bool {
        let map: HashMap<&str, &str> = attrs.iter().copied().collect();
        Selector::parse(sel)
            .unwrap()
            .matches(tag, |name| map.get(name).copied())
    }

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse(r#"div[contenteditable="true"][aria-label*="Message"]"#).unwrap();
        assert_eq!(sel.tag.as_deref(), Some("div"));
        assert_eq!(sel.conditions.len(), 2);
        assert_eq!(sel.conditions[1].op, AttrOp::Contains("Message".into()));
    }

    #[test]
    fn test_match_equals_and_contains() {
        let sel = r#"div[contenteditable="true"][aria-label*="Message"]"#;
        assert!(matches(sel, "DIV", &[("contenteditable", "true"), ("aria-label", "Message ChatGPT")]));
        assert!(!matches(sel, "div", &[("contenteditable", "false"), ("aria-label", "Message")]));
        assert!(!matches(sel, "span", &[("contenteditable", "true"), ("aria-label", "Message")]));
        assert!(!matches(sel, "div", &[("contenteditable", "true")]));
    }

    #[test]
    fn test_attribute_only_selector() {
        assert!(matches(r#"[contenteditable="true"]"#, "p", &[("contenteditable", "true")]));
        assert!(matches("[data-id]", "div", &[("data-id", "")]));
        assert!(matches("form", "form", &[]));
        assert!(matches(r#"div[class^='input']"#, "div", &[("class", "input-wrapper")]));
    }

    #[test]
    fn test_quoted_bracket() {
        let sel = Selector::parse(r#"div[aria-label="a]b"]"#).unwrap();
        assert_eq!(sel.conditions[0].op, AttrOp::Equals("a]b".into()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse(r#"div[role="textbox""#),
            Err(SelectorError::Unterminated(_))
        ));
        assert!(matches!(
            Selector::parse("div[=x]"),
            Err(SelectorError::InvalidCondition(_))
        ));
        assert!(matches!(
            Selector::parse("div.composer"),
            Err(SelectorError::UnexpectedChar(_, '.'))
        ));
        assert!(matches!(
            Selector::parse("div[role]x"),
            Err(SelectorError::UnexpectedChar(_, 'x'))
        ));
    }
}
