//! Lossless line model for Hyprland-style configuration files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntactic classification of a single configuration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Empty,
    Comment,
    Variable,
    KeyValue,
    SectionStart,
    SectionEnd,
    Unknown,
}

/// A single line of a configuration file. The raw text is always retained;
/// key/value are a parsed view, never a replacement for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigLine {
    pub number: usize,
    pub raw: String,
    pub kind: LineKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Parsed configuration: an ordered sequence of classified lines.
///
/// Invariant: `Ir::parse(text).to_text() == text` for any input. The original
/// trailing-newline state is recorded so serialization is byte-exact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ir {
    pub lines: Vec<ConfigLine>,
    trailing_newline: bool,
}

impl Ir {
    /// Parse configuration text with a single forward scan.
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let mut segments: Vec<&str> = text.split('\n').collect();
        if trailing_newline {
            segments.pop();
        }
        if text.is_empty() {
            segments.clear();
        }

        let lines = segments
            .into_iter()
            .enumerate()
            .map(|(i, raw)| classify(i + 1, raw))
            .collect();

        Self {
            lines,
            trailing_newline,
        }
    }

    /// Serialize back to text, byte-for-byte identical to the parsed source
    /// when the line sequence is unmodified.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&line.raw);
            if i + 1 < self.lines.len() || self.trailing_newline {
                out.push('\n');
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Ir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn classify(number: usize, raw: &str) -> ConfigLine {
    let trimmed = raw.trim();

    let mut line = ConfigLine {
        number,
        raw: raw.to_string(),
        kind: LineKind::Unknown,
        key: None,
        value: None,
    };

    if trimmed.is_empty() {
        line.kind = LineKind::Empty;
    } else if trimmed.starts_with('#') {
        line.kind = LineKind::Comment;
    } else if trimmed.starts_with('$') {
        line.kind = LineKind::Variable;
        if let Some((key, value)) = trimmed.split_once('=') {
            line.key = Some(key.trim().to_string());
            line.value = Some(value.trim().to_string());
        }
    } else if trimmed.ends_with('{') {
        line.kind = LineKind::SectionStart;
        line.key = Some(trimmed.trim_end_matches('{').trim().to_string());
    } else if trimmed == "}" {
        line.kind = LineKind::SectionEnd;
    } else if trimmed.contains('=') {
        line.kind = LineKind::KeyValue;
        if let Some((key, value)) = trimmed.split_once('=') {
            line.key = Some(key.trim().to_string());
            line.value = Some(value.trim().to_string());
        }
    }
    // Anything else (bare exec lines, odd bind syntax) stays Unknown with the
    // raw text preserved.

    line
}
