//! Unified-diff generation and application.
//!
//! Generation is delegated to `similar`; application is line-based with
//! all-or-nothing semantics: a patch either applies completely or the input
//! is returned untouched.

use similar::TextDiff;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("no changes detected between original and modified content")]
    Empty,
    #[error("invalid patch format: {0}")]
    Malformed(String),
    #[error("{} out of {total} hunks failed to apply (hunks {failed:?})", .failed.len())]
    Conflict { failed: Vec<usize>, total: usize },
}

/// Create a unified diff between two texts.
///
/// Fails with [`PatchError::Empty`] when the inputs are identical.
pub fn create_patch(original: &str, modified: &str) -> Result<String, PatchError> {
    if original == modified {
        return Err(PatchError::Empty);
    }

    let diff = TextDiff::from_lines(original, modified);
    let text = diff
        .unified_diff()
        .context_radius(3)
        .header("original", "modified")
        .to_string();

    if !text.contains("@@") {
        return Err(PatchError::Empty);
    }
    Ok(text)
}

/// Strip the wrapping a language model tends to put around a patch: markdown
/// code fences, `***` decorations, standalone `---` separators and
/// conversational filler lines. Hunk bodies are left untouched.
pub fn sanitize(text: &str) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            cleaned.push(line);
            continue;
        }
        if trimmed.starts_with("***")
            || (trimmed.starts_with("---") && !line.contains("@@") && !trimmed.starts_with("--- "))
            || trimmed.starts_with("Here is")
            || trimmed.starts_with("Shall I")
        {
            continue;
        }
        cleaned.push(line);
    }

    cleaned.join("\n").trim().to_string()
}

/// One line of file content, with its terminator recorded so a file that does
/// not end in a newline survives application byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    newline: bool,
}

#[derive(Debug, Clone)]
enum HunkLine {
    Context(Line),
    Remove(Line),
    Add(Line),
}

#[derive(Debug, Clone)]
pub struct Hunk {
    old_start: usize,
    old_count: usize,
    lines: Vec<HunkLine>,
}

impl Hunk {
    fn old_block(&self) -> Vec<&Line> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                HunkLine::Context(line) | HunkLine::Remove(line) => Some(line),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    fn mark_last_no_newline(&mut self) {
        if let Some(last) = self.lines.last_mut() {
            match last {
                HunkLine::Context(line) | HunkLine::Remove(line) | HunkLine::Add(line) => {
                    line.newline = false;
                }
            }
        }
    }
}

/// A parsed unified diff.
#[derive(Debug, Clone)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Parse unified-diff text. `---`/`+++` file headers and anything before
    /// the first hunk are tolerated and ignored; a text without a single
    /// `@@` header is malformed.
    pub fn parse(text: &str) -> Result<Self, PatchError> {
        let mut hunks: Vec<Hunk> = Vec::new();
        let mut current: Option<Hunk> = None;

        for raw in text.lines() {
            if raw.starts_with("@@") {
                if let Some(hunk) = current.take() {
                    hunks.push(hunk);
                }
                current = Some(parse_hunk_header(raw)?);
                continue;
            }

            let Some(hunk) = current.as_mut() else {
                // Preamble: file headers, index lines, whatever else.
                continue;
            };

            if let Some(rest) = raw.strip_prefix(' ') {
                hunk.lines.push(HunkLine::Context(owned_line(rest)));
            } else if let Some(rest) = raw.strip_prefix('-') {
                hunk.lines.push(HunkLine::Remove(owned_line(rest)));
            } else if let Some(rest) = raw.strip_prefix('+') {
                hunk.lines.push(HunkLine::Add(owned_line(rest)));
            } else if raw.starts_with('\\') {
                // "\ No newline at end of file" refers to the previous line.
                hunk.mark_last_no_newline();
            } else if raw.is_empty() {
                // Some producers emit bare empty lines for empty context.
                hunk.lines.push(HunkLine::Context(owned_line("")));
            } else {
                return Err(PatchError::Malformed(format!(
                    "unexpected line inside hunk: {raw:?}"
                )));
            }
        }

        if let Some(hunk) = current.take() {
            hunks.push(hunk);
        }
        if hunks.is_empty() {
            return Err(PatchError::Malformed(
                "missing @@ hunk markers; the patch must be a unified diff".to_string(),
            ));
        }
        Ok(Self { hunks })
    }

    pub fn hunk_count(&self) -> usize {
        self.hunks.len()
    }

    /// Apply every hunk against `content`. Each hunk is located at its stated
    /// position first, then by searching for its old block elsewhere. Every
    /// hunk is attempted so the conflict error can name all failures; nothing
    /// is returned unless all of them applied.
    pub fn apply(&self, content: &str) -> Result<String, PatchError> {
        let mut lines = split_lines(content);
        let total = self.hunks.len();
        let mut failed: Vec<usize> = Vec::new();
        let mut offset: isize = 0;

        for (index, hunk) in self.hunks.iter().enumerate() {
            let old_block = hunk.old_block();

            let pos = if hunk.old_count == 0 || old_block.is_empty() {
                // Pure insertion: "@@ -N,0 ..." inserts after line N.
                Some(clamp_index(hunk.old_start as isize + offset, lines.len()))
            } else {
                let expected = hunk.old_start as isize - 1 + offset;
                locate(&lines, &old_block, expected)
            };

            let Some(pos) = pos else {
                failed.push(index);
                continue;
            };

            // Context lines are taken from the file itself so an unhinted
            // terminator difference cannot corrupt untouched lines.
            let mut replacement: Vec<Line> = Vec::new();
            let mut cursor = pos;
            for hunk_line in &hunk.lines {
                match hunk_line {
                    HunkLine::Context(_) => {
                        replacement.push(lines[cursor].clone());
                        cursor += 1;
                    }
                    HunkLine::Remove(_) => cursor += 1,
                    HunkLine::Add(line) => replacement.push(line.clone()),
                }
            }
            offset += replacement.len() as isize - (cursor - pos) as isize;
            lines.splice(pos..cursor, replacement);
        }

        if !failed.is_empty() {
            return Err(PatchError::Conflict { failed, total });
        }
        Ok(join_lines(&lines))
    }
}

fn owned_line(text: &str) -> Line {
    Line {
        text: text.to_string(),
        newline: true,
    }
}

fn parse_hunk_header(raw: &str) -> Result<Hunk, PatchError> {
    let malformed = || PatchError::Malformed(format!("bad hunk header: {raw:?}"));

    let mut old_range = None;
    for token in raw.split_whitespace().skip(1) {
        if token == "@@" {
            break;
        }
        if let Some(range) = token.strip_prefix('-') {
            old_range = Some(range);
        }
    }
    let old_range = old_range.ok_or_else(malformed)?;

    let (start, count) = match old_range.split_once(',') {
        Some((start, count)) => (
            start.parse::<usize>().map_err(|_| malformed())?,
            count.parse::<usize>().map_err(|_| malformed())?,
        ),
        None => (old_range.parse::<usize>().map_err(|_| malformed())?, 1),
    };

    Ok(Hunk {
        old_start: start,
        old_count: count,
        lines: Vec::new(),
    })
}

fn split_lines(content: &str) -> Vec<Line> {
    let mut out = Vec::new();
    let mut rest = content;
    while !rest.is_empty() {
        match rest.find('\n') {
            Some(i) => {
                out.push(Line {
                    text: rest[..i].to_string(),
                    newline: true,
                });
                rest = &rest[i + 1..];
            }
            None => {
                out.push(Line {
                    text: rest.to_string(),
                    newline: false,
                });
                break;
            }
        }
    }
    out
}

fn join_lines(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.text);
        if line.newline {
            out.push('\n');
        }
    }
    out
}

fn clamp_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize) as usize
}

/// Find where `block` matches in `lines`: the expected position wins, then
/// the first match anywhere else.
fn locate(lines: &[Line], block: &[&Line], expected: isize) -> Option<usize> {
    if expected >= 0 && matches_at(lines, expected as usize, block) {
        return Some(expected as usize);
    }
    if block.len() > lines.len() {
        return None;
    }
    (0..=lines.len() - block.len()).find(|&pos| matches_at(lines, pos, block))
}

fn matches_at(lines: &[Line], pos: usize, block: &[&Line]) -> bool {
    if pos + block.len() > lines.len() {
        return false;
    }
    block
        .iter()
        .zip(&lines[pos..pos + block.len()])
        .all(|(want, have)| want.text == have.text)
}
