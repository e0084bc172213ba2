//! Diagnostics and their plain-text rendering.
//!
//! Every stage reports its first fatal condition as a typed error; the
//! driver turns it into a `Diagnostic` and renders it against the source
//! with a caret line under the offending span.

use std::fmt;

use doty_lexer::Span;

// ── Severity ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diagnostic ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    /// Follow-up `info` messages, rendered after the main one.
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            message: message.into(),
            span: Some(span),
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

// ── Line index ────────────────────────────────────────────────────

/// Maps byte offsets to lines of a source text.
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineIndex { line_starts }
    }

    /// Zero-based line containing `offset`.
    pub fn line_of(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next_line) => next_line.saturating_sub(1),
        }
    }

    pub fn line_start(&self, line: usize) -> u32 {
        self.line_starts.get(line).copied().unwrap_or(0)
    }

    /// Text of zero-based `line`, without its newline.
    pub fn line_text<'s>(&self, text: &'s str, line: usize) -> &'s str {
        let start = (self.line_start(line) as usize).min(text.len());
        let rest = &text[start..];
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].strip_suffix('\r').unwrap_or(&rest[..end])
    }

    /// One-based line and column (in characters) of `offset`.
    pub fn line_col(&self, text: &str, offset: u32) -> (usize, usize) {
        let line = self.line_of(offset);
        let start = self.line_start(line) as usize;
        let offset = (offset as usize).clamp(start, text.len());
        let col = text.get(start..offset).map_or(0, |s| s.chars().count());
        (line + 1, col + 1)
    }
}

// ── Rendering ─────────────────────────────────────────────────────

/// Render `diag` and its notes against `source`, one block per message:
///
/// ```text
/// error: unknown name `x`
/// top.doty:3:5:
///   | let y = x;
///   |         ^
/// ```
pub fn render(path: &str, source: &str, diag: &Diagnostic) -> String {
    let index = LineIndex::new(source);
    let mut out = render_block(path, source, &index, diag.severity, &diag.message, diag.span);
    for note in &diag.notes {
        out.push('\n');
        out.push_str(&render_block(
            path,
            source,
            &index,
            Severity::Info,
            &note.message,
            note.span,
        ));
    }
    out
}

fn render_block(
    path: &str,
    source: &str,
    index: &LineIndex,
    severity: Severity,
    message: &str,
    span: Option<Span>,
) -> String {
    let mut out = format!("{}: {}", severity, message);
    let Some(span) = span else {
        return out;
    };

    let (line, col) = index.line_col(source, span.start);
    let text = index.line_text(source, line - 1);
    let before: String = text.chars().take(col - 1).collect();
    let remaining = text.chars().count().saturating_sub(col - 1);
    let width = source
        .get(span.start as usize..span.end as usize)
        .map_or(0, |s| s.chars().count())
        .min(remaining)
        .max(1);

    out.push_str(&format!("\n{}:{}:{}:", path, line, col));
    out.push_str(&format!("\n  | {}", text));
    out.push_str(&format!(
        "\n  | {}{}",
        " ".repeat(before.chars().count()),
        "^".repeat(width)
    ));
    out
}
