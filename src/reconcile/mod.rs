//! Structural reconciler.
//!
//! Keyword substitution shifts text around and multi-line replacements
//! arrive with whatever indentation their template had. This pass rebuilds
//! the leading whitespace of every statement from the block structure:
//! - a statement ending in `:` (outside strings, comments and brackets)
//!   opens a block, and the next statement goes one level deeper;
//! - the original widths decide where a block ends, so relative nesting
//!   survives;
//! - `elif`, `else`, `except` and `finally` line up with their opener.
//!
//! Continuation lines move with their statement, string interiors never
//! move, and only leading whitespace is ever rewritten.

use crate::engine::Outcome;
use crate::error::Warning;
use crate::lexer::{self, LineScan, State};

/// Columns per tab when measuring existing indentation.
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Spaces per nesting level in the output.
    pub indent_width: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// A header whose block has not seen its first body line yet.
#[derive(Debug, Clone)]
struct Header {
    keyword: String,
    /// Original indentation width of the header line.
    width: usize,
    /// Output depth of the header line.
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    /// The first body line was indented past the header; lines keep the
    /// block open while they are at least this wide.
    Open(usize),
    /// The body had to be pushed in; any line not wider than the header
    /// closes the block.
    Forced,
}

#[derive(Debug, Clone)]
struct Frame {
    header: Header,
    body: Body,
}

impl Frame {
    fn closed_by(&self, width: usize) -> bool {
        match self.body {
            Body::Open(body) => width < body,
            Body::Forced => width <= self.header.width,
        }
    }
}

/// The statement whose lines are being emitted.
#[derive(Debug, Clone)]
struct Statement {
    /// `None` when the statement was left untouched and may not open a block.
    header: Option<Header>,
    /// Column shift applied to the first line, repeated on continuations.
    delta: isize,
}

fn partners(keyword: &str) -> &'static [&'static str] {
    match keyword {
        "elif" => &["if", "elif"],
        "else" => &["if", "elif", "for", "while", "try", "except"],
        "except" => &["try", "except"],
        "finally" => &["try", "except", "else"],
        _ => &[],
    }
}

/// First word of a statement, looking past `async`.
fn head_keyword(code: &str) -> String {
    let mut words = code
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty());
    let first = words.next().unwrap_or_default();
    let starts_with_word = code.trim_start().starts_with(first);
    match (first, starts_with_word) {
        ("async", true) => words.next().unwrap_or_default().to_string(),
        (word, true) => word.to_string(),
        _ => String::new(),
    }
}

fn is_definition(keyword: &str) -> bool {
    matches!(keyword, "def" | "class")
}

fn content(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}

fn reindent(line: &str, width: usize) -> String {
    format!("{}{}", " ".repeat(width), content(line))
}

fn shift(line: &str, delta: isize) -> String {
    if delta == 0 {
        return line.to_string();
    }
    let width = lexer::indent_width(line, TAB_WIDTH);
    reindent(line, width.saturating_add_signed(delta))
}

struct Reconciler {
    unit: usize,
    frames: Vec<Frame>,
    pending: Option<Header>,
    statement: Option<Statement>,
    /// Open frames under the last statement when it was a decorator.
    decorated: Option<usize>,
    warnings: Vec<Warning>,
}

impl Reconciler {
    fn new(options: &ReconcileOptions) -> Self {
        Self {
            unit: options.indent_width,
            frames: Vec::new(),
            pending: None,
            statement: None,
            decorated: None,
            warnings: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        self.frames.last().map_or(0, |f| f.header.depth + 1)
    }

    /// Number of frames that stay open for a line of `width`.
    fn surviving(&self, width: usize) -> usize {
        let mut keep = self.frames.len();
        while keep > 0 && self.frames[keep - 1].closed_by(width) {
            keep -= 1;
        }
        keep
    }

    /// Frame a dedent keyword closes back to: same width first, then the
    /// nearest one not wider, then the nearest at all.
    fn partner(&self, keyword: &str, width: usize) -> Option<usize> {
        let openers = partners(keyword);
        let compatible = |f: &Frame| openers.contains(&f.header.keyword.as_str());
        self.frames
            .iter()
            .rposition(|f| compatible(f) && f.header.width == width)
            .or_else(|| {
                self.frames
                    .iter()
                    .rposition(|f| compatible(f) && f.header.width <= width)
            })
            .or_else(|| self.frames.iter().rposition(compatible))
    }

    fn ambiguity(&mut self, line: usize, reason: String) {
        let warning = Warning::ReconciliationAmbiguity { line, reason };
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Close the current statement if `scan` ends it; a trailing `:` turns
    /// it into a pending header.
    fn finish(&mut self, line: &str, scan: &LineScan) {
        if !scan.ends_statement() {
            return;
        }
        if let Some(Statement {
            header: Some(header),
            ..
        }) = self.statement.take()
        {
            if scan.masked(line).trim_end().ends_with(':') {
                self.pending = Some(header);
            }
        }
    }

    fn line(&mut self, number: usize, line: &str, scan: &LineScan) -> String {
        if line.trim().is_empty() {
            return line.to_string();
        }
        if scan.entry != State::Code {
            self.finish(line, scan);
            return line.to_string();
        }
        if scan.is_continuation() {
            let delta = self.statement.as_ref().map_or(0, |s| s.delta);
            self.finish(line, scan);
            return shift(line, delta);
        }

        let code = scan.masked(line);
        let code = code.trim();
        let width = lexer::indent_width(line, TAB_WIDTH);

        if code.is_empty() {
            let depth = match &self.pending {
                Some(header) => header.depth + 1,
                None => self.frames[..self.surviving(width)]
                    .last()
                    .map_or(0, |f| f.header.depth + 1),
            };
            return reindent(line, depth * self.unit);
        }

        if scan.unterminated {
            self.ambiguity(number, "unterminated string literal".to_string());
            self.decorated = None;
            self.statement = Some(Statement {
                header: None,
                delta: 0,
            });
            self.finish(line, scan);
            return line.to_string();
        }

        let fresh = match self.pending.take() {
            Some(header) => {
                let body = if width > header.width {
                    Body::Open(width)
                } else {
                    Body::Forced
                };
                self.frames.push(Frame { header, body });
                true
            }
            None => false,
        };

        let keyword = head_keyword(code);
        let partner = if partners(&keyword).is_empty() {
            None
        } else {
            let found = self.partner(&keyword, width);
            if found.is_none() {
                self.ambiguity(number, format!("`{keyword}` has no matching block opener"));
            }
            found
        };
        // A decorated definition stays in the block of its decorator.
        let decorated = self
            .decorated
            .take()
            .filter(|_| code.starts_with('@') || is_definition(&keyword));
        match (partner, decorated) {
            (Some(index), _) => self.frames.truncate(index),
            (None, Some(open)) if !fresh => self.frames.truncate(open),
            (None, _) if !fresh => {
                let keep = self.surviving(width);
                self.frames.truncate(keep);
            }
            (None, _) => {}
        }
        if code.starts_with('@') {
            self.decorated = Some(self.frames.len());
        }

        let depth = self.depth();
        let target = depth * self.unit;
        self.statement = Some(Statement {
            header: Some(Header {
                keyword,
                width,
                depth,
            }),
            delta: target as isize - width as isize,
        });
        self.finish(line, scan);
        reindent(line, target)
    }
}

/// Index of the line that opens a triple-quoted string left open at the end.
fn unterminated_tail(scans: &[LineScan]) -> Option<usize> {
    let last = scans.last()?;
    if last.exit == State::Code {
        return None;
    }
    scans.iter().rposition(|s| s.entry == State::Code)
}

/// Rebuild indentation with the default indent unit.
pub fn reconcile(text: &str) -> Outcome {
    reconcile_with(text, &ReconcileOptions::default())
}

pub fn reconcile_with(text: &str, options: &ReconcileOptions) -> Outcome {
    let scans = lexer::scan(text);
    let frozen = unterminated_tail(&scans);
    let mut reconciler = Reconciler::new(options);
    let mut lines = Vec::with_capacity(scans.len());

    for (index, (line, scan)) in text.split('\n').zip(&scans).enumerate() {
        if frozen.is_some_and(|start| index >= start) {
            if frozen == Some(index) {
                reconciler.ambiguity(
                    index + 1,
                    "triple-quoted string is never closed".to_string(),
                );
            }
            lines.push(line.to_string());
            continue;
        }
        lines.push(reconciler.line(index + 1, line, scan));
    }

    tracing::debug!(
        lines = lines.len(),
        warnings = reconciler.warnings.len(),
        "indentation reconciled"
    );

    Outcome {
        text: lines.join("\n"),
        warnings: reconciler.warnings,
    }
}
