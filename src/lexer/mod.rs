//! Lexer.
//!
//! Splits source lines into code, string and comment zones:
//! - `#` comments run to the end of the line (outside quotes)
//! - single, double and triple quoted strings, with backslash escapes
//! - triple-quoted strings carry over to the following lines
//! - bracket depth and trailing `\` mark continuation lines
//!
//! Substitution never fires inside a zone, and the reconciler uses the
//! code-only view of a line to decide whether it opens a block.

/// What a protected span of a line contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Str,
    Comment,
}

/// Byte range `[start, end)` of a line that must pass through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub start: usize,
    pub end: usize,
    pub kind: ZoneKind,
}

impl Zone {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// String state at a line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Code,
    /// Inside a triple-quoted string opened with this quote character.
    Triple(char),
}

/// Result of scanning one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineScan {
    pub entry: State,
    pub exit: State,
    pub zones: Vec<Zone>,
    /// A single-line string was still open when the line ended.
    pub unterminated: bool,
    /// Open brackets before / after this line.
    pub brackets_in: usize,
    pub brackets_out: usize,
    /// The previous line ended with a `\` continuation.
    pub joined: bool,
    /// This line ends with a `\` continuation.
    pub continues: bool,
}

impl LineScan {
    /// The line belongs to a statement that started on an earlier line.
    pub fn is_continuation(&self) -> bool {
        self.entry != State::Code || self.brackets_in > 0 || self.joined
    }

    /// The statement this line belongs to is complete at the end of the line.
    pub fn ends_statement(&self) -> bool {
        self.exit == State::Code && self.brackets_out == 0 && !self.continues
    }

    pub fn in_zone(&self, pos: usize) -> bool {
        self.zones.iter().any(|z| z.contains(pos))
    }

    /// The line with every string replaced by `_` and comments dropped.
    pub fn masked(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut pos = 0;
        for zone in &self.zones {
            let start = zone.start.min(line.len());
            out.push_str(&line[pos..start]);
            if zone.kind == ZoneKind::Str {
                out.push('_');
            }
            pos = zone.end.min(line.len());
        }
        if pos < line.len() {
            out.push_str(&line[pos..]);
        }
        out
    }
}

fn starts_with_triple(line: &str, pos: usize, quote: char) -> bool {
    let mut rest = line[pos..].chars();
    (0..3).all(|_| rest.next() == Some(quote))
}

/// Scan a single line that starts in `entry` with `brackets` open.
///
/// A `\n` inside `line` ends comments and single-line strings, so the
/// function also accepts the multi-line output of a replacement.
pub fn scan_line(line: &str, entry: State, brackets: usize) -> LineScan {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let len = line.len();
    let mut zones = Vec::new();
    let mut state = entry;
    let mut depth = brackets;
    let mut unterminated = false;
    let mut zone_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        match state {
            State::Triple(q) => {
                if ch == '\\' {
                    i += 2;
                } else if ch == q && starts_with_triple(line, pos, q) {
                    zones.push(Zone {
                        start: zone_start,
                        end: pos + 3 * q.len_utf8(),
                        kind: ZoneKind::Str,
                    });
                    state = State::Code;
                    i += 3;
                } else {
                    i += 1;
                }
            }
            State::Code => match ch {
                '#' => {
                    let end = line[pos..].find('\n').map_or(len, |n| pos + n);
                    zones.push(Zone {
                        start: pos,
                        end,
                        kind: ZoneKind::Comment,
                    });
                    i = chars.partition_point(|(p, _)| *p < end);
                }
                '\'' | '"' if starts_with_triple(line, pos, ch) => {
                    state = State::Triple(ch);
                    zone_start = pos;
                    i += 3;
                }
                '\'' | '"' => {
                    let mut j = i + 1;
                    let mut end = None;
                    while j < chars.len() {
                        let (p, c) = chars[j];
                        if c == '\\' {
                            j += 2;
                            continue;
                        }
                        if c == '\n' {
                            break;
                        }
                        if c == ch {
                            end = Some(p + c.len_utf8());
                            break;
                        }
                        j += 1;
                    }
                    match end {
                        Some(end) => {
                            zones.push(Zone {
                                start: pos,
                                end,
                                kind: ZoneKind::Str,
                            });
                            i = j + 1;
                        }
                        None => {
                            let end = chars.get(j).map_or(len, |(p, _)| *p);
                            zones.push(Zone {
                                start: pos,
                                end,
                                kind: ZoneKind::Str,
                            });
                            unterminated = true;
                            i = j;
                        }
                    }
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    i += 1;
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                }
                _ => i += 1,
            },
        }
    }

    if let State::Triple(_) = state {
        zones.push(Zone {
            start: zone_start,
            end: len,
            kind: ZoneKind::Str,
        });
    }

    let continues = state == State::Code
        && line.ends_with('\\')
        && !zones.iter().any(|z| z.contains(len - 1));

    LineScan {
        entry,
        exit: state,
        zones,
        unterminated,
        brackets_in: brackets,
        brackets_out: depth,
        joined: false,
        continues,
    }
}

/// Line-by-line scanner carrying string, bracket and `\` state.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    state: State,
    brackets: usize,
    joined: bool,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_line(&mut self, line: &str) -> LineScan {
        let scan = self.peek(line);
        self.state = scan.exit;
        self.brackets = scan.brackets_out;
        self.joined = scan.continues;
        scan
    }

    /// Scan `line` in the current state without consuming it.
    pub fn peek(&self, line: &str) -> LineScan {
        let mut scan = scan_line(line, self.state, self.brackets);
        scan.joined = self.joined;
        scan
    }
}

/// Scan every `\n`-separated line of `text`.
pub fn scan(text: &str) -> Vec<LineScan> {
    let mut scanner = Scanner::new();
    text.split('\n').map(|line| scanner.next_line(line)).collect()
}

/// Leading indentation width; a tab counts as `tab` columns.
pub fn indent_width(line: &str, tab: usize) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { tab } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests;
