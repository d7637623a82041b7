//! Substitution engine.
//!
//! Rewrites text one line at a time. Every pass of a [`RuleSet`] matches
//! against the text the pass started with and splices all accepted matches
//! in at once, so a replacement is never rescanned by the pass that made it.
//! Between passes the line is rescanned, which is how the pattern pass sees
//! keyword output.

use regex::Captures;

use crate::engine::Outcome;
use crate::error::Warning;
use crate::lexer::{LineScan, Scanner};
use crate::mapping::Mapping;
use crate::rules::{step, Direction, PatternRule, Rule, RuleSet, WordRule};

/// One accepted replacement: byte range of the pass input and its new text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Default)]
struct Edits(Vec<Edit>);

impl Edits {
    fn is_free(&self, start: usize, end: usize) -> bool {
        !self.0.iter().any(|e| e.start < end && start < e.end)
    }

    fn push(&mut self, start: usize, end: usize, text: String) {
        self.0.push(Edit { start, end, text });
    }

    fn count(&self) -> usize {
        self.0.len()
    }

    fn splice(mut self, line: &str) -> String {
        if self.0.is_empty() {
            return line.to_string();
        }
        self.0.sort_by_key(|e| e.start);
        let mut out = String::with_capacity(line.len());
        let mut pos = 0;
        for edit in self.0 {
            out.push_str(&line[pos..edit.start]);
            out.push_str(&edit.text);
            pos = edit.end;
        }
        out.push_str(&line[pos..]);
        out
    }
}

/// Rewrite `text` with the mapping's rules for `direction`.
pub fn transpile(text: &str, mapping: &Mapping, direction: Direction) -> Outcome {
    apply(text, mapping.rules(direction))
}

/// Rewrite `text` with an already compiled rule set.
pub fn apply(text: &str, rules: &RuleSet) -> Outcome {
    let mut scanner = Scanner::new();
    let mut warnings = Vec::new();
    let mut lines = Vec::new();
    let mut substitutions = 0;

    for (index, line) in text.split('\n').enumerate() {
        let mut current = line.to_string();
        for pass in rules.passes() {
            let scan = scanner.peek(&current);
            let edits = match pass.first() {
                Some(Rule::Word(_)) => word_pass(&current, &scan, pass),
                Some(Rule::Pattern(_)) => {
                    pattern_pass(&current, &scan, pass, index + 1, &mut warnings)
                }
                None => continue,
            };
            substitutions += edits.count();
            current = edits.splice(&current);
        }

        let current = indent_continuations(&current, leading_whitespace(line));
        for piece in current.split('\n') {
            scanner.next_line(piece);
        }
        lines.push(current);
    }

    tracing::debug!(
        direction = %rules.direction(),
        lines = lines.len(),
        substitutions,
        warnings = warnings.len(),
        "substitution finished"
    );

    Outcome {
        text: lines.join("\n"),
        warnings,
    }
}

fn word_pass(line: &str, scan: &LineScan, pass: &[Rule]) -> Edits {
    let mut edits = Edits::default();
    for rule in pass {
        if let Rule::Word(word) = rule {
            word_matches(line, scan, word, &mut edits);
        }
    }
    edits
}

fn word_matches(line: &str, scan: &LineScan, word: &WordRule, edits: &mut Edits) {
    let mut pos = 0;
    while let Some((start, end)) = word.find_at(line, pos) {
        let shielded = scan.zones.iter().any(|z| z.overlaps(start, end));
        if start == end || shielded || !edits.is_free(start, end) {
            pos = step(line, start);
            continue;
        }
        edits.push(start, end, word.to.clone());
        pos = end;
    }
}

fn pattern_pass(
    line: &str,
    scan: &LineScan,
    pass: &[Rule],
    line_no: usize,
    warnings: &mut Vec<Warning>,
) -> Edits {
    let mut edits = Edits::default();
    for rule in pass {
        if let Rule::Pattern(pattern) = rule {
            pattern_matches(line, scan, pattern, line_no, &mut edits, warnings);
        }
    }
    edits
}

fn pattern_matches(
    line: &str,
    scan: &LineScan,
    pattern: &PatternRule,
    line_no: usize,
    edits: &mut Edits,
    warnings: &mut Vec<Warning>,
) {
    let mut pos = 0;
    while pos <= line.len() {
        let Some(caps) = pattern.regex().captures_at(line, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let (start, end) = (whole.start(), whole.end());
        if start == end || !respects_zones(&caps, scan) || !edits.is_free(start, end) {
            pos = step(line, start);
            continue;
        }

        match pattern.template.expand(&caps) {
            Ok(text) => edits.push(start, end, text),
            Err(group) => {
                let warning = Warning::PatternApplication {
                    line: line_no,
                    pattern: pattern.source.clone(),
                    group: group.to_string(),
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
                // The occurrence stays as it is and no other pattern may claim it.
                edits.push(start, end, whole.as_str().to_string());
            }
        }
        pos = end;
    }
}

/// A pattern match must start in code, and each zone it touches must sit
/// entirely inside one capture group.
fn respects_zones(caps: &Captures<'_>, scan: &LineScan) -> bool {
    let Some(whole) = caps.get(0) else {
        return false;
    };
    if scan.in_zone(whole.start()) {
        return false;
    }
    scan.zones
        .iter()
        .filter(|z| z.overlaps(whole.start(), whole.end()))
        .all(|z| {
            caps.iter()
                .skip(1)
                .flatten()
                .any(|g| g.start() <= z.start && z.end <= g.end())
        })
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Lines created by a multi-line replacement start at the source line's
/// indentation.
fn indent_continuations(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    let mut pieces = text.split('\n');
    let mut out = String::with_capacity(text.len() + indent.len() * 2);
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        out.push('\n');
        if !piece.is_empty() {
            out.push_str(indent);
        }
        out.push_str(piece);
    }
    out
}

#[cfg(test)]
mod tests;
