//! Decorator normalizer.
//!
//! After substitution and reconciliation a decorator can end up separated
//! from its definition or at a different depth. Each stack of `@` lines is
//! pulled down onto the `def` / `async def` / `class` it decorates and
//! given that definition's indentation.

use std::sync::OnceLock;

use regex::Regex;

use crate::engine::Outcome;
use crate::error::Warning;
use crate::lexer::{self, LineScan, State};

fn decorator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@([A-Za-z_][\w.]*)\s*(\(.*)?$").expect("valid decorator regex")
    })
}

fn definition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(async\s+def|def|class)\b").expect("valid definition regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Blank,
    Comment,
    Decorator(String),
    Definition,
    /// Continuation of an earlier line. `true` inside a triple-quoted string.
    Inner(bool),
    Other,
}

fn classify(line: &str, scan: &LineScan) -> Kind {
    if line.trim().is_empty() {
        return Kind::Blank;
    }
    if scan.is_continuation() {
        return Kind::Inner(scan.entry != State::Code);
    }
    let code = scan.masked(line);
    let code = code.trim();
    if code.is_empty() {
        Kind::Comment
    } else if let Some(caps) = decorator_re().captures(code) {
        Kind::Decorator(format!("@{}", &caps[1]))
    } else if definition_re().is_match(code) {
        Kind::Definition
    } else {
        Kind::Other
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Width of the block header directly above line `at`, when the decorator
/// stack starting there is that block's first statement.
fn enclosing_header(lines: &[&str], scans: &[LineScan], kinds: &[Kind], at: usize) -> Option<usize> {
    let last = (0..at)
        .rev()
        .find(|&k| !matches!(kinds[k], Kind::Blank | Kind::Comment))?;
    let scan = &scans[last];
    if !scan.ends_statement() || !scan.masked(lines[last]).trim_end().ends_with(':') {
        return None;
    }
    let start = (0..=last)
        .rev()
        .find(|&k| !matches!(kinds[k], Kind::Inner(_)))?;
    Some(lexer::indent_width(lines[start], 4))
}

/// Keep every decorator stack directly above the definition it decorates.
pub fn normalize_decorators(text: &str) -> Outcome {
    let lines: Vec<&str> = text.split('\n').collect();
    let scans = lexer::scan(text);
    let kinds: Vec<Kind> = lines
        .iter()
        .zip(&scans)
        .map(|(line, scan)| classify(line, scan))
        .collect();

    let mut out = Vec::with_capacity(lines.len());
    let mut warnings = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !matches!(kinds[i], Kind::Decorator(_)) {
            out.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let mut end = i;
        let mut last_decorator = i;
        let mut target = None;
        while end < lines.len() {
            match &kinds[end] {
                Kind::Definition => {
                    target = Some(end);
                    break;
                }
                Kind::Other => break,
                Kind::Decorator(_) => last_decorator = end,
                Kind::Blank | Kind::Comment | Kind::Inner(_) => {}
            }
            end += 1;
        }

        let Some(target) = target else {
            if let Kind::Decorator(name) = &kinds[last_decorator] {
                let warning = Warning::DecoratorMisuse {
                    line: last_decorator + 1,
                    decorator: name.clone(),
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
            out.extend(lines[i..end].iter().map(|l| l.to_string()));
            i = end;
            continue;
        };

        let indent = leading_whitespace(lines[target]);
        let width = lexer::indent_width(indent, 4);

        if let Some(header) = enclosing_header(&lines, &scans, &kinds, i) {
            if width <= header {
                let name = match &kinds[i] {
                    Kind::Decorator(name) => name.as_str(),
                    _ => "@",
                };
                let warning = Warning::ReconciliationAmbiguity {
                    line: i + 1,
                    reason: format!(
                        "moving `{name}` onto its definition would leave the block above it empty"
                    ),
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
                out.extend(lines[i..target].iter().map(|l| l.to_string()));
                i = target;
                continue;
            }
        }
        let mut delta = 0isize;
        for k in i..target {
            let line = lines[k];
            match kinds[k] {
                Kind::Blank => {}
                Kind::Decorator(_) | Kind::Comment => {
                    delta = width as isize - lexer::indent_width(line, 4) as isize;
                    out.push(format!("{indent}{}", line.trim_start_matches([' ', '\t'])));
                }
                Kind::Inner(true) | Kind::Definition | Kind::Other => out.push(line.to_string()),
                Kind::Inner(false) => {
                    let moved = lexer::indent_width(line, 4).saturating_add_signed(delta);
                    out.push(format!(
                        "{}{}",
                        " ".repeat(moved),
                        line.trim_start_matches([' ', '\t'])
                    ));
                }
            }
        }
        i = target;
    }

    tracing::debug!(
        lines_in = lines.len(),
        lines_out = out.len(),
        warnings = warnings.len(),
        "decorators normalized"
    );

    Outcome {
        text: out.join("\n"),
        warnings,
    }
}
