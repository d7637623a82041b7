//! Rule compiler.
//!
//! Turns a [`MappingDocument`] into the fixed, ordered list of rules the
//! substitution engine walks:
//! - keyword rules, longest phrase first (token count, then length, then
//!   document order), matched on identifier boundaries;
//! - special-pattern rules, in document order.
//!
//! Forward sets run keywords before patterns. Backward sets are built from
//! the reverse keyword mapping and the invertible patterns, and run the
//! patterns first so a backward pass undoes a forward one.

mod invert;
pub mod template;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::mapping::MappingDocument;

pub use template::{GroupRef, Piece, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Custom vocabulary → host language.
    #[default]
    Forward,
    /// Host language → custom vocabulary.
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "to-host" => Ok(Direction::Forward),
            "backward" | "reverse" | "to-custom" => Ok(Direction::Backward),
            other => Err(format!("unknown direction `{other}`")),
        }
    }
}

/// Longest phrase first: more tokens, then more characters.
pub fn by_phrase_length(a: &str, b: &str) -> Ordering {
    let tokens = |s: &str| s.split_whitespace().count();
    tokens(b)
        .cmp(&tokens(a))
        .then_with(|| b.chars().count().cmp(&a.chars().count()))
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A keyword or phrase replaced as a whole word.
#[derive(Debug, Clone)]
pub struct WordRule {
    pub from: String,
    pub to: String,
    matcher: Regex,
    ident_head: bool,
    ident_tail: bool,
}

impl WordRule {
    pub fn new(from: &str, to: &str) -> Result<Self, regex::Error> {
        let words: Vec<&str> = from.split_whitespace().collect();
        let source = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join(r"\s+");
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            matcher: Regex::new(&source)?,
            ident_head: from.trim_start().chars().next().is_some_and(is_ident),
            ident_tail: from.trim_end().chars().last().is_some_and(is_ident),
        })
    }

    /// First whole-word occurrence starting at or after byte `pos`.
    pub fn find_at(&self, text: &str, mut pos: usize) -> Option<(usize, usize)> {
        while pos <= text.len() {
            let m = self.matcher.find_at(text, pos)?;
            if self.on_boundary(text, m.start(), m.end()) {
                return Some((m.start(), m.end()));
            }
            pos = step(text, m.start());
        }
        None
    }

    fn on_boundary(&self, text: &str, start: usize, end: usize) -> bool {
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !(self.ident_head && before.is_some_and(is_ident))
            && !(self.ident_tail && after.is_some_and(is_ident))
    }
}

/// Byte offset of the character after the one at `at`, or past the end.
pub(crate) fn step(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| at + c.len_utf8())
}

/// A regex with a replacement template.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Regex source as written (or as derived, for inverted patterns).
    pub source: String,
    /// Position of the originating pattern in `special_patterns`.
    pub index: usize,
    pub template: Template,
    regex: Regex,
}

impl PatternRule {
    pub fn new(index: usize, source: &str, template: &str) -> Result<Self, MappingError> {
        let regex = Regex::new(source).map_err(|source_err| MappingError::InvalidPattern {
            index,
            pattern: source.to_string(),
            source: source_err,
        })?;
        Ok(Self {
            source: source.to_string(),
            index,
            template: Template::parse(template),
            regex,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The backward counterpart, when the pattern can be undone.
    pub fn invert(&self) -> Option<PatternRule> {
        let (source, template) = invert::invert(&self.source, &self.template)?;
        let regex = Regex::new(&source).ok()?;
        Some(PatternRule {
            source,
            index: self.index,
            template,
            regex,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Rule {
    Word(WordRule),
    Pattern(PatternRule),
}

/// Compiled rules in application order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    direction: Direction,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn words(&self) -> impl Iterator<Item = &WordRule> {
        self.rules.iter().filter_map(|r| match r {
            Rule::Word(w) => Some(w),
            Rule::Pattern(_) => None,
        })
    }

    pub fn patterns(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().filter_map(|r| match r {
            Rule::Pattern(p) => Some(p),
            Rule::Word(_) => None,
        })
    }

    /// Consecutive runs of the same rule kind. Each run is one pass.
    pub fn passes(&self) -> impl Iterator<Item = &[Rule]> {
        self.rules.chunk_by(|a, b| {
            matches!(
                (a, b),
                (Rule::Word(_), Rule::Word(_)) | (Rule::Pattern(_), Rule::Pattern(_))
            )
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn word_rules(pairs: &[(String, String)]) -> Result<Vec<Rule>, MappingError> {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| by_phrase_length(&a.0, &b.0));
    sorted
        .into_iter()
        .map(|(from, to)| {
            WordRule::new(from, to)
                .map(Rule::Word)
                .map_err(|source| MappingError::InvalidKeyword {
                    key: from.clone(),
                    source,
                })
        })
        .collect()
}

/// Compile the rules of one direction. Fails on the first invalid pattern;
/// no partial rule set is returned.
pub fn compile(doc: &MappingDocument, direction: Direction) -> Result<RuleSet, MappingError> {
    let patterns = doc
        .special_patterns
        .iter()
        .enumerate()
        .map(|(index, (source, template))| PatternRule::new(index, source, template))
        .collect::<Result<Vec<_>, _>>()?;

    let rules = match direction {
        Direction::Forward => {
            let mut rules = word_rules(&doc.keywords)?;
            rules.extend(patterns.into_iter().map(Rule::Pattern));
            rules
        }
        Direction::Backward => {
            let mut rules = Vec::new();
            let mut seen = std::collections::HashSet::new();
            for pattern in &patterns {
                match pattern.invert() {
                    Some(inverse) if seen.insert(inverse.source.clone()) => {
                        rules.push(Rule::Pattern(inverse));
                    }
                    Some(inverse) => {
                        tracing::debug!(pattern = %pattern.source, inverse = %inverse.source, "inverse already claimed; skipped")
                    }
                    None => {
                        tracing::debug!(pattern = %pattern.source, "pattern is not invertible; skipped on the backward pass")
                    }
                }
            }
            rules.extend(word_rules(&doc.reverse_keywords())?);
            rules
        }
    };

    Ok(RuleSet { direction, rules })
}

#[cfg(test)]
mod tests;
