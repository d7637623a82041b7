//! Replacement templates for special patterns.
//!
//! Accepts both the backslash style (`\1`, `\g<1>`, `\g<name>`) and the
//! dollar style (`$1`, `${1}`, `${name}`, `$name`) of group reference, plus
//! the `\n`, `\t`, `\\` and `$$` escapes.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use regex::Captures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Index(i) => write!(f, "{i}"),
            GroupRef::Name(n) => write!(f, "`{n}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Group(GroupRef),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

fn group_ref(name: &str) -> GroupRef {
    match name.parse::<usize>() {
        Ok(i) => GroupRef::Index(i),
        Err(_) => GroupRef::Name(name.to_string()),
    }
}

fn push_group(text: &mut String, pieces: &mut Vec<Piece>, group: GroupRef) {
    if !text.is_empty() {
        pieces.push(Piece::Text(std::mem::take(text)));
    }
    pieces.push(Piece::Group(group));
}

/// Read `name<close>` from a copy of `chars`. Returns the name and the
/// advanced iterator only when the closing delimiter is present.
fn delimited<'a>(
    chars: &Peekable<Chars<'a>>,
    close: char,
) -> Option<(String, Peekable<Chars<'a>>)> {
    let mut ahead = chars.clone();
    let mut name = String::new();
    for c in ahead.by_ref() {
        if c == close {
            return (!name.is_empty()).then_some((name, ahead));
        }
        name.push(c);
    }
    None
}

impl Template {
    pub fn parse(src: &str) -> Self {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = src.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.peek().copied() {
                    Some(d @ '1'..='9') => {
                        chars.next();
                        let index = d as usize - '0' as usize;
                        push_group(&mut text, &mut pieces, GroupRef::Index(index));
                    }
                    Some('g') => {
                        let mut after_g = chars.clone();
                        after_g.next();
                        let found = match after_g.next() {
                            Some('<') => delimited(&after_g, '>'),
                            _ => None,
                        };
                        match found {
                            Some((name, rest)) => {
                                chars = rest;
                                push_group(&mut text, &mut pieces, group_ref(&name));
                            }
                            None => text.push('\\'),
                        }
                    }
                    Some('n') => {
                        chars.next();
                        text.push('\n');
                    }
                    Some('t') => {
                        chars.next();
                        text.push('\t');
                    }
                    Some('\\') => {
                        chars.next();
                        text.push('\\');
                    }
                    _ => text.push('\\'),
                },
                '$' => match chars.peek().copied() {
                    Some('$') => {
                        chars.next();
                        text.push('$');
                    }
                    Some('{') => {
                        let mut after_brace = chars.clone();
                        after_brace.next();
                        match delimited(&after_brace, '}') {
                            Some((name, rest)) => {
                                chars = rest;
                                push_group(&mut text, &mut pieces, group_ref(&name));
                            }
                            None => text.push('$'),
                        }
                    }
                    Some(d) if d.is_ascii_alphanumeric() || d == '_' => {
                        let mut name = String::new();
                        while let Some(&c) = chars.peek() {
                            if !(c.is_ascii_alphanumeric() || c == '_') {
                                break;
                            }
                            name.push(c);
                            chars.next();
                        }
                        push_group(&mut text, &mut pieces, group_ref(&name));
                    }
                    _ => text.push('$'),
                },
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Self { pieces }
    }

    pub fn from_pieces(pieces: Vec<Piece>) -> Self {
        Self { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn is_multiline(&self) -> bool {
        self.pieces
            .iter()
            .any(|p| matches!(p, Piece::Text(t) if t.contains('\n')))
    }

    /// Fill in the groups of one match. Fails with the first group the
    /// match does not provide.
    pub fn expand(&self, caps: &Captures<'_>) -> Result<String, GroupRef> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Group(group) => {
                    let m = match group {
                        GroupRef::Index(i) => caps.get(*i),
                        GroupRef::Name(n) => caps.name(n),
                    };
                    match m {
                        Some(m) => out.push_str(m.as_str()),
                        None => return Err(group.clone()),
                    }
                }
            }
        }
        Ok(out)
    }
}
