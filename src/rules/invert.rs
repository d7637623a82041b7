//! Inverting special patterns for the backward direction.
//!
//! Only "shaped" patterns can be inverted: literal text, whitespace gaps,
//! `\b`, an optional leading `^` / trailing `$`, and flat capture groups.
//! The template must be a single line with some literal text that uses
//! every group exactly once by number. Anything else loses information and
//! is skipped on the backward pass.

use super::template::{GroupRef, Piece, Template};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Lit(char),
    /// `\s+` / ` ` (required) or `\s*` (optional).
    Gap { required: bool },
    Boundary,
    Group(String),
}

#[derive(Debug, Default)]
struct Shape {
    anchored_start: bool,
    anchored_end: bool,
    atoms: Vec<Atom>,
}

fn is_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '*' | '+' | '?' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | ')'
    )
}

fn shape(source: &str) -> Option<Shape> {
    let chars: Vec<char> = source.chars().collect();
    let mut shape = Shape::default();
    let mut i = 0;
    let mut limit = chars.len();

    if chars.first() == Some(&'^') {
        shape.anchored_start = true;
        i = 1;
    }
    if limit > i && chars[limit - 1] == '$' && !(limit >= 2 && chars[limit - 2] == '\\') {
        shape.anchored_end = true;
        limit -= 1;
    }

    while i < limit {
        match chars[i] {
            '\\' => {
                let next = *chars.get(i + 1)?;
                match next {
                    's' => match chars.get(i + 2) {
                        Some('+') => {
                            shape.atoms.push(Atom::Gap { required: true });
                            i += 3;
                        }
                        Some('*') => {
                            shape.atoms.push(Atom::Gap { required: false });
                            i += 3;
                        }
                        _ => {
                            shape.atoms.push(Atom::Gap { required: true });
                            i += 2;
                        }
                    },
                    'b' => {
                        shape.atoms.push(Atom::Boundary);
                        i += 2;
                    }
                    c if c.is_ascii_alphanumeric() => return None,
                    c => {
                        shape.atoms.push(Atom::Lit(c));
                        i += 2;
                    }
                }
            }
            ' ' => {
                while i < limit && chars[i] == ' ' {
                    i += 1;
                }
                if i < limit && chars[i] == '+' {
                    i += 1;
                }
                shape.atoms.push(Atom::Gap { required: true });
            }
            '(' => {
                if chars.get(i + 1) == Some(&'?') {
                    return None;
                }
                let mut j = i + 1;
                let mut in_class = false;
                let mut body = String::new();
                loop {
                    let c = *chars.get(j)?;
                    match c {
                        '\\' => {
                            body.push(c);
                            body.push(*chars.get(j + 1)?);
                            j += 2;
                            continue;
                        }
                        '[' if !in_class => in_class = true,
                        ']' if in_class => in_class = false,
                        '(' if !in_class => return None,
                        ')' if !in_class => break,
                        _ => {}
                    }
                    body.push(c);
                    j += 1;
                }
                shape.atoms.push(Atom::Group(body));
                i = j + 1;
            }
            c if is_meta(c) => return None,
            c => {
                shape.atoms.push(Atom::Lit(c));
                i += 1;
            }
        }
    }

    Some(shape)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Invert `pattern -> template` into `inverse regex source -> inverse template`.
pub(crate) fn invert(pattern: &str, template: &Template) -> Option<(String, Template)> {
    let shape = shape(pattern)?;
    let groups: Vec<&str> = shape
        .atoms
        .iter()
        .filter_map(|a| match a {
            Atom::Group(body) => Some(body.as_str()),
            _ => None,
        })
        .collect();

    // Template order of the original groups.
    let mut order: Vec<usize> = Vec::with_capacity(groups.len());
    let mut has_text = false;
    for piece in template.pieces() {
        match piece {
            Piece::Text(t) => {
                if t.contains('\n') {
                    return None;
                }
                has_text |= t.chars().any(|c| !c.is_whitespace());
            }
            Piece::Group(GroupRef::Index(i)) => {
                if *i == 0 || *i > groups.len() || order.contains(i) {
                    return None;
                }
                order.push(*i);
            }
            Piece::Group(GroupRef::Name(_)) => return None,
        }
    }
    if !has_text || order.len() != groups.len() {
        return None;
    }

    let mut regex = String::new();
    if shape.anchored_start {
        regex.push('^');
    }
    if let Some(Piece::Text(t)) = template.pieces().first() {
        if t.chars().next().is_some_and(is_word) {
            regex.push_str(r"\b");
        }
    }
    for piece in template.pieces() {
        match piece {
            Piece::Text(t) => {
                let mut in_gap = false;
                for c in t.chars() {
                    if c.is_whitespace() {
                        if !in_gap {
                            regex.push_str(r"\s+");
                        }
                        in_gap = true;
                    } else {
                        in_gap = false;
                        regex.push_str(&regex::escape(&c.to_string()));
                    }
                }
            }
            Piece::Group(GroupRef::Index(i)) => {
                regex.push('(');
                regex.push_str(groups[i - 1]);
                regex.push(')');
            }
            Piece::Group(GroupRef::Name(_)) => return None,
        }
    }
    if let Some(Piece::Text(t)) = template.pieces().last() {
        if t.chars().last().is_some_and(is_word) {
            regex.push_str(r"\b");
        }
    }
    if shape.anchored_end {
        regex.push('$');
    }

    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut seen_groups = 0;
    for atom in &shape.atoms {
        match atom {
            Atom::Lit(c) => text.push(*c),
            Atom::Gap { required: true } => text.push(' '),
            Atom::Gap { required: false } | Atom::Boundary => {}
            Atom::Group(_) => {
                seen_groups += 1;
                let position = order.iter().position(|&g| g == seen_groups)?;
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Group(GroupRef::Index(position + 1)));
            }
        }
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }

    Some((regex, Template::from_pieces(pieces)))
}
