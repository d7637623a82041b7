//! VS Code extension export.
//!
//! Builds a syntax-highlighting extension for the custom language from a
//! mapping: `package.json`, `language-configuration.json`, a TextMate
//! grammar under `syntaxes/` and a short README. Custom keywords are
//! grouped by the host word they stand for.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::mapping::{Mapping, MappingDocument};

/// Highlighting group of a custom keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    Control,
    Declaration,
    Operator,
    Constant,
    Builtin,
    Storage,
    Exception,
}

impl Group {
    pub const ALL: [Group; 7] = [
        Group::Control,
        Group::Declaration,
        Group::Operator,
        Group::Constant,
        Group::Builtin,
        Group::Storage,
        Group::Exception,
    ];

    /// Group for a host word; anything unknown counts as a builtin.
    pub fn of(host: &str) -> Group {
        match host {
            "if" | "else" | "elif" | "for" | "while" | "break" | "continue" | "return" => {
                Group::Control
            }
            "in" | "and" | "or" | "not" | "is" => Group::Operator,
            "def" | "class" | "import" | "from" | "as" | "with" | "lambda" => Group::Declaration,
            "True" | "False" | "None" => Group::Constant,
            "global" | "nonlocal" => Group::Storage,
            "try" | "except" | "finally" | "raise" | "assert" | "Exception" => Group::Exception,
            _ => Group::Builtin,
        }
    }

    /// TextMate scope prefix.
    pub fn scope(self) -> &'static str {
        match self {
            Group::Control => "keyword.control",
            Group::Declaration => "keyword.declaration",
            Group::Operator => "keyword.operator",
            Group::Constant => "constant.language",
            Group::Builtin => "support.function",
            Group::Storage => "storage.modifier",
            Group::Exception => "keyword.control.exception",
        }
    }
}

/// Readable words of a special pattern: gaps become spaces, groups,
/// anchors and boundaries go away.
pub fn display_word(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();
    let mut depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('s') => {
                    if matches!(chars.peek(), Some('+') | Some('*')) {
                        chars.next();
                    }
                    if depth == 0 {
                        out.push(' ');
                    }
                }
                Some('b') => {}
                Some(other) if depth == 0 && !other.is_ascii_alphanumeric() => out.push(other),
                _ => {}
            },
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '^' | '$' => {}
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Custom words per group, in document order, without duplicates.
pub fn keyword_groups(doc: &MappingDocument) -> Vec<(Group, Vec<String>)> {
    let mut groups: Vec<(Group, Vec<String>)> =
        Group::ALL.iter().map(|g| (*g, Vec::new())).collect();
    let mut add = |group: Group, word: String| {
        if word.is_empty() {
            return;
        }
        if let Some((_, words)) = groups.iter_mut().find(|(g, _)| *g == group) {
            if !words.contains(&word) {
                words.push(word);
            }
        }
    };

    for (custom, host) in &doc.keywords {
        add(Group::of(host.trim()), custom.clone());
    }
    for (pattern, template) in &doc.special_patterns {
        let host = template.split_whitespace().next().unwrap_or_default();
        add(Group::of(host), display_word(pattern));
    }
    groups
}

fn alternation(words: &[String]) -> String {
    let mut sorted: Vec<&String> = words.iter().collect();
    sorted.sort_by(|a, b| crate::rules::by_phrase_length(a, b));
    sorted
        .iter()
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// The generated extension, ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub language_id: String,
    pub package: Value,
    pub language_configuration: Value,
    pub grammar: Value,
    pub readme: String,
}

impl Extension {
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self::from_document(mapping.document())
    }

    pub fn from_document(doc: &MappingDocument) -> Self {
        let info = &doc.language_info;
        let name = info.display_name();
        let id = name.to_lowercase().replace(' ', "-");

        let package = json!({
            "name": id,
            "displayName": name,
            "description": info.display_description(),
            "version": info.version.as_deref().unwrap_or("0.1.0"),
            "engines": { "vscode": "^1.60.0" },
            "categories": ["Programming Languages"],
            "contributes": {
                "languages": [{
                    "id": id,
                    "aliases": [name],
                    "extensions": [format!(".{}", info.extension())],
                    "configuration": "./language-configuration.json"
                }],
                "grammars": [{
                    "language": id,
                    "scopeName": format!("source.{id}"),
                    "path": format!("./syntaxes/{id}.tmLanguage.json")
                }]
            }
        });

        let language_configuration = json!({
            "comments": { "lineComment": "#" },
            "brackets": [["{", "}"], ["[", "]"], ["(", ")"]],
            "autoClosingPairs": [
                { "open": "{", "close": "}" },
                { "open": "[", "close": "]" },
                { "open": "(", "close": ")" },
                { "open": "\"", "close": "\"", "notIn": ["string"] },
                { "open": "'", "close": "'", "notIn": ["string", "comment"] }
            ],
            "surroundingPairs": [["{", "}"], ["[", "]"], ["(", ")"], ["\"", "\""], ["'", "'"]],
            "indentationRules": {
                "increaseIndentPattern": r"^.*:\s*(#.*)?$",
                "decreaseIndentPattern": r"^\s*$"
            }
        });

        let keyword_patterns: Vec<Value> = keyword_groups(doc)
            .into_iter()
            .filter(|(_, words)| !words.is_empty())
            .map(|(group, words)| {
                json!({
                    "name": format!("{}.{id}", group.scope()),
                    "match": format!(r"\b({})\b", alternation(&words)),
                })
            })
            .collect();

        let string = |kind: &str, delimiter: &str| {
            json!({
                "name": format!("string.quoted.{kind}.{id}"),
                "begin": delimiter,
                "end": delimiter,
                "patterns": [{ "name": format!("constant.character.escape.{id}"), "match": r"\\." }]
            })
        };

        let grammar = json!({
            "$schema": "https://raw.githubusercontent.com/martinring/tmlanguage/master/tmlanguage.json",
            "name": name,
            "scopeName": format!("source.{id}"),
            "patterns": [
                { "include": "#comments" },
                { "include": "#strings" },
                { "include": "#decorator" },
                { "include": "#keywords" },
                { "include": "#numbers" },
                { "include": "#function-call" }
            ],
            "repository": {
                "keywords": { "patterns": keyword_patterns },
                "strings": {
                    "patterns": [
                        string("triple", "\"\"\""),
                        string("triple", "'''"),
                        string("double", "\""),
                        string("single", "'")
                    ]
                },
                "comments": {
                    "patterns": [{ "name": format!("comment.line.number-sign.{id}"), "match": "#.*$" }]
                },
                "numbers": {
                    "patterns": [{ "name": format!("constant.numeric.{id}"), "match": r"\b[0-9]+(\.[0-9]+)?\b" }]
                },
                "function-call": {
                    "patterns": [{
                        "match": r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(",
                        "captures": { "1": { "name": format!("entity.name.function.{id}") } }
                    }]
                },
                "decorator": {
                    "patterns": [{ "name": format!("entity.name.function.decorator.{id}"), "match": r"^\s*@[A-Za-z_][\w.]*" }]
                }
            }
        });

        let readme = format!(
            "# {name} VS Code Extension\n\nThis extension provides syntax highlighting for {name} files (`.{ext}`).\n",
            ext = info.extension()
        );

        Self {
            language_id: id,
            package,
            language_configuration,
            grammar,
            readme,
        }
    }

    /// `vscode-<language id>`, the directory used when none is given.
    pub fn default_dir(&self) -> PathBuf {
        PathBuf::from(format!("vscode-{}", self.language_id))
    }

    /// Write every file under `dir` and return their paths.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let syntaxes = dir.join("syntaxes");
        fs::create_dir_all(&syntaxes)
            .with_context(|| format!("failed to create {}", syntaxes.display()))?;

        let files = [
            (dir.join("package.json"), pretty(&self.package)?),
            (
                dir.join("language-configuration.json"),
                pretty(&self.language_configuration)?,
            ),
            (
                syntaxes.join(format!("{}.tmLanguage.json", self.language_id)),
                pretty(&self.grammar)?,
            ),
            (dir.join("README.md"), self.readme.clone()),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (path, contents) in files {
            fs::write(&path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), "extension file written");
            written.push(path);
        }
        Ok(written)
    }
}

fn pretty(value: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    text.push('\n');
    Ok(text)
}
