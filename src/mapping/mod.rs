//! Mapping documents.
//!
//! A mapping is a JSON document with three sections:
//!
//! ```json
//! {
//!   "keywords":         { "skibidi": "def", "on god": "global" },
//!   "special_patterns": { "ratio\\s+(\\w+)": "del \\1" },
//!   "language_info":    { "name": "GenZ", "file_extension": ".genz" }
//! }
//! ```
//!
//! `keywords` is required. Both rule sections keep their document order, so
//! pattern precedence and the tie-break between equally long keywords are
//! whatever the author wrote. A [`Mapping`] validates the document and
//! compiles the rules for both directions once, up front.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MappingError;
use crate::rules::{self, by_phrase_length, Direction, RuleSet};

/// String pairs in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairs(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for Pairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Pairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of string to string")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Pairs, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((k, v)) = map.next_entry::<String, String>()? {
                    pairs.push((k, v));
                }
                Ok(Pairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Free-form metadata. Only the harness reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LanguageInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("CustomLanguage")
    }

    pub fn display_description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or("A custom programming language")
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &str {
        let ext = self.file_extension.as_deref().unwrap_or(".custom");
        ext.strip_prefix('.').unwrap_or(ext)
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    keywords: Option<Pairs>,
    special_patterns: Option<Pairs>,
    language_info: Option<LanguageInfo>,
}

/// A mapping document whose shape has been validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingDocument {
    pub keywords: Vec<(String, String)>,
    pub special_patterns: Vec<(String, String)>,
    pub language_info: LanguageInfo,
}

impl MappingDocument {
    pub fn from_json(src: &str) -> Result<Self, MappingError> {
        let raw: RawDocument = serde_json::from_str(src)?;
        let doc = Self {
            keywords: raw.keywords.ok_or(MappingError::MissingSection("keywords"))?.0,
            special_patterns: raw.special_patterns.unwrap_or_default().0,
            language_info: raw.language_info.unwrap_or_default(),
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Shape checks. Regex validity is checked by [`rules::compile`].
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut seen = HashSet::new();
        for (key, value) in &self.keywords {
            if key.trim().is_empty() {
                return Err(MappingError::EmptyKeyword {
                    section: "keywords",
                    value: value.clone(),
                });
            }
            if value.trim().is_empty() {
                return Err(MappingError::EmptyReplacement {
                    section: "keywords",
                    key: key.clone(),
                });
            }
            if !seen.insert(key.as_str()) {
                return Err(MappingError::DuplicateKey {
                    section: "keywords",
                    key: key.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (pattern, template) in &self.special_patterns {
            if pattern.is_empty() {
                return Err(MappingError::EmptyKeyword {
                    section: "special_patterns",
                    value: template.clone(),
                });
            }
            if !seen.insert(pattern.as_str()) {
                return Err(MappingError::DuplicateKey {
                    section: "special_patterns",
                    key: pattern.clone(),
                });
            }
        }
        Ok(())
    }

    /// Host → custom keyword pairs.
    ///
    /// Walks the keywords longest phrase first; when several custom phrases
    /// share a host phrase, the first one seen wins and the rest are dropped.
    pub fn reverse_keywords(&self) -> Vec<(String, String)> {
        let mut sorted: Vec<&(String, String)> = self.keywords.iter().collect();
        sorted.sort_by(|a, b| by_phrase_length(&a.0, &b.0));

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(sorted.len());
        for (custom, host) in sorted {
            let host_key = host.split_whitespace().collect::<Vec<_>>().join(" ");
            if seen.insert(host_key) {
                out.push((host.clone(), custom.clone()));
            } else {
                tracing::debug!(custom = %custom, host = %host, "host phrase already claimed; dropped from reverse mapping");
            }
        }
        out
    }

    /// Every host phrase has exactly one custom phrase.
    pub fn is_losslessly_invertible(&self) -> bool {
        self.reverse_keywords().len() == self.keywords.len()
    }
}

/// A validated mapping with rules compiled for both directions.
#[derive(Debug, Clone)]
pub struct Mapping {
    document: MappingDocument,
    forward: RuleSet,
    backward: RuleSet,
}

impl Mapping {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&src)
    }

    pub fn from_json(src: &str) -> Result<Self, MappingError> {
        Self::from_document(MappingDocument::from_json(src)?)
    }

    pub fn from_document(document: MappingDocument) -> Result<Self, MappingError> {
        document.validate()?;
        let forward = rules::compile(&document, Direction::Forward)?;
        let backward = rules::compile(&document, Direction::Backward)?;
        tracing::debug!(
            keywords = document.keywords.len(),
            patterns = document.special_patterns.len(),
            forward_rules = forward.len(),
            backward_rules = backward.len(),
            "mapping compiled"
        );
        Ok(Self {
            document,
            forward,
            backward,
        })
    }

    /// Build a mapping from literal pairs, without metadata.
    pub fn from_pairs(keywords: &[(&str, &str)], patterns: &[(&str, &str)]) -> Result<Self, MappingError> {
        let own = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self::from_document(MappingDocument {
            keywords: own(keywords),
            special_patterns: own(patterns),
            language_info: LanguageInfo::default(),
        })
    }

    pub fn rules(&self, direction: Direction) -> &RuleSet {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    pub fn keywords(&self) -> &[(String, String)] {
        &self.document.keywords
    }

    pub fn special_patterns(&self) -> &[(String, String)] {
        &self.document.special_patterns
    }

    pub fn language_info(&self) -> &LanguageInfo {
        &self.document.language_info
    }
}
