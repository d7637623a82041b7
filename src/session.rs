//! Per-invocation context for the command-line tools.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::config::{Settings, MAPPING_ENV};
use crate::engine::{self, Outcome};
use crate::mapping::Mapping;
use crate::rules::Direction;

/// One REPL submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub direction: Direction,
    pub input: String,
    pub output: String,
}

/// The loaded mapping, the settings and the REPL state of one run.
#[derive(Debug, Clone)]
pub struct Session {
    mapping: Arc<Mapping>,
    settings: Settings,
    direction: Direction,
    history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new(mapping: Arc<Mapping>, settings: Settings) -> Self {
        Self {
            mapping,
            settings,
            direction: Direction::Forward,
            history: Vec::new(),
        }
    }

    /// Load the mapping named by `path`, or by the settings when `None`.
    pub fn open(settings: Settings, path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path.or_else(|| settings.mapping.clone()) else {
            bail!("no mapping document given; pass --mapping or set {MAPPING_ENV}");
        };
        let mapping = Mapping::load(&path)
            .with_context(|| format!("failed to load mapping {}", path.display()))?;
        Ok(Self::new(Arc::new(mapping), settings))
    }

    pub fn mapping(&self) -> &Arc<Mapping> {
        &self.mapping
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Flip the REPL direction and return the new one.
    pub fn toggle_direction(&mut self) -> Direction {
        self.direction = self.direction.reversed();
        self.direction
    }

    /// Full pipeline: forward text is reconciled and its decorators fixed.
    pub fn transpile(&self, text: &str, direction: Direction) -> Outcome {
        engine::run(
            text,
            &self.mapping,
            direction,
            false,
            &self.settings.reconcile_options(),
        )
    }

    /// Substitution only.
    pub fn transpile_raw(&self, text: &str, direction: Direction) -> Outcome {
        engine::run(
            text,
            &self.mapping,
            direction,
            true,
            &self.settings.reconcile_options(),
        )
    }

    /// Transpile a file. With `output` the result is written there too.
    pub fn transpile_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        direction: Direction,
        raw: bool,
    ) -> Result<Outcome> {
        let source = fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let outcome = if raw {
            self.transpile_raw(&source, direction)
        } else {
            self.transpile(&source, direction)
        };
        if let Some(output) = output {
            fs::write(output, &outcome.text)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
        Ok(outcome)
    }

    /// Transpile a REPL block in the current direction and remember it.
    pub fn submit(&mut self, text: &str) -> Outcome {
        let outcome = self.transpile(text, self.direction);
        self.history.push(HistoryEntry {
            direction: self.direction,
            input: text.to_string(),
            output: outcome.text.clone(),
        });
        outcome
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}
