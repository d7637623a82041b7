//! Settings read from the environment.
//!
//! | variable             | meaning                                  |
//! |----------------------|------------------------------------------|
//! | `VERNACULAR_MAPPING` | mapping document used when `-m` is absent |
//! | `VERNACULAR_INDENT`  | spaces per block level (default 4)        |
//! | `VERNACULAR_LOG`     | `tracing` filter (default `warn`)         |
//! | `NO_COLOR`           | disable ANSI colour in banners            |

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::reconcile::ReconcileOptions;

pub const MAPPING_ENV: &str = "VERNACULAR_MAPPING";
pub const INDENT_ENV: &str = "VERNACULAR_INDENT";
pub const LOG_ENV: &str = "VERNACULAR_LOG";

const DEFAULT_INDENT: usize = 4;
const MAX_INDENT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mapping: Option<PathBuf>,
    pub indent_width: usize,
    pub log_filter: String,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mapping: None,
            indent_width: DEFAULT_INDENT,
            log_filter: "warn".to_string(),
            color: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Bad values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let indent_width = match lookup(INDENT_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if (1..=MAX_INDENT).contains(&n) => n,
                _ => {
                    tracing::warn!(value = %raw, "{INDENT_ENV} must be 1..={MAX_INDENT}; using {DEFAULT_INDENT}");
                    DEFAULT_INDENT
                }
            },
            None => defaults.indent_width,
        };
        Self {
            mapping: lookup(MAPPING_ENV)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            indent_width,
            log_filter: lookup(LOG_ENV)
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.log_filter),
            color: lookup("NO_COLOR").is_none(),
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            indent_width: self.indent_width,
        }
    }
}

/// Install the stderr `tracing` subscriber. `debug` overrides the filter.
pub fn init_logging(settings: &Settings, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(settings.color)
        .with_target(false)
        .try_init();
}
