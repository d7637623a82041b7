use crate::decorators::normalize_decorators;
use crate::error::Warning;
use crate::mapping::Mapping;
use crate::reconcile::{reconcile_with, ReconcileOptions};
use crate::rules::Direction;
use crate::transpile::transpile;

/// Text produced by one stage plus the warnings it raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub text: String,
    pub warnings: Vec<Warning>,
}

impl Outcome {
    pub fn clean(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warnings: Vec::new(),
        }
    }

    /// Feed the text into the next stage and keep every warning.
    pub fn then(mut self, stage: impl FnOnce(&str) -> Outcome) -> Outcome {
        let next = stage(&self.text);
        self.warnings.extend(next.warnings);
        Outcome {
            text: next.text,
            warnings: self.warnings,
        }
    }
}

/* ───────────────────── Preprocessing ───────────────────── */

/// Normalize raw input before any rule sees it.
pub fn preprocess(input: &str) -> String {
    // 1) Remove BOM if present
    let s = input.strip_prefix('\u{feff}').unwrap_or(input);
    // 2) Normalize line endings CRLF/CR -> LF
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    // 3) Tabs in leading indentation -> 4 spaces
    if !s.contains('\t') {
        return s;
    }
    s.split('\n')
        .map(|line| {
            let body = line.trim_start_matches([' ', '\t']);
            let indent = &line[..line.len() - body.len()];
            format!("{}{body}", indent.replace('\t', "    "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/* ───────────────────── Pipelines ───────────────────── */

/// Custom source → host source: substitute, reconcile, fix decorators.
pub fn full_forward(input: &str, mapping: &Mapping) -> Outcome {
    full_forward_with(input, mapping, &ReconcileOptions::default())
}

pub fn full_forward_with(input: &str, mapping: &Mapping, options: &ReconcileOptions) -> Outcome {
    Outcome::clean(preprocess(input))
        .then(|text| transpile(text, mapping, Direction::Forward))
        .then(|text| reconcile_with(text, options))
        .then(normalize_decorators)
}

/// Host source → custom source. Indentation is kept as written.
pub fn full_backward(input: &str, mapping: &Mapping) -> Outcome {
    Outcome::clean(preprocess(input)).then(|text| transpile(text, mapping, Direction::Backward))
}

/// Run the pipeline for `direction`; `raw` stops after substitution.
pub fn run(
    input: &str,
    mapping: &Mapping,
    direction: Direction,
    raw: bool,
    options: &ReconcileOptions,
) -> Outcome {
    match (direction, raw) {
        (Direction::Forward, false) => full_forward_with(input, mapping, options),
        (direction, _) => {
            Outcome::clean(preprocess(input)).then(|text| transpile(text, mapping, direction))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genz() -> Mapping {
        Mapping::from_pairs(
            &[
                ("skibidi", "def"),
                ("toilet", "class"),
                ("bussin", "print"),
                ("rizz", "return"),
                ("yeet", "if"),
                ("ohio", "import"),
                ("finna", "try"),
                ("bruh", "except"),
                ("simp", "as"),
            ],
            &[(r"ratio\s+(\w+)", r"del \1")],
        )
        .unwrap()
    }

    #[test]
    fn preprocess_strips_bom_and_line_endings() {
        assert_eq!(preprocess("\u{feff}a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn preprocess_expands_leading_tabs_only() {
        assert_eq!(preprocess("\tx = 'a\tb'\n \ty"), "    x = 'a\tb'\n     y");
    }

    #[test]
    fn then_collects_warnings_in_order() {
        let first = Warning::DecoratorMisuse {
            line: 1,
            decorator: "@a".into(),
        };
        let second = Warning::ReconciliationAmbiguity {
            line: 2,
            reason: "r".into(),
        };
        let out = Outcome {
            text: "a".into(),
            warnings: vec![first.clone()],
        }
        .then(|t| Outcome {
            text: format!("{t}b"),
            warnings: vec![second.clone()],
        });
        assert_eq!(out.text, "ab");
        assert_eq!(out.warnings, vec![first, second]);
    }

    #[test]
    fn translates_example_program() {
        let src = "\
ohio math

toilet Greeter:
  skibidi hello(self, name):
    yeet name:
      bussin(\"hi \" + name)
    rizz math.pi
";
        let expected = "\
import math

class Greeter:
    def hello(self, name):
        if name:
            print(\"hi \" + name)
        return math.pi
";
        let outcome = full_forward(src, &genz());
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.text, expected);
    }

    #[test]
    fn try_except_expansion_is_aligned() {
        let src = "finna:\n        bussin(1)\n    bruh ValueError simp e:\nbussin(e)";
        let outcome = full_forward(src, &genz());
        assert_eq!(
            outcome.text,
            "try:\n    print(1)\nexcept ValueError as e:\n    print(e)"
        );
    }

    #[test]
    fn decorator_keeps_class_body() {
        let outcome = full_forward("toilet A:\n  @property\nskibidi f(self):\n  rizz 1", &genz());
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(
            outcome.text,
            "class A:\n    @property\n    def f(self):\n        return 1"
        );
    }

    #[test]
    fn backward_keeps_indentation() {
        let outcome = full_backward("def f():\n  del x\n  return 1", &genz());
        assert_eq!(outcome.text, "skibidi f():\n  ratio x\n  rizz 1");
    }

    #[test]
    fn raw_forward_skips_reconcile() {
        let options = ReconcileOptions::default();
        let outcome = run("yeet x:\nbussin(x)", &genz(), Direction::Forward, true, &options);
        assert_eq!(outcome.text, "if x:\nprint(x)");
        let outcome = run("yeet x:\nbussin(x)", &genz(), Direction::Forward, false, &options);
        assert_eq!(outcome.text, "if x:\n    print(x)");
    }
}
