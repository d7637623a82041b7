//! Unit tests for the rule compiler.

use super::*;
use crate::mapping::MappingDocument;

fn doc(keywords: &[(&str, &str)], patterns: &[(&str, &str)]) -> MappingDocument {
    let own = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    MappingDocument {
        keywords: own(keywords),
        special_patterns: own(patterns),
        ..Default::default()
    }
}

#[test]
fn orders_keywords_longest_phrase_first() {
    let d = doc(
        &[("god", "X"), ("on god", "global"), ("rizzler", "self"), ("no cap", "True")],
        &[],
    );
    let set = compile(&d, Direction::Forward).unwrap();
    let order: Vec<&str> = set.words().map(|w| w.from.as_str()).collect();
    // Two-token phrases first (longer before shorter), then single words.
    assert_eq!(order, vec!["on god", "no cap", "rizzler", "god"]);
}

#[test]
fn keyword_matches_only_whole_words() {
    let rule = WordRule::new("rizz", "return").unwrap();
    assert_eq!(rule.find_at("rizzler rizz", 0), Some((8, 12)));
    assert_eq!(rule.find_at("_rizz", 0), None);
    assert_eq!(rule.find_at("(rizz)", 0), Some((1, 5)));
}

#[test]
fn phrase_matches_across_extra_spaces() {
    let rule = WordRule::new("on god", "global").unwrap();
    assert_eq!(rule.find_at("x on   god y", 0), Some((2, 10)));
    assert_eq!(rule.find_at("bon god", 0), None);
}

#[test]
fn rejected_candidate_does_not_hide_a_later_match() {
    let rule = WordRule::new("a a", "b").unwrap();
    assert_eq!(rule.find_at("ba a a", 0), Some((3, 6)));
}

#[test]
fn invalid_pattern_names_source_and_position() {
    let d = doc(&[("yeet", "if")], &[("ok\\s+(\\w+)", "\\1"), ("bad(", "x")]);
    let err = compile(&d, Direction::Forward).unwrap_err();
    match err {
        MappingError::InvalidPattern { index, pattern, .. } => {
            assert_eq!(index, 1);
            assert_eq!(pattern, "bad(");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn forward_runs_keywords_then_patterns() {
    let d = doc(&[("yeet", "if")], &[(r"ratio\s+(\w+)", r"del \1")]);
    let set = compile(&d, Direction::Forward).unwrap();
    let passes: Vec<&[Rule]> = set.passes().collect();
    assert_eq!(passes.len(), 2);
    assert!(matches!(passes[0][0], Rule::Word(_)));
    assert!(matches!(passes[1][0], Rule::Pattern(_)));
}

#[test]
fn backward_runs_inverted_patterns_then_keywords() {
    let d = doc(&[("yeet", "if")], &[(r"ratio\s+(\w+)", r"del \1")]);
    let set = compile(&d, Direction::Backward).unwrap();
    assert_eq!(set.direction(), Direction::Backward);
    assert!(matches!(set.rules()[0], Rule::Pattern(_)));
    let word = set.words().next().unwrap();
    assert_eq!((word.from.as_str(), word.to.as_str()), ("if", "yeet"));
}

#[test]
fn inverts_simple_pattern() {
    let rule = PatternRule::new(0, r"ratio\s+(\w+)", r"del \1").unwrap();
    let inverse = rule.invert().expect("invertible");
    assert_eq!(inverse.source, r"\bdel\s+(\w+)");
    assert_eq!(
        inverse.template.pieces(),
        &[
            Piece::Text("ratio ".into()),
            Piece::Group(GroupRef::Index(1))
        ]
    );
}

#[test]
fn inverts_reordered_groups() {
    let rule = PatternRule::new(0, r"(\w+)\s+stan\s+(\w+)", r"\2.append(\1)").unwrap();
    let inverse = rule.invert().expect("invertible");
    let caps = inverse.regex().captures("items.append(x)").unwrap();
    assert_eq!(inverse.template.expand(&caps).unwrap(), "x stan items");
}

#[test]
fn skips_lossy_patterns() {
    let cases = [
        // Group dropped by the template.
        (r"sus\s+(\w+)\s+(\w+)", r"assert \1"),
        // Alternation cannot be inverted.
        (r"(?:no|nah)\s+cap", "True"),
        (r"cap|nah", "False"),
        // Multi-line expansion.
        (r"yolo\s+(.+)", "try:\n\\1\nexcept Exception:\npass"),
        // Template without literal text.
        (r"lowkey\s+(\w+)", r"\1"),
    ];
    for (pattern, template) in cases {
        let rule = PatternRule::new(0, pattern, template).unwrap();
        assert!(rule.invert().is_none(), "{pattern} should not invert");
    }
}

#[test]
fn backward_drops_duplicate_inverses() {
    let d = doc(
        &[],
        &[(r"ratio\s+(\w+)", r"del \1"), (r"unalive\s+(\w+)", r"del \1")],
    );
    let set = compile(&d, Direction::Backward).unwrap();
    let patterns: Vec<&PatternRule> = set.patterns().collect();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].index, 0);
}

#[test]
fn parses_template_references() {
    let t = Template::parse(r"del \1 ${2}$name\g<3>\g<tail> $$ \n");
    assert_eq!(
        t.pieces(),
        &[
            Piece::Text("del ".into()),
            Piece::Group(GroupRef::Index(1)),
            Piece::Text(" ".into()),
            Piece::Group(GroupRef::Index(2)),
            Piece::Group(GroupRef::Name("name".into())),
            Piece::Group(GroupRef::Index(3)),
            Piece::Group(GroupRef::Name("tail".into())),
            Piece::Text(" $ \n".into()),
        ]
    );
    assert!(t.is_multiline());
}

#[test]
fn expand_reports_missing_group() {
    let rule = PatternRule::new(0, r"ratio\s+(\w+)", r"del \2").unwrap();
    let caps = rule.regex().captures("ratio counter").unwrap();
    assert_eq!(rule.template.expand(&caps), Err(GroupRef::Index(2)));
}

#[test]
fn parses_direction_names() {
    assert_eq!("forward".parse::<Direction>(), Ok(Direction::Forward));
    assert_eq!("Reverse".parse::<Direction>(), Ok(Direction::Backward));
    assert!("sideways".parse::<Direction>().is_err());
    assert_eq!(Direction::Forward.reversed(), Direction::Backward);
}
