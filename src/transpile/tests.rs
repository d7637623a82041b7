use super::*;

fn genz() -> Mapping {
    Mapping::from_pairs(
        &[
            ("skibidi", "def"),
            ("bussin", "print"),
            ("rizz", "return"),
            ("yeet", "if"),
            ("on god", "global"),
            ("god", "X"),
        ],
        &[(r"ratio\s+(\w+)", r"del \1")],
    )
    .unwrap()
}

fn forward(text: &str) -> String {
    let outcome = transpile(text, &genz(), Direction::Forward);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    outcome.text
}

#[test]
fn longest_phrase_wins() {
    assert_eq!(forward("on god counter"), "global counter");
    assert_eq!(forward("god counter"), "X counter");
}

#[test]
fn applies_special_pattern() {
    assert_eq!(forward("ratio counter"), "del counter");
    assert_eq!(forward("    ratio a; ratio b"), "    del a; del b");
}

#[test]
fn keeps_identifiers_that_contain_keywords() {
    assert_eq!(forward("rizzler = rizz_up(rizz)"), "rizzler = rizz_up(return)");
    assert_eq!(forward("yeeté yeet"), "yeeté if");
}

#[test]
fn leaves_strings_and_comments_alone() {
    assert_eq!(
        forward(r#"bussin("yeet rizz", 'on god') # yeet rizz"#),
        r#"print("yeet rizz", 'on god') # yeet rizz"#
    );
    assert_eq!(forward(r#"bussin("a \" yeet")"#), r#"print("a \" yeet")"#);
}

#[test]
fn tracks_triple_quoted_strings_across_lines() {
    let src = "doc = \"\"\"\nyeet rizz\n\"\"\"\nyeet ok:";
    assert_eq!(forward(src), "doc = \"\"\"\nyeet rizz\n\"\"\"\nif ok:");
}

#[test]
fn replacements_are_not_rescanned() {
    let mapping = Mapping::from_pairs(&[("a", "b"), ("b", "c")], &[]).unwrap();
    let outcome = transpile("a b", &mapping, Direction::Forward);
    assert_eq!(outcome.text, "b c");
}

#[test]
fn patterns_of_one_pass_do_not_overlap() {
    let mapping = Mapping::from_pairs(
        &[],
        &[(r"x\s+(\w+)", r"first(\1)"), (r"(\w+)\s+y", r"second(\1)")],
    )
    .unwrap();
    let outcome = transpile("x k y", &mapping, Direction::Forward);
    assert_eq!(outcome.text, "first(k) y");
}

#[test]
fn patterns_see_keyword_output() {
    let mapping =
        Mapping::from_pairs(&[("sus", "assert")], &[(r"assert\s+(\w+)", r"assert \1 is not None")])
            .unwrap();
    let outcome = transpile("sus thing", &mapping, Direction::Forward);
    assert_eq!(outcome.text, "assert thing is not None");
}

#[test]
fn pattern_may_carry_a_string_inside_a_group() {
    let mapping = Mapping::from_pairs(&[], &[(r"sus\s+(.+)", r"assert \1")]).unwrap();
    let outcome = transpile(r#"sus name == "sus""#, &mapping, Direction::Forward);
    assert_eq!(outcome.text, r#"assert name == "sus""#);
}

#[test]
fn pattern_may_not_rewrite_string_text() {
    let mapping = Mapping::from_pairs(&[], &[(r#"say\s+"hi""#, "print()")]).unwrap();
    let outcome = transpile(r#"say "hi""#, &mapping, Direction::Forward);
    assert_eq!(outcome.text, r#"say "hi""#);

    let mapping = Mapping::from_pairs(&[], &[(r"ratio\s+(\w+)", r"del \1")]).unwrap();
    let outcome = transpile(r#"x = "ratio y""#, &mapping, Direction::Forward);
    assert_eq!(outcome.text, r#"x = "ratio y""#);
}

#[test]
fn missing_group_leaves_occurrence_and_warns() {
    let mapping = Mapping::from_pairs(&[], &[(r"ratio\s+(\w+)", r"del \2")]).unwrap();
    let outcome = transpile("ok\nratio counter", &mapping, Direction::Forward);
    assert_eq!(outcome.text, "ok\nratio counter");
    assert_eq!(
        outcome.warnings,
        vec![Warning::PatternApplication {
            line: 2,
            pattern: r"ratio\s+(\w+)".into(),
            group: "2".into(),
        }]
    );
}

#[test]
fn optional_group_that_did_not_participate_warns() {
    let mapping = Mapping::from_pairs(&[], &[(r"cap(\s+fr)?", r"False\1")]).unwrap();
    let outcome = transpile("x = cap fr\ny = cap", &mapping, Direction::Forward);
    assert_eq!(outcome.text, "x = False fr\ny = cap");
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].line(), 2);
}

#[test]
fn multi_line_expansion_keeps_source_indentation() {
    let mapping = Mapping::from_pairs(
        &[],
        &[(
            r"yolo\s+(\w+)",
            "try:\n    \\1()\nexcept Exception:\n    pass",
        )],
    )
    .unwrap();
    let outcome = transpile("    yolo run\nnext", &mapping, Direction::Forward);
    assert_eq!(
        outcome.text,
        "    try:\n        run()\n    except Exception:\n        pass\nnext"
    );
}

#[test]
fn backward_restores_custom_words() {
    let outcome = transpile(
        "def f():\n    if x:\n        return 1",
        &genz(),
        Direction::Backward,
    );
    assert_eq!(outcome.text, "skibidi f():\n    yeet x:\n        rizz 1");
}

#[test]
fn backward_undoes_patterns_before_keywords() {
    let outcome = transpile("if x: del y", &genz(), Direction::Backward);
    assert_eq!(outcome.text, "yeet x: ratio y");
}

#[test]
fn empty_text_stays_empty() {
    let outcome = transpile("", &genz(), Direction::Forward);
    assert_eq!(outcome.text, "");
    assert!(outcome.warnings.is_empty());
}

#[test]
fn keeps_trailing_newline() {
    assert_eq!(forward("yeet x:\n    rizz 1\n"), "if x:\n    return 1\n");
}
