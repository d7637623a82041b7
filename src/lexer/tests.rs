//! Unit tests for the lexer (zone scanner).

use super::{indent_width, scan, scan_line, Scanner, State, Zone, ZoneKind};

#[test]
fn finds_comment_outside_quotes() {
    let src = r#"bussin("hi") # yeet"#;
    let scan = scan_line(src, State::Code, 0);
    assert_eq!(
        scan.zones,
        vec![
            Zone {
                start: 7,
                end: 11,
                kind: ZoneKind::Str,
            },
            Zone {
                start: 13,
                end: src.len(),
                kind: ZoneKind::Comment,
            },
        ]
    );
    assert_eq!(scan.masked(src), "bussin(_) ");
}

#[test]
fn keeps_comment_markers_inside_quotes() {
    let src = r##"x = "# not a comment" + 'also # not'"##;
    let scan = scan_line(src, State::Code, 0);
    assert!(scan.zones.iter().all(|z| z.kind == ZoneKind::Str));
    assert_eq!(scan.zones.len(), 2);
    assert_eq!(scan.masked(src), "x = _ + _");
}

#[test]
fn honours_backslash_escapes() {
    let src = r#"s = "say \"yeet\" now" yeet"#;
    let scan = scan_line(src, State::Code, 0);
    assert_eq!(scan.zones.len(), 1);
    assert_eq!(&src[scan.zones[0].start..scan.zones[0].end], r#""say \"yeet\" now""#);
    assert!(!scan.unterminated);
}

#[test]
fn triple_quotes_span_lines() {
    let src = "doc = \"\"\"first\nyeet inside\nend\"\"\" + x\ny = 1";
    let scans = scan(src);
    assert_eq!(scans.len(), 4);
    assert_eq!(scans[0].exit, State::Triple('"'));
    assert_eq!(scans[1].entry, State::Triple('"'));
    assert_eq!(scans[1].zones.len(), 1);
    assert_eq!(scans[1].zones[0].start, 0);
    assert_eq!(scans[1].zones[0].end, "yeet inside".len());
    assert_eq!(scans[2].exit, State::Code);
    assert_eq!(scans[2].masked("end\"\"\" + x"), "_ + x");
    assert!(!scans[3].is_continuation());
}

#[test]
fn flags_unterminated_single_line_string() {
    let scan = scan_line("x = 'oops:", State::Code, 0);
    assert!(scan.unterminated);
    assert_eq!(scan.masked("x = 'oops:"), "x = _");
}

#[test]
fn tracks_brackets_and_backslashes() {
    let mut scanner = Scanner::new();
    let first = scanner.next_line("total = add(1,");
    let second = scanner.next_line("    2)");
    let third = scanner.next_line("x = 1 + \\");
    let fourth = scanner.next_line("    2");

    assert!(!first.is_continuation());
    assert!(!first.ends_statement());
    assert!(second.is_continuation());
    assert!(second.ends_statement());
    assert!(third.continues);
    assert!(fourth.is_continuation());
    assert!(!fourth.continues);
    assert_eq!(fourth.exit, State::Code);
}

#[test]
fn newline_inside_replacement_ends_comment() {
    let src = "try: # go\nrisky()";
    let scan = scan_line(src, State::Code, 0);
    assert_eq!(scan.zones.len(), 1);
    assert_eq!(scan.zones[0].end, "try: # go".len());
}

#[test]
fn measures_indentation() {
    assert_eq!(indent_width("    x", 4), 4);
    assert_eq!(indent_width("\t  x", 4), 6);
    assert_eq!(indent_width("x", 4), 0);
}
