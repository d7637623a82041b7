use assert_cmd::Command;
use predicates::str::contains;

const GENZ: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/genz.json");

fn vernacular() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vernacular").expect("bin build");
    cmd.env_remove("VERNACULAR_MAPPING")
        .env_remove("VERNACULAR_INDENT")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_argument_commands_work() {
    vernacular()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("transpile"))
        .stdout(contains("vscode"));

    vernacular()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));

    vernacular()
        .arg("about")
        .assert()
        .success()
        .stdout(contains("Vernacular"));
}

#[test]
fn cli_requires_a_mapping() {
    vernacular()
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("no mapping document"));
}

#[test]
fn cli_reads_mapping_from_environment() {
    vernacular()
        .env("VERNACULAR_MAPPING", GENZ)
        .arg("check")
        .assert()
        .success()
        .stdout(contains("Mapping OK: GenZ"));
}

#[test]
fn cli_interactive_meta_commands_work() {
    // Interactive mode reads a "block" until an empty line.
    // So each command here is followed by a blank line.
    vernacular()
        .args(["-m", GENZ, "repl"])
        .write_stdin("help\n\nhistory\n\nreverse\n\nabout\n\nexit\n\n")
        .assert()
        .success()
        .stdout(contains("Vernacular REPL — help"))
        .stdout(contains("(no history yet)"))
        .stdout(contains("Direction: Python → custom"))
        .stdout(contains("Vernacular – rewrite code"))
        .stdout(contains("Exiting"));
}

#[test]
fn cli_interactive_transpiles_blocks() {
    vernacular()
        .args(["-m", GENZ])
        .write_stdin("yeet x:\nbussin(x)\n\nreverse\n\nprint(1)\n\nhistory\n\n")
        .assert()
        .success()
        .stdout(contains("if x:\n    print(x)"))
        .stdout(contains("bussin(1)"))
        .stdout(contains("── #1 custom → Python ──"))
        .stdout(contains("── #2 Python → custom ──"));
}

#[test]
fn cli_interactive_reports_warnings_on_stderr() {
    vernacular()
        .args(["-m", GENZ, "repl"])
        .write_stdin("@cache\nx = 1\n\nexit\n\n")
        .assert()
        .success()
        .stdout(contains("@cache\nx = 1"))
        .stderr(contains("warning: line 1: decorator `@cache`"));
}
