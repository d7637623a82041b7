use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vernacular::banner;
use vernacular::config::{self, Settings};
use vernacular::highlight::Extension;
use vernacular::rules::Direction;
use vernacular::session::Session;
use vernacular::Warning;

const VERNACULAR_VERSION: &str = env!("CARGO_PKG_VERSION");
const VERNACULAR_ABOUT: &str =
    "Vernacular – rewrite code written in your own vocabulary into Python, and back.";

/// Bidirectional keyword/phrase transpiler between a custom vocabulary and Python.
#[derive(Parser, Debug)]
#[command(name = "vernacular", version)]
struct Cli {
    /// Mapping document (JSON) describing the custom vocabulary
    #[arg(short, long, global = true, value_name = "FILE", env = config::MAPPING_ENV)]
    mapping: Option<PathBuf>,

    /// Log at debug level (overrides VERNACULAR_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transpile a file (custom → Python, or Python → custom with -r)
    Transpile {
        /// Source file
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Python → custom vocabulary
        #[arg(short, long)]
        reverse: bool,

        /// Substitute only; skip indentation repair and decorator fixes
        #[arg(long)]
        raw: bool,
    },

    /// Interactive mode: enter a block, finish it with an empty line
    Repl,

    /// Validate the mapping and print a summary
    Check,

    /// Generate a VS Code syntax-highlighting extension for the vocabulary
    Vscode {
        /// Target directory (default: vscode-<language id>)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print information about Vernacular
    About,
}

fn print_about() {
    println!("🌌 {VERNACULAR_ABOUT} (version {VERNACULAR_VERSION})");
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

fn print_repl_help() {
    println!(
        r#"
Vernacular REPL — help

Blocks:
────────────────────────────────
Type one or more lines, then an empty line → the block is transpiled
The output is printed right away; warnings go to stderr

Commands (alone in a block):
────────────────────────────────
reverse                        → Switch direction (custom → Python / Python → custom)
history                        → Show every block of this session
about                          → About Vernacular
help                           → This help
exit                           → Leave the REPL
"#
    );
}

fn describe(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "custom → Python",
        Direction::Backward => "Python → custom",
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    config::init_logging(&settings, cli.debug);

    match run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, settings: Settings) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Repl);
    if let Commands::About = command {
        print_about();
        return Ok(());
    }

    let mut session = Session::open(settings, cli.mapping)?;
    match command {
        Commands::Transpile {
            input,
            output,
            reverse,
            raw,
        } => {
            let direction = if reverse {
                Direction::Backward
            } else {
                Direction::Forward
            };
            let outcome = session.transpile_file(&input, output.as_deref(), direction, raw)?;
            print_warnings(&outcome.warnings);
            match output {
                Some(path) => println!("Transpiled to {}", path.display()),
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(outcome.text.as_bytes())?;
                    if !outcome.text.ends_with('\n') {
                        stdout.write_all(b"\n")?;
                    }
                }
            }
        }
        Commands::Repl => repl(&mut session)?,
        Commands::Check => check(&session),
        Commands::Vscode { output } => {
            let extension = Extension::from_mapping(session.mapping());
            let dir = output.unwrap_or_else(|| extension.default_dir());
            let written = extension
                .write(&dir)
                .with_context(|| format!("failed to generate extension in {}", dir.display()))?;
            println!("VS Code extension written to {}", dir.display());
            for path in written {
                println!("  {}", path.display());
            }
        }
        Commands::About => print_about(),
    }
    Ok(())
}

fn check(session: &Session) {
    let mapping = session.mapping();
    let info = mapping.language_info();
    let invertible = mapping.rules(Direction::Backward).patterns().count();
    let reverse = mapping.document().reverse_keywords().len();

    println!("✅ Mapping OK: {} (.{})", info.display_name(), info.extension());
    println!("   keywords:          {}", mapping.keywords().len());
    println!(
        "   special patterns:  {} ({invertible} invertible)",
        mapping.special_patterns().len()
    );
    if mapping.document().is_losslessly_invertible() {
        println!("   reverse keywords:  {reverse} (lossless)");
    } else {
        println!(
            "   reverse keywords:  {reverse} ({} dropped: shared host words)",
            mapping.keywords().len() - reverse
        );
    }
}

fn repl(session: &mut Session) -> Result<()> {
    let language = session.mapping().language_info().display_name().to_string();
    banner::print_repl_banner(&language, session.settings().color);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    loop {
        println!(
            "Enter {language} code (finish with an empty line) [{}]:",
            describe(session.direction())
        );

        let mut block = String::new();
        let mut eof = false;
        loop {
            print!("... ");
            stdout.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                eof = true;
                break;
            }
            if line.trim().is_empty() {
                break;
            }
            block.push_str(&line);
        }

        match block.trim() {
            "exit" | "quit" => {
                println!("Exiting...");
                break;
            }
            "help" => print_repl_help(),
            "about" => print_about(),
            "reverse" => {
                let direction = session.toggle_direction();
                println!("Direction: {}", describe(direction));
            }
            "history" => {
                if session.history().is_empty() {
                    println!("(no history yet)");
                }
                for (n, entry) in session.history().iter().enumerate() {
                    println!("── #{} {} ──", n + 1, describe(entry.direction));
                    println!("{}", entry.input);
                    println!("⇒");
                    println!("{}", entry.output);
                }
            }
            "" => {}
            _ => {
                let outcome = session.submit(block.trim_end());
                print_warnings(&outcome.warnings);
                println!("{}", outcome.text);
            }
        }

        if eof {
            break;
        }
    }
    Ok(())
}
