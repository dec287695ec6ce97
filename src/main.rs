mod completer;
mod report;
mod state;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use evala::{Evala, EvalaError};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use completer::EvalaHelper;
use report::report_error;
use state::{ReplState, echo_expression};

/// Exit code for lexical or syntax errors and unreadable scripts.
const EXIT_STATIC_ERROR: u8 = 65;
/// Exit code when the script fails at runtime.
const EXIT_RUNTIME_ERROR: u8 = 70;

/// Interpreter for the Evala scripting language
#[derive(Parser, Debug)]
#[command(name = "evala", version, about)]
struct Cli {
    /// Script to run; starts the REPL when omitted
    script: Option<PathBuf>,

    /// Grade the script's style before running it
    #[arg(long, requires = "script")]
    grade: bool,

    /// Directory the grade report is written to
    #[arg(long, default_value = "CodeReview")]
    report_dir: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut evala = Evala::new();
    match &cli.script {
        Some(path) => run_file(&mut evala, path, &cli),
        None => run_repl(&mut evala),
    }
}

fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(evala: &mut Evala, path: &Path, cli: &Cli) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", EvalaError::from(e));
            return ExitCode::from(EXIT_STATIC_ERROR);
        }
    };
    let filename = path.to_string_lossy();

    if cli.grade {
        match write_grade(&source, &cli.report_dir) {
            Ok(summary) => println!("{summary}"),
            Err(errors) => {
                for error in &errors {
                    report_error(error, &source, Some(&filename), std::io::stderr());
                }
                return ExitCode::from(EXIT_STATIC_ERROR);
            }
        }
    }

    let errors = evala.run(&source, std::io::stdout());
    for error in &errors {
        report_error(error, &source, Some(&filename), std::io::stderr());
    }

    if errors.iter().any(EvalaError::is_static) {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else if !errors.is_empty() {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

/// Writes `grade.md` into `dir` and returns the line to show the user.
fn write_grade(source: &str, dir: &Path) -> Result<String, Vec<EvalaError>> {
    let report = Evala::grade(source)?;
    let path = dir.join("grade.md");
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, report.render()))
        .map_err(|e| vec![EvalaError::from(e)])?;
    Ok(format!(
        "Grade written to {}. {}",
        path.display(),
        report.summary_line()
    ))
}

fn run_repl(evala: &mut Evala) -> ExitCode {
    let mut rl: Editor<EvalaHelper, _> = match Editor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not start the REPL: {err}");
            return ExitCode::FAILURE;
        }
    };
    rl.set_helper(Some(EvalaHelper::new()));
    let mut state = ReplState::new();

    loop {
        match rl.readline(&state.prompt()) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let Some(entry) = state.feed(&line) else {
                    continue;
                };

                let source = echo_expression(&entry);
                let errors = evala.run(&source, std::io::stdout());
                for error in &errors {
                    report_error(error, &source, None, std::io::stderr());
                }

                if let Some(helper) = rl.helper() {
                    helper.refresh_names(evala.variable_names());
                }
            }
            Err(ReadlineError::Interrupted) => {
                if state.is_idle() {
                    break;
                }
                state.cancel();
                println!();
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("REPL error: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
