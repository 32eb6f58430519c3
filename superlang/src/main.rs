//! SuperLanguage CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use superlang::error::report_error;
use superlang::interp::{DEFAULT_MAX_CALL_DEPTH, Interpreter};
use superlang::logging::init_tracing;
use superlang::repl::Repl;
use superlang::{Session, SessionError};
use tracing::info;

#[derive(Parser)]
#[command(name = "superlang", version, about = "SuperLanguage interpreter")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a source file, then read further statements from stdin
    Run {
        /// Source file to run
        file: PathBuf,
        /// Do not read statements from stdin after the file
        #[arg(long)]
        no_repl: bool,
        /// Maximum number of nested calls
        #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
        max_call_depth: usize,
    },
    /// Start an interactive session
    Repl,
    /// Parse and dump the resolved AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Run {
            file,
            no_repl,
            max_call_depth,
        } => run_file(&file, no_repl, max_call_depth),
        Command::Repl => start_repl(),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    };

    match result {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code & 0xff).unwrap_or(1))
}

fn run_file(path: &Path, no_repl: bool, max_call_depth: usize) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let mut interpreter = Interpreter::new();
    interpreter.set_max_call_depth(max_call_depth);
    let mut session = Session::with_interpreter(interpreter);

    info!(file = %filename, "running");
    match session.run_source(&source) {
        Ok(()) => {}
        Err(SessionError::Compile(err)) => {
            report_error(&filename, &source, &err);
            return Ok(1);
        }
        Err(err @ SessionError::Runtime(_)) => {
            eprintln!("{err}");
            return Ok(err.exit_code());
        }
    }

    let recovered = session.interpreter_mut().take_diagnostics().len();
    if recovered > 0 {
        info!(errors = recovered, "recovered from runtime errors");
    }

    if no_repl {
        return Ok(0);
    }
    let mut repl = Repl::with_session(session)?;
    Ok(repl.run()?)
}

fn start_repl() -> Result<i32, Box<dyn std::error::Error>> {
    let mut repl = Repl::new()?;
    Ok(repl.run()?)
}

fn parse_file(path: &Path) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let ast = superlang::lexer::tokenize(&source).and_then(superlang::parser::parse);
    match ast {
        Ok(ast) => {
            println!("{}", serde_json::to_string_pretty(&ast)?);
            Ok(0)
        }
        Err(err) => {
            report_error(&filename, &source, &err);
            Ok(1)
        }
    }
}

fn tokenize_file(path: &Path) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    match superlang::lexer::tokenize(&source) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                println!("{span}\t{tok:?}");
            }
            Ok(0)
        }
        Err(err) => {
            report_error(&filename, &source, &err);
            Ok(1)
        }
    }
}
