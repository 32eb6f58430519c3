//! REPL (Read-Eval-Print Loop)
//!
//! Every line is parsed and run as a new top-level fragment of the same
//! session. A blank line or end of input ends the loop.

use crate::error::report_error;
use crate::session::{Session, SessionError};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".superlang_history";
const SOURCE_NAME: &str = "<repl>";

/// What the loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
    Exit(i32),
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
    banner: bool,
}

impl Repl {
    /// Interactive REPL with a fresh session
    pub fn new() -> RlResult<Self> {
        let mut repl = Self::with_session(Session::new())?;
        repl.banner = true;
        Ok(repl)
    }

    /// Continue an existing session (after a file run)
    pub fn with_session(session: Session) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session,
            history_path,
            banner: false,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the REPL. Returns the exit code requested by `exit`, or 0.
    pub fn run(&mut self) -> RlResult<i32> {
        if self.banner {
            println!("SuperLanguage REPL v{}", env!("CARGO_PKG_VERSION"));
            println!("Type :help for help, :quit or an empty line to exit.\n");
        }

        let mut code = 0;
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        break;
                    }
                    let _ = self.editor.add_history_entry(line);

                    match self.eval_line(line) {
                        Step::Continue => {}
                        Step::Quit => break,
                        Step::Exit(requested) => {
                            code = requested;
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(code)
    }

    fn eval_line(&mut self, line: &str) -> Step {
        if line.starts_with(':') {
            return if self.handle_command(line) {
                Step::Quit
            } else {
                Step::Continue
            };
        }
        self.eval_source(line)
    }

    /// Handle REPL commands (starting with :); true means quit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => true,
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":functions" => {
                println!("{}", self.session.interpreter().function_names().join(" "));
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL (an empty line also exits)");
        println!("  :functions      List known functions");
        println!();
        println!("Each line runs as new top-level statements, for example:");
        println!("  let x = 1 + 2;");
        println!("  fn add(a, b) {{ return a + b; }}");
        println!("  print(add(x, 4));");
        println!();
        println!("Built-in functions:");
        println!("  print(args...)          Print all arguments and a newline");
        println!("  exit(code)              Exit with a status code");
        println!("  dump_callstack()        Print the active call frames");
        println!("  len, get, set, push, pop  Array primitives");
    }

    /// Parse and run one fragment, reporting compile errors in place
    fn eval_source(&mut self, source: &str) -> Step {
        let step = match self.session.run_source(source) {
            Ok(()) => Step::Continue,
            Err(SessionError::Compile(err)) => {
                report_error(SOURCE_NAME, source, &err);
                Step::Continue
            }
            Err(err @ SessionError::Runtime(_)) => {
                eprintln!("{err}");
                Step::Exit(err.exit_code())
            }
        };
        // already logged where they happened
        self.session.interpreter_mut().take_diagnostics();
        step
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
