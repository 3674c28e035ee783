use clap::Parser;
use kuzur::config;
use kuzur::eval::Interpreter;
use kuzur::value::Value;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Interpreter for the Kuzur scripting language
#[derive(Parser, Debug)]
#[command(name = "kuzur")]
#[command(display_name = "Kuzur")]
#[command(version = config::VERSION)]
#[command(about = "Interpreter for the Kuzur scripting language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match args.script {
        Some(path) => run_file(&path),
        None => repl(),
    }
}

/// Execute a script file. Exit codes follow the CLI contract: 0 on success,
/// 1 on a lex/parse/runtime error, 2 on a usage error.
fn run_file(path: &Path) -> ExitCode {
    if path.extension().and_then(|e| e.to_str()) != Some(config::SOURCE_EXTENSION) {
        eprintln!(
            "{} scripts must use the .{} extension: {}",
            config::NAME,
            config::SOURCE_EXTENSION,
            path.display()
        );
        return ExitCode::from(2);
    }

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read {}: {}", path.display(), e);
            return ExitCode::from(2);
        }
    };

    let interp = Interpreter::new();
    match interp.run(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Interactive loop with history. Bindings and function definitions persist
/// across lines; errors are reported without ending the session.
fn repl() -> ExitCode {
    let editor_config = Config::builder().auto_add_history(true).build();
    let mut rl = match DefaultEditor::with_config(editor_config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to initialize the REPL: {}", e);
            return ExitCode::from(1);
        }
    };

    println!("{} {}", config::NAME, config::VERSION);
    println!("{}", config::WELCOME_FOOTER);

    let interp = Interpreter::new();

    loop {
        match rl.readline(config::REPL_PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                match interp.eval_line(line) {
                    Ok(Some(value)) if value != Value::Null => println!("=> {}", value),
                    Ok(_) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C clears the line but keeps the session
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
