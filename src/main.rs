use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::{panic, thread};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use loxwalk as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::{Lox, Outcome};

const EXIT_USAGE: u8 = 64;
const EXIT_STATIC: u8 = 65;
const EXIT_RUNTIME: u8 = 70;

/// Stack for the thread running the interpreter; sized for the deepest
/// allowed Lox call chain even in unoptimised builds.
const INTERPRETER_STACK: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking Lox interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'loxwalk::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxwalk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<ExitCode> {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        return Ok(ExitCode::from(EXIT_STATIC));
    }

    info!("Tokenization completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn parse(source: &str) -> ExitCode {
    let (tokens, errors) = Scanner::new(source).scan_all();
    if !errors.is_empty() {
        errors.iter().for_each(|e| eprintln!("{}", e));
        return ExitCode::from(EXIT_STATIC);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => {
            let ast_str = AstPrinter::print(&expr);
            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
            ExitCode::SUCCESS
        }

        Err(errors) => {
            errors.iter().for_each(|e| eprintln!("{}", e));
            ExitCode::from(EXIT_STATIC)
        }
    }
}

fn evaluate(source: &str) -> ExitCode {
    let (tokens, errors) = Scanner::new(source).scan_all();
    if !errors.is_empty() {
        errors.iter().for_each(|e| eprintln!("{}", e));
        return ExitCode::from(EXIT_STATIC);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(errors) => {
            errors.iter().for_each(|e| eprintln!("{}", e));
            return ExitCode::from(EXIT_STATIC);
        }
    };

    let mut interpreter = Interpreter::new();

    let resolved = Resolver::new(&mut interpreter).resolve_expression(&expr);
    if let Err(errors) = resolved {
        errors.iter().for_each(|e| eprintln!("{}", e));
        return ExitCode::from(EXIT_STATIC);
    }

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            ExitCode::SUCCESS
        }

        Err(e) => {
            debug!("Evaluation debug: {}", e);
            eprintln!("{}", e);
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

fn repl() -> Result<ExitCode> {
    let mut session = Lox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        // Ctrl-D
        if read == 0 {
            println!();
            break;
        }

        if let Some(echo) = session.interpret_line(&line) {
            println!("{}", echo);
        }
    }

    info!("REPL session ended");
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let worker = thread::Builder::new()
        .name("loxwalk".into())
        .stack_size(INTERPRETER_STACK)
        .spawn(run_cli)
        .context("Failed to spawn interpreter thread")?;

    match worker.join() {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

fn run_cli() -> Result<ExitCode> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            e.print().context("Failed to print usage")?;
            return Ok(ExitCode::from(EXIT_USAGE));
        }
        // --help and --version
        Err(e) => {
            e.print().context("Failed to print usage")?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code: ExitCode = match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            tokenize(&read_file(filename)?, json)?
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            parse(&read_file(filename)?)
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            evaluate(&read_file(filename)?)
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_file(filename)?;
            info!("Provided input:\n {}", source);

            match Lox::new().run(&source) {
                Outcome::Success => {
                    info!("Program executed successfully");
                    ExitCode::SUCCESS
                }
                outcome => ExitCode::from(outcome.exit_code() as u8),
            }
        }

        Commands::Repl => {
            info!("Running Repl subcommand");
            repl()?
        }
    };

    Ok(code)
}
