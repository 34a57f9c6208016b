use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use kaleido::repl::Repl;
use kaleido::{run_toplevel, Error, Lexer, LineSource, Parser, ReaderSource, Session, SessionConfig};

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Interactive JIT for the Kaleidoscope language", long_about = None)]
struct Args {
    /// Skip the optimization pipeline.
    #[arg(long)]
    no_opt: bool,

    /// Print each function's IR after lowering and after optimization.
    #[arg(long)]
    dump_ir: bool,

    /// Print the program image at end of input.
    #[arg(long)]
    dump_module: bool,

    /// Do not load or save readline history.
    #[arg(long)]
    no_history: bool,

    /// Log at debug level unless KALEIDO_LOG says otherwise.
    #[arg(long)]
    trace: bool,

    /// Read units from this file instead of stdin.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn install_subscriber(trace: bool) {
    let default = if trace { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("KALEIDO_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run<S: LineSource>(source: S, mut session: Session) -> Result<(), Error> {
    let config = session.config().clone();
    let lexer = Lexer::new(source).with_prompt(config.prompt.as_str());
    let mut parser = Parser::new(lexer, config.precedence.clone());

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut diag = stderr.lock();
    run_toplevel(&mut parser, &mut session, &mut out, &mut diag)?;

    if config.dump_module {
        write!(diag, "{}", session.image())?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_subscriber(args.trace);

    let config = SessionConfig::new()
        .with_optimize(!args.no_opt)
        .with_dump_ir(args.dump_ir)
        .with_dump_module(args.dump_module);

    let session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {}", Error::Backend(e));
            return ExitCode::from(1);
        }
    };

    let result = match &args.file {
        Some(path) => match File::open(path) {
            Ok(file) => run(ReaderSource::new(BufReader::new(file)), session),
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
                return ExitCode::from(1);
            }
        },
        None if io::stdin().is_terminal() => {
            let repl = if args.no_history {
                Repl::without_history()
            } else {
                Repl::new()
            };
            match repl {
                Ok(repl) => run(repl, session),
                Err(e) => {
                    eprintln!("error: could not start line editor: {}", e);
                    return ExitCode::from(1);
                }
            }
        }
        None => run(ReaderSource::new(io::stdin().lock()), session),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}
