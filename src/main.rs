use anyhow::Context;
use minish::Interpreter;
use minish::command::SHELL_NAME;
use minish::reader::{EditorSource, LineSource, StdinSource};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", SHELL_NAME, e);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut source: Box<dyn LineSource> = if io::stdin().is_terminal() {
        Box::new(EditorSource::new().context("cannot set up line editor")?)
    } else {
        Box::new(StdinSource::new(io::stdin().lock(), io::stdout()))
    };

    let mut sh: Interpreter = Interpreter::default();
    sh.repl(source.as_mut())?;
    Ok(())
}
