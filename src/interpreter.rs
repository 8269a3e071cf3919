use crate::builtin::{self, Context};
use crate::command::{FatalError, Flow, PROMPT, SHELL_NAME};
use crate::env::Environment;
use crate::external::{Launcher, ProcessLauncher};
use crate::history::HistoryLog;
use crate::lexer::{self, ArgumentVector};
use crate::reader::LineSource;
use std::fmt::Display;
use std::io::{self, Write};

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the [`Environment`], the [`HistoryLog`] and a [`Launcher`]
/// for external programs. Each line goes through the same steps: it is recorded in
/// the history, split into an [`ArgumentVector`] and dispatched, first against the
/// built-in table and otherwise to the launcher.
///
/// Example
/// ```
/// use minish::{Flow, Interpreter};
/// let mut sh: Interpreter = Interpreter::default();
/// assert_eq!(sh.run_line("   \n").unwrap(), Flow::Continue);
/// assert_eq!(sh.run_line("exit\n").unwrap(), Flow::Exit);
/// assert_eq!(sh.history().len(), 2);
/// ```
pub struct Interpreter<L: Launcher = ProcessLauncher> {
    env: Environment,
    history: HistoryLog,
    launcher: L,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl<L: Launcher> Interpreter<L> {
    /// Create an interpreter around the current process environment, writing to
    /// the process's standard output and error.
    pub fn new(launcher: L) -> Self {
        Self {
            env: Environment::new(),
            history: HistoryLog::new(),
            launcher,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Redirect built-in output and error reports.
    pub fn with_output(mut self, stdout: impl Write + 'static, stderr: impl Write + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self.stderr = Box::new(stderr);
        self
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Read-Eval-Print Loop.
    ///
    /// Runs until `exit` is entered or `source` runs out of input. Only
    /// [`FatalError`]s end the loop early; everything else is reported and the
    /// next line is read.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<(), FatalError> {
        while let Some(line) = source.read_line(PROMPT)? {
            if self.run_line(&line)? == Flow::Exit {
                log::debug!("exit requested after {} lines", self.history.len());
                return Ok(());
            }
        }
        log::debug!("end of input after {} lines", self.history.len());
        Ok(())
    }

    /// Record, tokenize and dispatch one line of operator input.
    pub fn run_line(&mut self, line: &str) -> Result<Flow, FatalError> {
        self.history.push(line);
        let argv = lexer::split_line(line)?;
        Ok(self.dispatch(&argv))
    }

    /// Route `argv` to a built-in or, failing that, to the launcher.
    ///
    /// An empty vector is a no-op. Only the `exit` built-in returns [`Flow::Exit`].
    pub fn dispatch(&mut self, argv: &ArgumentVector) -> Flow {
        let Some(name) = argv.command() else {
            return Flow::Continue;
        };

        if let Some(builtin) = builtin::lookup(name) {
            log::trace!("{} is a built-in", name);
            let mut ctx = Context {
                env: &mut self.env,
                history: &self.history,
            };
            let flow = match builtin.run(argv.args(), &mut *self.stdout, &mut ctx) {
                Ok(flow) => flow,
                Err(e) => {
                    self.report(&e);
                    Flow::Continue
                }
            };
            self.flush_stdout();
            return flow;
        }

        self.launch(argv);
        Flow::Continue
    }

    fn launch(&mut self, argv: &ArgumentVector) {
        // Anything a built-in printed must reach the terminal before the child's output.
        self.flush_stdout();

        let result = self
            .launcher
            .spawn(argv.as_slice(), &self.env)
            .and_then(|child| self.launcher.wait(child));
        match result {
            Ok(outcome) => log::debug!("{:?} {} ({})", argv.as_slice(), outcome, outcome.code()),
            Err(e) => self.report(&e),
        }
    }

    fn report(&mut self, err: &dyn Display) {
        if let Err(e) = writeln!(self.stderr, "{}: {}", SHELL_NAME, err) {
            log::warn!("could not report error: {}", e);
        }
    }

    fn flush_stdout(&mut self) {
        if let Err(e) = self.stdout.flush() {
            log::warn!("could not flush standard output: {}", e);
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter that launches real programs.
    fn default() -> Self {
        Self::new(ProcessLauncher)
    }
}
