use crate::command::{Flow, SHELL_NAME};
use crate::env::Environment;
use crate::history::HistoryLog;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// State a built-in may touch while it runs.
pub struct Context<'a> {
    pub env: &'a mut Environment,
    pub history: &'a HistoryLog,
}

/// Recoverable built-in failures. The dispatcher reports them and the loop continues.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("expected argument to \"{0}\"")]
    MissingArgument(&'static str),
    #[error("expected argument of at least two characters to \"echo\", got {0:?}")]
    TooShort(String),
    #[error("cd: {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("history is empty")]
    EmptyHistory,
    /// argh rejected the arguments. The current built-ins take no options and
    /// no required positionals, so this only fires for a built-in that adds them.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    const NAME: &'static str;

    /// Executes the command, writing any output to `stdout`.
    fn execute(self, stdout: &mut dyn Write, ctx: &mut Context<'_>) -> Result<Flow, BuiltinError>;
}

/// Entry point shared by every row of [`BUILTINS`].
pub type Handler = fn(&[String], &mut dyn Write, &mut Context<'_>) -> Result<Flow, BuiltinError>;

/// One row of the built-in table.
pub struct Builtin {
    pub name: &'static str,
    handler: Handler,
}

impl Builtin {
    /// Runs the built-in with the arguments that followed its name.
    pub fn run(
        &self,
        args: &[String],
        stdout: &mut dyn Write,
        ctx: &mut Context<'_>,
    ) -> Result<Flow, BuiltinError> {
        (self.handler)(args, stdout, ctx)
    }
}

/// Built-ins in lookup order. Fixed at compile time.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: Cd::NAME,
        handler: invoke::<Cd>,
    },
    Builtin {
        name: Help::NAME,
        handler: invoke::<Help>,
    },
    Builtin {
        name: Exit::NAME,
        handler: invoke::<Exit>,
    },
    Builtin {
        name: Echo::NAME,
        handler: invoke::<Echo>,
    },
    Builtin {
        name: History::NAME,
        handler: invoke::<History>,
    },
];

/// Finds the first built-in whose name equals `name` exactly.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn invoke<T: BuiltinCommand>(
    args: &[String],
    stdout: &mut dyn Write,
    ctx: &mut Context<'_>,
) -> Result<Flow, BuiltinError> {
    // Built-ins take no flags: everything after the name is positional data.
    let argv: Vec<&str> = std::iter::once("--")
        .chain(args.iter().map(String::as_str))
        .collect();
    let cmd = T::from_args(&[T::NAME], &argv)
        .map_err(|EarlyExit { output, .. }| BuiltinError::Usage(output.trim_end().to_owned()))?;
    cmd.execute(stdout, ctx)
}

/// Strips exactly one character from each end of `token`.
///
/// Returns `None` for tokens shorter than two characters.
fn strip_outer(token: &str) -> Option<&str> {
    let mut chars = token.chars();
    chars.next()?;
    chars.next_back()?;
    Some(chars.as_str())
}

#[derive(FromArgs)]
/// Change the working directory of the shell.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to, absolute or relative to the current directory.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    fn execute(self, _stdout: &mut dyn Write, ctx: &mut Context<'_>) -> Result<Flow, BuiltinError> {
        let target = self
            .args
            .into_iter()
            .next()
            .map(PathBuf::from)
            .ok_or(BuiltinError::MissingArgument(Self::NAME))?;

        let new_dir = ctx.env.current_dir.join(&target);
        let canonical = fs::canonicalize(&new_dir).map_err(|source| BuiltinError::ChangeDir {
            path: target.clone(),
            source,
        })?;
        env::set_current_dir(&canonical)
            .map_err(|source| BuiltinError::ChangeDir { path: target, source })?;

        log::debug!("working directory is now {}", canonical.display());
        ctx.env.current_dir = canonical;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print usage and the list of built-in commands.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    const NAME: &'static str = "help";

    fn execute(self, stdout: &mut dyn Write, _ctx: &mut Context<'_>) -> Result<Flow, BuiltinError> {
        writeln!(stdout, "{}, a minimal command interpreter", SHELL_NAME)?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for builtin in BUILTINS {
            writeln!(stdout, "  {}", builtin.name)?;
        }
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";

    fn execute(self, _stdout: &mut dyn Write, _ctx: &mut Context<'_>) -> Result<Flow, BuiltinError> {
        Ok(Flow::Exit)
    }
}

#[derive(FromArgs)]
/// Print the first argument with its first and last characters removed,
/// which strips a pair of surrounding quotes.
pub struct Echo {
    #[argh(positional, greedy)]
    /// text to print; only the first value is used.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";

    fn execute(self, stdout: &mut dyn Write, _ctx: &mut Context<'_>) -> Result<Flow, BuiltinError> {
        let token = self
            .args
            .first()
            .ok_or(BuiltinError::MissingArgument(Self::NAME))?;
        let text = strip_outer(token).ok_or_else(|| BuiltinError::TooShort(token.clone()))?;
        writeln!(stdout, "{}", text)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print every line entered so far, oldest first.
pub struct History {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for History {
    const NAME: &'static str = "history";

    fn execute(self, stdout: &mut dyn Write, ctx: &mut Context<'_>) -> Result<Flow, BuiltinError> {
        if ctx.history.is_empty() {
            return Err(BuiltinError::EmptyHistory);
        }
        for entry in ctx.history.iter() {
            write!(stdout, "{}", entry)?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_current_dir;
    use std::collections::HashMap;
    use std::env as stdenv;

    fn make_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        }
    }

    fn run(
        name: &str,
        args: &[&str],
        env: &mut Environment,
        history: &HistoryLog,
    ) -> (Result<Flow, BuiltinError>, String) {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let mut out = Vec::new();
        let mut ctx = Context { env, history };
        let res = lookup(name).expect("builtin exists").run(&args, &mut out, &mut ctx);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_table_order_and_exact_lookup() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        assert_eq!(names, ["cd", "help", "exit", "echo", "history"]);

        assert!(lookup("echo").is_some());
        assert!(lookup("Echo").is_none());
        assert!(lookup("ech").is_none());
        assert!(lookup("echo ").is_none());
    }

    #[test]
    fn test_echo_strips_surrounding_quotes() {
        let mut env = make_env();
        let (res, out) = run("echo", &["\"hi\""], &mut env, &HistoryLog::new());
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn test_echo_uses_first_argument_only() {
        let mut env = make_env();
        let (res, out) = run("echo", &["'one'", "'two'"], &mut env, &HistoryLog::new());
        assert!(res.is_ok());
        assert_eq!(out, "one\n");
    }

    #[test]
    fn test_echo_two_characters_prints_empty_line() {
        let mut env = make_env();
        let (res, out) = run("echo", &["\"\""], &mut env, &HistoryLog::new());
        assert!(res.is_ok());
        assert_eq!(out, "\n");
    }

    #[test]
    fn test_echo_strips_characters_not_bytes() {
        let mut env = make_env();
        let (res, out) = run("echo", &["«ünï»"], &mut env, &HistoryLog::new());
        assert!(res.is_ok());
        assert_eq!(out, "ünï\n");
    }

    #[test]
    fn test_echo_flag_like_token_is_data() {
        let mut env = make_env();
        let (res, out) = run("echo", &["--help"], &mut env, &HistoryLog::new());
        assert!(res.is_ok());
        assert_eq!(out, "-hel\n");
    }

    #[test]
    fn test_echo_without_argument_is_usage_error() {
        let mut env = make_env();
        let (res, out) = run("echo", &[], &mut env, &HistoryLog::new());
        let err = res.unwrap_err();
        assert!(matches!(err, BuiltinError::MissingArgument("echo")));
        assert_eq!(err.to_string(), "expected argument to \"echo\"");
        assert!(out.is_empty());
    }

    #[test]
    fn test_echo_one_character_is_usage_error() {
        let mut env = make_env();
        let (res, out) = run("echo", &["x"], &mut env, &HistoryLog::new());
        assert!(matches!(res, Err(BuiltinError::TooShort(ref t)) if t == "x"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_help_lists_every_builtin() {
        let mut env = make_env();
        let (res, out) = run("help", &[], &mut env, &HistoryLog::new());
        assert_eq!(res.unwrap(), Flow::Continue);
        for name in ["cd", "help", "exit", "echo", "history"] {
            assert!(out.contains(&format!("  {}\n", name)), "help output misses {}", name);
        }
    }

    #[test]
    fn test_exit_stops_the_loop() {
        let mut env = make_env();
        let (res, out) = run("exit", &["3"], &mut env, &HistoryLog::new());
        assert_eq!(res.unwrap(), Flow::Exit);
        assert!(out.is_empty());
    }

    #[test]
    fn test_history_prints_entries_verbatim() {
        let mut env = make_env();
        let mut history = HistoryLog::new();
        history.push("ls\n");
        history.push("\n");
        history.push("history\n");

        let (res, out) = run("history", &[], &mut env, &history);
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "ls\n\nhistory\n");
    }

    #[test]
    fn test_history_empty_log_is_reported() {
        let mut env = make_env();
        let (res, _) = run("history", &[], &mut env, &HistoryLog::new());
        assert!(matches!(res, Err(BuiltinError::EmptyHistory)));
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = make_env();
        let target = canonical_temp.to_string_lossy().to_string();
        let (res, _) = run("cd", &[&target], &mut env, &HistoryLog::new());

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);
    }

    #[test]
    fn test_cd_relative_to_tracked_directory() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(canonical_temp.join("nested")).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = make_env();
        env.current_dir = canonical_temp.clone();
        let (res, _) = run("cd", &["nested"], &mut env, &HistoryLog::new());

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(res.is_ok());
        assert_eq!(env.current_dir, canonical_temp.join("nested"));
    }

    #[test]
    fn test_cd_without_argument_leaves_directory_alone() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = make_env();
        let (res, _) = run("cd", &[], &mut env, &HistoryLog::new());

        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "expected argument to \"cd\"");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = make_env();
        let name = format!("/nonexistent_dir_for_minish_test_{}", std::process::id());
        let (res, _) = run("cd", &[&name], &mut env, &HistoryLog::new());

        let err = res.unwrap_err();
        assert!(matches!(err, BuiltinError::ChangeDir { .. }));
        assert!(err.to_string().starts_with(&format!("cd: {}: ", name)));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
    }
}
