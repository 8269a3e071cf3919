use crate::command::ExitCode;
use crate::env::Environment;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use thiserror::Error;

/// Failures to start or reap an external program. Reported, never fatal.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// How a child execution context ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with the program's own status code.
    Exited(ExitCode),
    /// Terminated by the given signal number.
    Signaled(i32),
}

impl ExitOutcome {
    /// Shell-style numeric status: the exit code, or `128 + signal`.
    pub fn code(&self) -> ExitCode {
        match *self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(signal) => 128 + signal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with status {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}

/// Creates child execution contexts running external programs.
///
/// Starting a program and waiting for it are separate steps so the dispatcher
/// can be driven by a fake in tests.
pub trait Launcher {
    /// Handle to a started child.
    type Child;

    /// Starts `argv[0]` with `argv` as its argument vector. `argv` is never empty.
    fn spawn(&mut self, argv: &[String], env: &Environment) -> Result<Self::Child, SpawnError>;

    /// Blocks until the child has exited or was killed by a signal.
    fn wait(&mut self, child: Self::Child) -> Result<ExitOutcome, SpawnError>;
}

/// [`Launcher`] backed by the operating system.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

/// A running external program.
pub struct RunningChild {
    name: String,
    child: Child,
}

impl Launcher for ProcessLauncher {
    type Child = RunningChild;

    fn spawn(&mut self, argv: &[String], env: &Environment) -> Result<RunningChild, SpawnError> {
        let (name, args) = argv
            .split_first()
            .ok_or_else(|| SpawnError::NotFound(String::new()))?;
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let executable = resolve(OsStr::new(&search_paths), &env.current_dir, Path::new(name))
            .ok_or_else(|| SpawnError::NotFound(name.clone()))?;

        let mut cmd = Command::new(&*executable);
        set_arg0(&mut cmd, name);
        let child = cmd
            .args(args)
            .env_clear()
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn()
            .map_err(|source| SpawnError::Io {
                name: name.clone(),
                source,
            })?;

        log::debug!("spawned {} as pid {}", executable.display(), child.id());
        Ok(RunningChild {
            name: name.clone(),
            child,
        })
    }

    fn wait(&mut self, mut running: RunningChild) -> Result<ExitOutcome, SpawnError> {
        // `Child::wait` only returns once the child exited or was killed; stops are not reported.
        let status = running.child.wait().map_err(|source| SpawnError::Io {
            name: running.name.clone(),
            source,
        })?;
        Ok(outcome(status))
    }
}

#[cfg(unix)]
fn set_arg0(cmd: &mut Command, name: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut Command, _name: &str) {}

fn outcome(exit_status: ExitStatus) -> ExitOutcome {
    match exit_status.code() {
        Some(code) => ExitOutcome::Exited(code),
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitOutcome {
    use std::os::unix::process::ExitStatusExt;
    match ExitStatusExt::signal(&exit_status) {
        Some(signal) => ExitOutcome::Signaled(signal),
        None => ExitOutcome::Exited(-1),
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitOutcome {
    ExitOutcome::Exited(-1)
}

/// Resolves `path` like [`find_command_path`], anchoring relative results at `current_dir`.
fn resolve<'a>(search_paths: &OsStr, current_dir: &Path, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.components().count() > 1 && path.is_relative() {
        return find_by_path(&current_dir.join(path)).map(|p| Cow::Owned(p.to_owned()));
    }
    find_command_path(search_paths, path)
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

/// Candidates that are not executable are skipped and the search goes on.
fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| find_by_path(path).is_some_and(is_executable))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}
