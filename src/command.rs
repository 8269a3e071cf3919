use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Child exit codes are observed and logged, never propagated to the loop.
pub type ExitCode = i32;

/// Prompt printed before every line is read.
pub const PROMPT: &str = "> ";

/// Name used to label every operator-facing error message.
pub const SHELL_NAME: &str = "minish";

/// What the loop driver should do after a line has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Prompt for the next line.
    Continue,
    /// Leave the loop; the process then exits successfully.
    Exit,
}

/// Errors that terminate the whole process.
///
/// Everything else is reported to the operator and the loop carries on.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("readline: {0}")]
    Read(#[from] std::io::Error),
    #[error("readline: {0}")]
    Editor(#[from] rustyline::error::ReadlineError),
    #[error("allocation error")]
    Allocation(#[from] std::collections::TryReserveError),
}
