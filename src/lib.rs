//! A tiny interactive command interpreter.
//!
//! Each line the operator types is recorded in an in-memory history, split on
//! whitespace into an argument vector and dispatched: either to one of the
//! built-ins (`cd`, `help`, `exit`, `echo`, `history`) or to an external program,
//! which runs to completion before the next prompt.
//!
//! The main entry point is [`Interpreter`]. Line sources live in [`reader`], the
//! process launcher behind the [`Launcher`] trait in [`external`].

pub mod builtin;
pub mod command;
pub mod env;
pub mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod reader;
#[cfg(test)]
mod test_support;

pub use command::{FatalError, Flow};
pub use external::{Launcher, ProcessLauncher};
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
