//! A module implementing lexical analysis (tokenization) of operator input.
//!
//! The grammar is deliberately flat: a line is a run of tokens separated by
//! delimiter characters. There is no quoting, no escaping and no operators.

use crate::command::FatalError;
use regex::Regex;
use std::collections::TryReserveError;
use std::sync::LazyLock;

/// Token slots reserved up front, and again each time the vector fills up.
pub const TOKEN_BUFSIZE: usize = 64;

/// Space, tab, carriage return, newline and bell. Runs collapse into one split.
static DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x07]+").expect("delimiter pattern is valid"));

/// Ordered tokens derived from one input line.
///
/// Element 0 is the command name, the rest are its arguments. Tokens are owned
/// copies, so the vector outlives the line it was split from. Running off the
/// end of the vector is the "no more arguments" marker: an empty vector is what
/// a blank line produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
}

impl ArgumentVector {
    /// The command name, or `None` when the line held no tokens.
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the command name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn push(&mut self, token: &str) -> Result<(), TryReserveError> {
        if self.tokens.len() == self.tokens.capacity() {
            self.tokens.try_reserve_exact(TOKEN_BUFSIZE)?;
        }
        self.tokens.push(token.to_owned());
        Ok(())
    }
}

/// Splits `line` on runs of delimiter characters.
///
/// Leading, trailing and repeated delimiters never produce empty tokens, so a
/// line made only of delimiters yields an empty vector.
///
/// # Errors
/// `FatalError::Allocation` if the token storage cannot grow.
pub fn split_line(line: &str) -> Result<ArgumentVector, FatalError> {
    let mut argv = ArgumentVector::default();
    for token in DELIMITERS.split(line).filter(|t| !t.is_empty()) {
        argv.push(token)?;
    }
    Ok(argv)
}
