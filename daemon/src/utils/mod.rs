pub mod catalog;
pub mod ipc;
pub mod portfile;

use thiserror::Error;

/// Why a single request could not be carried out.
///
/// None of these are fatal, the server reports them to the client that sent the request and
/// keeps going.
#[derive(Debug, PartialEq, Error)]
pub enum CommandError {
    /// No command is registered under this name.
    #[error("unrecognised command `{0}`")]
    UnknownCommand(String),
    /// The command was given too few or too many arguments.
    #[error("`{name}` takes {expected} argument(s), got {got}")]
    WrongArity {
        name: &'static str,
        expected: String,
        got: usize,
    },
    /// The argument should have been an integer.
    #[error("invalid integer `{0}`")]
    InvalidInteger(String),
    /// Counts cannot go below zero.
    #[error("count must not be negative, got {0}")]
    NegativeCount(i64),
    /// Delays are whole seconds and must be at least one.
    #[error("delay must be positive, got {0}")]
    NonPositiveDelay(i64),
    /// A history lookup fell outside of the recorded entries.
    #[error("history index {index} out of range for {len} entries")]
    IndexOutOfRange { index: i64, len: usize },
}
