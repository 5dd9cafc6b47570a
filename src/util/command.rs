use std::process::Command;

use shlex::Shlex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandLineError {
    #[error("command override is empty")]
    Empty,
}

/// Builds a [`Command`] from a user supplied override such as
/// `python3 -m piper`, falling back to `default` when no override is set.
pub fn command_from_override(
    raw: Option<&str>,
    default: &[&str],
) -> Result<Command, CommandLineError> {
    let parts: Vec<String> = match raw {
        Some(raw) => Shlex::new(raw).collect(),
        None => default.iter().map(|part| part.to_string()).collect(),
    };
    let (program, args) = parts.split_first().ok_or(CommandLineError::Empty)?;
    let mut command = Command::new(program);
    command.args(args);
    Ok(command)
}
