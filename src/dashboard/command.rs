//! Operator commands for the interactive console

use std::str::FromStr;
use thiserror::Error;

use crate::models::{Filter, ParseError, SortKey};

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Invalid(#[from] ParseError),
}

/// One operator action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login(String),
    Logout,
    Filter(Filter),
    Sort(SortKey),
    Model(String),
    Refresh,
    Select(String),
    Deselect,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse `<verb> [argument]`; the argument is the rest of the line,
    /// so multi-word values like `filter high risk` work.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "login" => Ok(Command::Login(require(rest, "login")?.to_string())),
            "logout" => Ok(Command::Logout),
            "filter" => Ok(Command::Filter(require(rest, "filter")?.parse()?)),
            "sort" => Ok(Command::Sort(require(rest, "sort")?.parse()?)),
            "model" => Ok(Command::Model(require(rest, "model")?.to_string())),
            "refresh" => Ok(Command::Refresh),
            "select" => Ok(Command::Select(require(rest, "select")?.to_string())),
            "close" | "deselect" => Ok(Command::Deselect),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn require<'a>(rest: &'a str, name: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(name))
    } else {
        Ok(rest)
    }
}

pub const HELP: &str = "\
Commands:
  login <password>     log in
  logout               log out and clear the dashboard
  filter <status>      all | normal | risk | high risk | suspicious
  sort <key>           id | score
  model <name>         switch scoring model (re-fetches)
  refresh              re-fetch the current model
  select <id>          show the trend for one record
  close                hide the trend
  show                 render the dashboard
  quit                 exit";
