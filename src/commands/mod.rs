use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PollError;
use crate::models::PollFilter;

lazy_static! {
    static ref LIST: Regex = Regex::new(r"^list(?:\s+(all|open|closed|scheduled))?$").unwrap();
    static ref VOTE: Regex = Regex::new(r"^vote\s+(\S+)\s+(\d+)$").unwrap();
    static ref TARGETED: Regex =
        Regex::new(r"^(show|undo|admin|results|voters|close)\s+(\S+)$").unwrap();
}

pub const HELP: &str = "\
Commands:
  list [all|open|closed|scheduled]  list polls
  show <poll>                       render a poll
  vote <poll> <option>              vote for an option (1-based)
  undo <poll>                       undo a vote before it is saved
  admin <poll>                      toggle the admin results overlay
  results <poll>                    open the results modal
  voters <poll>                     show the voters tab
  close <poll>                      close the results modal
  help | quit
<poll> is a list position or a poll id";

/// Which poll a command addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSelector {
    /// 1-based position in the board
    Position(usize),
    Id(String),
}

impl PollSelector {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(position) => PollSelector::Position(position),
            Err(_) => PollSelector::Id(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(PollFilter),
    Show(PollSelector),
    /// Option is 1-based as typed
    Vote(PollSelector, usize),
    Undo(PollSelector),
    Admin(PollSelector),
    Results(PollSelector),
    Voters(PollSelector),
    Close(PollSelector),
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, PollError> {
    let line = line.trim();

    match line {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    if let Some(caps) = LIST.captures(line) {
        let filter = match caps.get(1) {
            Some(filter) => filter.as_str().parse()?,
            None => PollFilter::All,
        };
        return Ok(Command::List(filter));
    }

    if let Some(caps) = VOTE.captures(line) {
        let option = caps[2]
            .parse()
            .map_err(|_| PollError::UnknownCommand(line.to_string()))?;
        return Ok(Command::Vote(PollSelector::parse(&caps[1]), option));
    }

    if let Some(caps) = TARGETED.captures(line) {
        let selector = PollSelector::parse(&caps[2]);
        let command = match &caps[1] {
            "show" => Command::Show(selector),
            "undo" => Command::Undo(selector),
            "admin" => Command::Admin(selector),
            "results" => Command::Results(selector),
            "voters" => Command::Voters(selector),
            _ => Command::Close(selector),
        };
        return Ok(command);
    }

    Err(PollError::UnknownCommand(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vote() {
        assert_eq!(
            parse("vote 2 3").unwrap(),
            Command::Vote(PollSelector::Position(2), 3)
        );
        assert_eq!(
            parse("  vote poll-1 1 ").unwrap(),
            Command::Vote(PollSelector::Id("poll-1".to_string()), 1)
        );
    }

    #[test]
    fn parses_list_filters() {
        assert_eq!(parse("list").unwrap(), Command::List(PollFilter::All));
        assert_eq!(parse("list closed").unwrap(), Command::List(PollFilter::Closed));
        assert!(parse("list archived").is_err());
    }

    #[test]
    fn parses_targeted_commands() {
        assert_eq!(
            parse("undo 1").unwrap(),
            Command::Undo(PollSelector::Position(1))
        );
        assert_eq!(
            parse("voters poll-3").unwrap(),
            Command::Voters(PollSelector::Id("poll-3".to_string()))
        );
        assert_eq!(
            parse("close 4").unwrap(),
            Command::Close(PollSelector::Position(4))
        );
        assert_eq!(parse("help").unwrap(), Command::Help);
        assert_eq!(parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse("vote"), Err(PollError::UnknownCommand(_))));
        assert!(matches!(parse("vote 1 x"), Err(PollError::UnknownCommand(_))));
        assert!(matches!(parse("dance 1"), Err(PollError::UnknownCommand(_))));
    }
}
