//! Parsing of interactive input lines.

use anyhow::{bail, Context, Result};

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Play,
    Stop,
    Quit,
    Move { row: usize, column: usize },
    Help,
    Exit,
}

pub const HELP: &str = "\
Commands:
  play              join a game (launches a session if needed)
  move <row> <col>  place your mark, rows and columns count from 0
  quit              leave the game, keep the session
  stop              end the game and the session
  help              show this help
  exit              leave the program";

/// Parse a line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<InputCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_lowercase().as_str() {
        "play" | "join" => InputCommand::Play,
        "stop" => InputCommand::Stop,
        "quit" | "leave" => InputCommand::Quit,
        "help" | "?" => InputCommand::Help,
        "exit" => InputCommand::Exit,
        "move" | "m" => {
            let row = coordinate(words.next(), "row")?;
            let column = coordinate(words.next(), "column")?;
            InputCommand::Move { row, column }
        }
        other => bail!("unknown command '{other}' (try 'help')"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument '{extra}'");
    }
    Ok(Some(command))
}

fn coordinate(word: Option<&str>, name: &str) -> Result<usize> {
    let word = word.with_context(|| format!("missing {name}: usage 'move <row> <col>'"))?;
    word.parse()
        .with_context(|| format!("{name} must be a number, got '{word}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse("play").unwrap(), Some(InputCommand::Play));
        assert_eq!(parse("  STOP ").unwrap(), Some(InputCommand::Stop));
        assert_eq!(parse("leave").unwrap(), Some(InputCommand::Quit));
        assert_eq!(parse("exit").unwrap(), Some(InputCommand::Exit));
    }

    #[test]
    fn parse_move() {
        assert_eq!(
            parse("move 1 2").unwrap(),
            Some(InputCommand::Move { row: 1, column: 2 })
        );
        assert_eq!(
            parse("m 0 0").unwrap(),
            Some(InputCommand::Move { row: 0, column: 0 })
        );
    }

    #[test]
    fn parse_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parse_errors() {
        assert!(parse("move 1").is_err());
        assert!(parse("move a 1").is_err());
        assert!(parse("move 1 1 1").is_err());
        assert!(parse("dance").is_err());
    }
}
