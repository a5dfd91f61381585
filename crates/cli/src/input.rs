//! Line commands typed at the `play` prompt.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use aurora_core::PhaseId;
use director::{Direction, ObjectHandle, PlayerInput};

pub const HELP: &str = "\
Commands:
  code <CODE>           enter a card code
  phase <n>             jump to phase n
  select <i>            pick option i
  pick <i> <j> ...      pick several options
  order <i> <j> ...     arrange items, first slot first
  ok                    confirm
  up | down | left | right
  click <handle>        click a scene object, e.g. click 3 or click #3
  giveup                take the way out the gate offers
  status                show progress
  export <path>         write progress to a file
  import <path>         replace progress from a file
  reset yes             erase all progress and start over
  help                  this list
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Code(String),
    Phase(PhaseId),
    Input(PlayerInput),
    Status,
    Export(PathBuf),
    Import(PathBuf),
    Reset,
    Help,
    Quit,
}

fn index(word: &str) -> Result<usize> {
    word.parse()
        .with_context(|| format!("'{word}' is not an option number"))
}

fn indices<'a>(words: impl Iterator<Item = &'a str>) -> Result<Vec<usize>> {
    let picks = words.map(index).collect::<Result<Vec<_>>>()?;
    if picks.is_empty() {
        bail!("Give at least one option number");
    }
    Ok(picks)
}

fn one<'a>(mut words: impl Iterator<Item = &'a str>, usage: &str) -> Result<&'a str> {
    match (words.next(), words.next()) {
        (Some(word), None) => Ok(word),
        _ => Err(anyhow!("Usage: {usage}")),
    }
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    if let Some(direction) = Direction::parse(verb) {
        return Ok(Some(Command::Input(PlayerInput::Move(direction))));
    }

    let command = match verb.to_ascii_lowercase().as_str() {
        "code" => Command::Code(one(words, "code <CODE>")?.to_string()),
        "phase" => {
            let n: u8 = one(words, "phase <n>")?
                .parse()
                .context("Phase must be a number")?;
            let phase = PhaseId::new(n).ok_or_else(|| anyhow!("There is no phase {n}"))?;
            Command::Phase(phase)
        }
        "select" => Command::Input(PlayerInput::Select(index(one(words, "select <i>")?)?)),
        "pick" => Command::Input(PlayerInput::SelectMany(indices(words)?)),
        "order" => Command::Input(PlayerInput::Order(indices(words)?)),
        "ok" | "confirm" => Command::Input(PlayerInput::Confirm),
        "click" => {
            let raw = one(words, "click <handle>")?;
            let id: u64 = raw
                .trim_start_matches('#')
                .parse()
                .with_context(|| format!("'{raw}' is not an object handle"))?;
            Command::Input(PlayerInput::Click(ObjectHandle(id)))
        }
        "giveup" | "give-up" => Command::Input(PlayerInput::GiveUp),
        "status" => Command::Status,
        "export" => Command::Export(PathBuf::from(one(words, "export <path>")?)),
        "import" => Command::Import(PathBuf::from(one(words, "import <path>")?)),
        "reset" => match one(words, "reset yes") {
            Ok(word) if word.eq_ignore_ascii_case("yes") => Command::Reset,
            _ => bail!("This erases all progress. Type `reset yes` to confirm."),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("Unknown command '{other}', type help"),
    };
    Ok(Some(command))
}
