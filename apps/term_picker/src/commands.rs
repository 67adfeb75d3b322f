//! Line commands typed into the picker.

use cascade::SelectionState;
use shared::domain::{Level, TermId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Select { level: Level, term: TermId },
    /// The "Select a term" placeholder.
    Clear { level: Level },
    Retry { level: Level },
    Show,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try: select, clear, retry, show, quit)")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("level must be 1, 2 or 3, got '{0}'")]
    InvalidLevel(String),
    #[error("level {level} has no option #{index}")]
    NoSuchOption { level: Level, index: usize },
}

impl UiCommand {
    /// `select <level> <id|#>` accepts either a term id or the 1-based option number
    /// shown for that level.
    pub fn parse(line: &str, state: &SelectionState) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(UiCommand::Show);
        };

        match verb.to_ascii_lowercase().as_str() {
            "select" | "s" => {
                let level = parse_level(words.next())?;
                let raw = words.next().ok_or(CommandError::MissingArgument("term"))?;
                let term = resolve_term(state, level, raw)?;
                Ok(UiCommand::Select { level, term })
            }
            "clear" | "c" => Ok(UiCommand::Clear {
                level: parse_level(words.next())?,
            }),
            "retry" | "r" => Ok(UiCommand::Retry {
                level: parse_level(words.next())?,
            }),
            "show" => Ok(UiCommand::Show),
            "quit" | "q" | "exit" => Ok(UiCommand::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_level(raw: Option<&str>) -> Result<Level, CommandError> {
    let raw = raw.ok_or(CommandError::MissingArgument("level"))?;
    raw.parse::<u8>()
        .ok()
        .and_then(|number| Level::try_from(number).ok())
        .ok_or_else(|| CommandError::InvalidLevel(raw.to_string()))
}

fn resolve_term(state: &SelectionState, level: Level, raw: &str) -> Result<TermId, CommandError> {
    if let Ok(index) = raw.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|position| state.level(level).children().get(position))
            .map(|term| term.id.clone())
            .ok_or(CommandError::NoSuchOption { level, index });
    }
    TermId::new(raw).map_err(|_| CommandError::MissingArgument("term"))
}
