//! Line commands read from stdin.
//!
//! ```text
//! list                 show the publication catalog
//! investigate <id>     investigate a publication
//! play <n>             play turn n's clip
//! all                  play every clip in order
//! stop                 stop playback
//! toggle <n>           expand or collapse turn n
//! back                 return to the publication list
//! quit                 stop playback and exit
//! ```

use ftm_observer::Command;

/// Help text printed for unknown commands.
pub const HELP: &str =
    "commands: list | investigate <id> | play <n> | all | stop | toggle <n> | back | quit";

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Print the catalog.
    List,
    /// Investigate the publication with this id.
    Investigate(String),
    /// An entry point that needs no catalog lookup.
    Session(Command),
    /// Exit the presenter.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The first word is not a command.
    #[error("unknown command '{0}'")]
    Unknown(String),

    /// The command needs an argument.
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    /// The turn number is not a non-negative integer.
    #[error("'{0}' is not a turn number")]
    BadIndex(String),
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Input>, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let input = match verb.to_ascii_lowercase().as_str() {
        "list" => Input::List,
        "investigate" => Input::Investigate(
            arg.ok_or(InputError::MissingArgument("investigate"))?.to_owned(),
        ),
        "play" => Input::Session(Command::PlayOne(turn_number("play", arg)?)),
        "toggle" => Input::Session(Command::Toggle(turn_number("toggle", arg)?)),
        "all" => Input::Session(Command::PlayAll),
        "stop" => Input::Session(Command::Stop),
        "back" => Input::Session(Command::Back),
        "quit" | "exit" => Input::Quit,
        other => return Err(InputError::Unknown(other.to_owned())),
    };
    Ok(Some(input))
}

fn turn_number(verb: &'static str, arg: Option<&str>) -> Result<usize, InputError> {
    let raw = arg.ok_or(InputError::MissingArgument(verb))?;
    raw.parse()
        .ok()
        .ok_or_else(|| InputError::BadIndex(raw.to_owned()))
}
