//! Runtime controls read line by line from standard input.

use std::{
    io::{self, BufRead},
    path::PathBuf,
    str::FromStr,
    sync::mpsc::{self, Receiver},
    thread,
};

use log::debug;
use thiserror::Error;

/// Request typed by the user while an animation runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ControlRequest {
    /// `speed <n>`: ticks per frame from the next frame on.
    Speed(u32),
    /// `open <path>`: replace the running image.
    Open(PathBuf),
    /// `next`: skip to the next queued image.
    Next,
    /// `quit` or `q`: stop the animation.
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ControlParseError {
    #[error("empty control line")]
    Empty,
    #[error("unknown control `{0}` (expected speed, open, next or quit)")]
    Unknown(String),
    #[error("`speed` expects a whole number, got `{0}`")]
    InvalidSpeed(String),
    #[error("`open` expects a path")]
    MissingPath,
}

impl FromStr for ControlRequest {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (keyword, argument) = match line.split_once(char::is_whitespace) {
            Some((keyword, argument)) => (keyword, argument.trim()),
            None => (line, ""),
        };

        match keyword {
            "" => Err(ControlParseError::Empty),
            "speed" => argument
                .parse::<u32>()
                .map(Self::Speed)
                .map_err(|_| ControlParseError::InvalidSpeed(argument.to_owned())),
            "open" if argument.is_empty() => Err(ControlParseError::MissingPath),
            "open" => Ok(Self::Open(PathBuf::from(argument))),
            "next" => Ok(Self::Next),
            "quit" | "q" => Ok(Self::Quit),
            other => Err(ControlParseError::Unknown(other.to_owned())),
        }
    }
}

/// Message forwarded from the stdin reader thread.
pub(crate) type ControlMessage = Result<ControlRequest, ControlParseError>;

/// Spawns a thread forwarding parsed stdin lines until end of input.
///
/// The returned receiver disconnects once stdin is closed.
pub(crate) fn spawn_stdin_reader() -> Receiver<ControlMessage> {
    let (sender, receiver) = mpsc::channel();
    let _ = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line.parse()).is_err() {
                break;
            }
        }
        debug!("control input closed");
    });
    receiver
}
