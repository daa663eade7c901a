//! Reads the user's typed input.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::mpsc::Sender;
use std::thread;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::{Regex, RegexSet};
use shakmaty::Square;
use crate::controller::Event;

/// Lines beginning with this are controls rather than commands.
pub const CONTROL_PREFIX: char = ':';

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The terminal's equivalent of buttons and clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Clicks a square: `:click e2`
    Click(Square),
    /// Starts a new game: `:new`
    NewGame,
    /// Takes back a move: `:undo`
    Undo,
    /// Turns listening on or off: `:voice`
    ToggleVoice,
    /// Changes a setting and restarts the game: `:set <key> <value>`
    Set(String, String),
    /// Lists the current settings: `:settings`
    ShowSettings,
    /// Saves the current settings: `:save`
    Save,
    /// Exits: `:quit`
    Quit,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Click(sq) => format!(":click {}", sq).fmt(f),
            Control::NewGame => ":new".fmt(f),
            Control::Undo => ":undo".fmt(f),
            Control::ToggleVoice => ":voice".fmt(f),
            Control::Set(key, value) => format!(":set {} {}", key, value).fmt(f),
            Control::ShowSettings => ":settings".fmt(f),
            Control::Save => ":save".fmt(f),
            Control::Quit => ":quit".fmt(f),
        }
    }
}

impl FromStr for Control {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, ControlError> {
        let s = s.trim();
        if let Some(ind) = CONTROL_SET.matches(s).iter().next() {
            let args = CONTROL_VEC[ind].captures(s).expect("INFALLIBLE");

            match ind {
                0 => {
                    let sq = args.get(1).expect("INFALLIBLE").as_str().to_lowercase();
                    Ok(Control::Click(sq.parse().map_err(|_| { ControlError })?))
                },
                1 => Ok(Control::NewGame),
                2 => Ok(Control::Undo),
                3 => Ok(Control::ToggleVoice),
                4 => Ok(Control::Set(
                    args.get(1).expect("INFALLIBLE").as_str().to_lowercase(),
                    args.get(2).expect("INFALLIBLE").as_str().to_owned())),
                5 => Ok(Control::ShowSettings),
                6 => Ok(Control::Save),
                7 => Ok(Control::Quit),
                _ => unreachable!(),
            }
        } else {
            Err(ControlError)
        }
    }
}

const CONTROLS: [&str; 8] = [
    r"^:click\s+([a-hA-H][1-8])$",
    r"^:new(?:\s+game)?$",
    r"^:undo$",
    r"^:voice$",
    r"^:set\s+(\S+)\s+(.+)$",
    r"^:settings$",
    r"^:save$",
    r"^:(?:quit|exit|q)$",
];

lazy_static! {
    static ref CONTROL_SET: RegexSet = RegexSet::new(&CONTROLS).expect("INFALLIBLE");
    static ref CONTROL_VEC: Vec<Regex> = {
        let mut control_vec = Vec::new();
        for control in &CONTROLS {
            control_vec.push(Regex::new(control).expect("INFALLIBLE"));
        }
        control_vec
    };
}

/// Error for lines that look like controls but aren't.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlError;

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "unknown or incorrectly formatted control".fmt(f)
    }
}

impl std::error::Error for ControlError { }

/// Turns a line of typed input into an event. Blank lines are ignored.
pub fn classify(line: &str) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if line.starts_with(CONTROL_PREFIX) {
        Some(match line.parse() {
            Ok(control) => Event::Control(control),
            Err(ControlError) => Event::BadControl(line.to_owned()),
        })
    } else {
        Some(Event::Input(line.to_owned()))
    }
}

/// Starts a thread which reads lines from `reader` and sends them to `events`. `Event::Quit` is
/// sent at the end of the input.
pub fn spawn_reader<R>(reader: R, events: Sender<Event>)
where R: BufRead + Send + 'static {
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    debug!("<user>: {}", line);
                    if let Some(event) = classify(&line) {
                        if events.send(event).is_err() {
                            return;
                        }
                    }
                },
                Err(err) => {
                    error!("unable to read input: {}", err);
                    break;
                },
            }
        }
        let _ = events.send(Event::Quit);
    });
}
