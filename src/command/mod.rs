//! Interprets what the user typed or said.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;

pub mod vocab;
mod normalize;

pub use normalize::{clean, move_token, normalize, strip_wake_word, Rule, MOVE_RULES};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A command given by voice or typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new game
    NewGame,
    /// Take back a move (two when playing the engine)
    Undo,
    /// Write the game out as PGN
    ExportGame,
    /// Change the color theme. Holds the requested name, which may not be a known theme.
    SetTheme(String),
    /// Play a move. Holds the move token.
    Move(String),
    /// Nothing recognizable was said
    Unknown,
}

impl Command {
    /// Interprets raw speech or text. Literal commands are recognized before anything is
    /// treated as a move.
    pub fn interpret(raw: &str) -> Command {
        let cleaned = clean(raw);
        let text = strip_wake_word(&cleaned);

        match text {
            "new game" => return Command::NewGame,
            "undo" => return Command::Undo,
            "export game" => return Command::ExportGame,
            _ => { },
        }

        let words: Vec<_> = text.split_whitespace().collect();
        if words.len() >= 2 && words[0] == "set" && words[1] == "theme" {
            return Command::SetTheme(words[words.len() - 1].to_string());
        }

        let token = move_token(text);
        if token.is_empty() {
            Command::Unknown
        } else {
            Command::Move(token)
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::NewGame => "new game".fmt(f),
            Command::Undo => "undo".fmt(f),
            Command::ExportGame => "export game".fmt(f),
            Command::SetTheme(name) => format!("set theme {}", name).fmt(f),
            Command::Move(token) => token.fmt(f),
            Command::Unknown => "unknown command".fmt(f),
        }
    }
}
