//! Everything the user sees and hears goes through the `Feedback` trait.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use crate::config::Theme;
use crate::game::Game;
use crate::session::Session;

/// A short sound confirming or refusing an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tone {
    /// A move was played (a short, high square wave)
    Success,
    /// Something went wrong (a longer, low sawtooth)
    Error,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Output to the user.
pub trait Feedback {
    /// Adds a line to the message log.
    fn log(&mut self, message: &str);

    /// Says something out loud.
    fn speak(&mut self, text: &str);

    /// Plays a tone.
    fn tone(&mut self, tone: Tone);

    /// Redraws the board, the move list and the clocks.
    fn render(&mut self, game: &Game, session: &Session);

    /// Shows whether the microphone is listening.
    fn voice_indicator(&mut self, listening: bool);

    /// Switches to a different color theme.
    fn theme(&mut self, theme: Theme);
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One call made on a `Recorder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `log` was called
    Log(String),
    /// `speak` was called
    Speak(String),
    /// `tone` was called
    Tone(Tone),
    /// `render` was called, when the game's position was the given FEN
    Render(String),
    /// `voice_indicator` was called
    VoiceIndicator(bool),
    /// `theme` was called
    Theme(Theme),
}

/// Feedback that is remembered instead of shown. Useful for testing, and for running without a
/// terminal.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    effects: Vec<Effect>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Recorder::default()
    }

    /// Everything recorded so far, oldest first.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// The messages logged so far.
    pub fn messages(&self) -> Vec<&str> {
        self.effects.iter()
            .filter_map(|effect| match effect {
                Effect::Log(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The things said so far.
    pub fn spoken(&self) -> Vec<&str> {
        self.effects.iter()
            .filter_map(|effect| match effect {
                Effect::Speak(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Feedback for Recorder {
    fn log(&mut self, message: &str) {
        self.effects.push(Effect::Log(message.to_owned()));
    }

    fn speak(&mut self, text: &str) {
        self.effects.push(Effect::Speak(text.to_owned()));
    }

    fn tone(&mut self, tone: Tone) {
        self.effects.push(Effect::Tone(tone));
    }

    fn render(&mut self, game: &Game, _session: &Session) {
        self.effects.push(Effect::Render(game.fen()));
    }

    fn voice_indicator(&mut self, listening: bool) {
        self.effects.push(Effect::VoiceIndicator(listening));
    }

    fn theme(&mut self, theme: Theme) {
        self.effects.push(Effect::Theme(theme));
    }
}
