//! The state of a playing session that is not part of the game itself.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use shakmaty::{Color, Square};
use crate::clock::Clock;
use crate::config::{Mode, Settings};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Settings, clocks and what the user is in the middle of doing. Owned by the controller, which is
/// the only thing that changes it.
#[derive(Debug, Clone)]
pub struct Session {
    /// The user's settings
    pub settings: Settings,
    /// Time left for each side
    pub clock: Clock,
    /// The square clicked first when moving by clicks
    pub selected: Option<Square>,
    /// Whether the transcriber should be listening
    pub voice_enabled: bool,
}

impl Session {
    /// Creates a session for a new game.
    pub fn new(settings: Settings) -> Self {
        Session {
            clock: Clock::new(settings.minutes),
            settings,
            selected: None,
            voice_enabled: false,
        }
    }

    /// Resets everything that belongs to a single game. Voice stays as it is.
    pub fn new_game(&mut self) {
        self.clock = Clock::new(self.settings.minutes);
        self.selected = None;
    }

    /// The color the user plays when playing the engine.
    pub fn player_color(&self) -> Color {
        self.settings.side.color()
    }

    /// The color the engine plays, if the user is playing the engine.
    pub fn engine_color(&self) -> Option<Color> {
        match self.settings.mode {
            Mode::Engine => Some(!self.player_color()),
            Mode::Human => None,
        }
    }

    /// Returns true if it is the engine's move.
    pub fn is_engine_turn(&self, turn: Color) -> bool {
        self.engine_color() == Some(turn)
    }

    /// Returns true if the board is drawn from black's side.
    pub fn is_flipped(&self) -> bool {
        self.engine_color() == Some(Color::White)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Side;

    #[test]
    fn engine_mode() {
        let mut settings = Settings::default();
        settings.side = Side::Black;
        let session = Session::new(settings);

        assert_eq!(session.engine_color(), Some(Color::White));
        assert!(session.is_engine_turn(Color::White));
        assert!(!session.is_engine_turn(Color::Black));
        assert!(session.is_flipped());
    }

    #[test]
    fn human_mode() {
        let mut settings = Settings::default();
        settings.mode = Mode::Human;
        settings.side = Side::Black;
        let session = Session::new(settings);

        assert_eq!(session.engine_color(), None);
        assert!(!session.is_engine_turn(Color::White));
        assert!(!session.is_engine_turn(Color::Black));
        assert!(!session.is_flipped());
    }

    #[test]
    fn new_game_resets_clock_and_selection() {
        let mut session = Session::new(Settings::default());
        session.clock.start();
        session.clock.tick(Color::White);
        session.selected = Some(Square::E2);
        session.voice_enabled = true;
        session.settings.minutes = 3;

        session.new_game();
        assert_eq!(session.clock.remaining(Color::White), 180);
        assert!(!session.clock.is_running());
        assert_eq!(session.selected, None);
        assert!(session.voice_enabled);
    }
}
